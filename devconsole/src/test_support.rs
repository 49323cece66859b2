//! A tiny line-oriented engine for exercising the console in tests.
//!
//! Grammar:
//!
//! ```text
//! stmt := "print" expr | "let" IDENT "=" expr | "return" expr | expr
//! expr := term ("+" term)*
//! term := INT | STRING | IDENT | "async" term | "await" term | "boom"
//! ```
//!
//! Statements are separated by newlines or `;`. `boom` raises a `ValueError`
//! with a trace; `async` wraps a value in an awaitable.

use std::future::Future;

use futures_core::future::BoxFuture;
use futures_util::FutureExt;

use crate::eval::{
    Awaitable, CompileError, CompileMode, Engine, Environment, OutputCapture, RuntimeError, Value,
};

const KEYWORDS: &[&str] = &["print", "let", "return"];

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Debug, Clone, PartialEq)]
pub enum Tok {
    Int(i64),
    Str(String),
    Ident(String),
    Plus,
    Eq,
    Semi,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Int(i64),
    Str(String),
    Name(String),
    Add(Box<Expr>, Box<Expr>),
    Async(Box<Expr>),
    Await(Box<Expr>),
    Boom,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Print(Expr),
    Let(String, Expr),
    Return(Expr),
    Expr(Expr),
}

#[derive(Debug, Clone)]
pub enum ToyProgram {
    Expression(Expr),
    Statements(Vec<(usize, Stmt)>),
}

#[derive(Debug, Default)]
pub struct ToyEngine;

impl ToyEngine {
    pub fn new() -> Self {
        Self
    }
}

fn syntax_error(text: &str, line: usize, column: usize) -> CompileError {
    CompileError::new("SyntaxError", "invalid syntax").at(text, line, column)
}

fn tokenize(text: &str, line: usize) -> Result<Vec<(Tok, usize)>, CompileError> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let column = i + 1;
        match c {
            ' ' | '\t' | '\r' => i += 1,
            '+' => {
                tokens.push((Tok::Plus, column));
                i += 1;
            }
            '=' => {
                tokens.push((Tok::Eq, column));
                i += 1;
            }
            ';' => {
                tokens.push((Tok::Semi, column));
                i += 1;
            }
            '"' => {
                let start = i + 1;
                let end = chars[start..]
                    .iter()
                    .position(|&c| c == '"')
                    .map(|p| start + p)
                    .ok_or_else(|| syntax_error(text, line, column))?;
                tokens.push((Tok::Str(chars[start..end].iter().collect()), column));
                i = end + 1;
            }
            c if c.is_ascii_digit() => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                let digits: String = chars[start..i].iter().collect();
                let value = digits
                    .parse()
                    .map_err(|_| syntax_error(text, line, column))?;
                tokens.push((Tok::Int(value), column));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push((Tok::Ident(chars[start..i].iter().collect()), column));
            }
            _ => return Err(syntax_error(text, line, column)),
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [(Tok, usize)],
    pos: usize,
    text: &'a str,
    line: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [(Tok, usize)], text: &'a str, line: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            text,
            line,
        }
    }

    fn error_here(&self) -> CompileError {
        let column = match self.tokens.get(self.pos) {
            Some((_, column)) => *column,
            None => self.text.chars().count() + 1,
        };
        syntax_error(self.text, self.line, column)
    }

    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos).map(|(tok, _)| tok)
    }

    fn next(&mut self) -> Option<&'a Tok> {
        let tok = self.tokens.get(self.pos).map(|(tok, _)| tok);
        self.pos += 1;
        tok
    }

    fn finish(&self) -> Result<(), CompileError> {
        match self.peek() {
            None => Ok(()),
            Some(_) => Err(self.error_here()),
        }
    }

    fn expr(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.term()?;
        while self.peek() == Some(&Tok::Plus) {
            self.pos += 1;
            let right = self.term()?;
            left = Expr::Add(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn term(&mut self) -> Result<Expr, CompileError> {
        let err = self.error_here();
        match self.next() {
            Some(Tok::Int(i)) => Ok(Expr::Int(*i)),
            Some(Tok::Str(s)) => Ok(Expr::Str(s.clone())),
            Some(Tok::Ident(name)) => match name.as_str() {
                "async" => Ok(Expr::Async(Box::new(self.term()?))),
                "await" => Ok(Expr::Await(Box::new(self.term()?))),
                "boom" => Ok(Expr::Boom),
                kw if KEYWORDS.contains(&kw) => Err(err),
                _ => Ok(Expr::Name(name.clone())),
            },
            _ => Err(err),
        }
    }

    fn stmt(&mut self) -> Result<Stmt, CompileError> {
        let stmt = match self.peek() {
            Some(Tok::Ident(kw)) if kw == "print" => {
                self.pos += 1;
                Stmt::Print(self.expr()?)
            }
            Some(Tok::Ident(kw)) if kw == "return" => {
                self.pos += 1;
                Stmt::Return(self.expr()?)
            }
            Some(Tok::Ident(kw)) if kw == "let" => {
                self.pos += 1;
                let err = self.error_here();
                let name = match self.next() {
                    Some(Tok::Ident(name)) if !KEYWORDS.contains(&name.as_str()) => name.clone(),
                    _ => return Err(err),
                };
                let err = self.error_here();
                if self.next() != Some(&Tok::Eq) {
                    return Err(err);
                }
                Stmt::Let(name, self.expr()?)
            }
            _ => Stmt::Expr(self.expr()?),
        };
        self.finish()?;
        Ok(stmt)
    }
}

fn compile_expression(source: &str) -> Result<Expr, CompileError> {
    let source = source.trim();
    let mut lines = source.lines();
    let text = lines.next().unwrap_or("");
    if source.contains('\n') {
        return Err(syntax_error(text, 1, text.chars().count() + 1));
    }
    let tokens = tokenize(text, 1)?;
    if let Some((_, column)) = tokens.iter().find(|(tok, _)| *tok == Tok::Semi) {
        return Err(syntax_error(text, 1, *column));
    }
    let mut parser = Parser::new(&tokens, text, 1);
    let expr = parser.expr()?;
    parser.finish()?;
    Ok(expr)
}

fn compile_statements(source: &str) -> Result<Vec<(usize, Stmt)>, CompileError> {
    let mut statements = Vec::new();
    for (index, text) in source.lines().enumerate() {
        let line = index + 1;
        let tokens = tokenize(text, line)?;
        for group in tokens.split(|(tok, _)| *tok == Tok::Semi) {
            if group.is_empty() {
                continue;
            }
            statements.push((line, Parser::new(group, text, line).stmt()?));
        }
    }
    Ok(statements)
}

fn eval<'a>(
    expr: &'a Expr,
    env: &'a Environment,
    line: usize,
) -> BoxFuture<'a, Result<Value, RuntimeError>> {
    async move {
        match expr {
            Expr::Int(i) => Ok(Value::Int(*i)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Name(name) => env.get(name).cloned().ok_or_else(|| {
                RuntimeError::new("NameError", format!("name '{}' is not defined", name))
            }),
            Expr::Add(left, right) => {
                let left = eval(left, env, line).await?;
                let right = eval(right, env, line).await?;
                match (left, right) {
                    (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a + b)),
                    (Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
                    _ => Err(RuntimeError::new("TypeError", "unsupported operand types for +")),
                }
            }
            Expr::Async(inner) => {
                let value = eval(inner, env, line).await?;
                Ok(Value::Pending(Awaitable::ready(value)))
            }
            Expr::Await(inner) => match eval(inner, env, line).await? {
                Value::Pending(awaitable) => awaitable.wait().await,
                _ => Err(RuntimeError::new(
                    "TypeError",
                    "object can't be used in 'await' expression",
                )),
            },
            Expr::Boom => Err(RuntimeError::new("ValueError", "boom").with_trace(format!(
                "Traceback (most recent call last):\n  line {}\nValueError: boom\n",
                line
            ))),
        }
    }
    .boxed()
}

impl Engine for ToyEngine {
    type Program = ToyProgram;

    fn compile(&self, source: &str, mode: CompileMode) -> Result<ToyProgram, CompileError> {
        match mode {
            CompileMode::Expression => compile_expression(source).map(ToyProgram::Expression),
            CompileMode::Statements => compile_statements(source).map(ToyProgram::Statements),
        }
    }

    fn execute(
        &self,
        program: &ToyProgram,
        env: &mut Environment,
        output: &mut OutputCapture,
    ) -> impl Future<Output = Result<Value, RuntimeError>> + Send {
        async move {
            match program {
                ToyProgram::Expression(expr) => eval(expr, env, 1).await,
                ToyProgram::Statements(statements) => {
                    for (line, stmt) in statements {
                        match stmt {
                            Stmt::Print(expr) => {
                                let value = eval(expr, env, *line).await?;
                                output.println(&value.to_string());
                            }
                            Stmt::Let(name, expr) => {
                                let value = eval(expr, env, *line).await?;
                                env.set(name.clone(), value);
                            }
                            Stmt::Return(expr) => return eval(expr, env, *line).await,
                            Stmt::Expr(expr) => {
                                eval(expr, env, *line).await?;
                            }
                        }
                    }
                    Ok(Value::None)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_error_column() {
        let err = ToyEngine.compile("let = 1", CompileMode::Statements).unwrap_err();
        assert_eq!((err.line, err.column), (Some(1), Some(5)));
        assert_eq!(err.diagram(), "let = 1\n    ^\nSyntaxError: invalid syntax");
    }

    #[test]
    fn test_expression_rejects_separator() {
        let err = ToyEngine.compile("1; 2", CompileMode::Expression).unwrap_err();
        assert_eq!(err.column, Some(2));
        assert!(ToyEngine.compile("1; 2", CompileMode::Statements).is_ok());
    }
}
