//! Compile and runtime failures reported by an [`Engine`](super::Engine).

use thiserror::Error;

/// Source could not be compiled in the requested mode.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct CompileError {
    /// Error class name, e.g. `SyntaxError`.
    pub kind: String,

    /// Human-readable description.
    pub message: String,

    /// The offending source line, when known.
    pub text: Option<String>,

    /// 1-based line number within the source.
    pub line: Option<usize>,

    /// 1-based column of the offending character.
    pub column: Option<usize>,
}

impl CompileError {
    /// Create an error without location information.
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            text: None,
            line: None,
            column: None,
        }
    }

    /// Attach the offending line and its 1-based position.
    pub fn at(mut self, text: impl Into<String>, line: usize, column: usize) -> Self {
        self.text = Some(text.into());
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    /// Render the error as a caret diagram.
    ///
    /// ```text
    /// 1 + +
    ///     ^
    /// SyntaxError: invalid syntax
    /// ```
    ///
    /// Errors without source text render as the last line only.
    pub fn diagram(&self) -> String {
        match &self.text {
            Some(text) => format!(
                "{}\n{:>width$}\n{}",
                text.trim_end_matches(['\r', '\n']),
                "^",
                self,
                width = self.column.unwrap_or(1),
            ),
            None => self.to_string(),
        }
    }
}

/// Executed code failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct RuntimeError {
    /// Error class name, e.g. `ValueError`.
    pub kind: String,

    /// Human-readable description.
    pub message: String,

    /// Full failure trace as produced by the engine.
    pub trace: Option<String>,
}

impl RuntimeError {
    /// Create an error without a trace.
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            trace: None,
        }
    }

    /// Attach the engine's failure trace.
    pub fn with_trace(mut self, trace: impl Into<String>) -> Self {
        self.trace = Some(trace.into());
        self
    }

    /// Text shown to the operator: the trace when available, otherwise the
    /// one-line summary.
    pub fn render(&self) -> String {
        match &self.trace {
            Some(trace) => trace.clone(),
            None => self.to_string(),
        }
    }
}
