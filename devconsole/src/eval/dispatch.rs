//! Selection between the expression, script and adaptive execution forms.

use std::time::{Duration, Instant};

use log::{debug, trace};

use super::environment::{Environment, OutputCapture};
use super::error::{CompileError, RuntimeError};
use super::value::{Value, resolve};
use super::{CompileMode, Engine};

/// Await steps applied to expression and adaptive results.
const EXPRESSION_AWAIT_STEPS: usize = 2;

/// Await steps applied to script results (the implicit call itself).
const SCRIPT_AWAIT_STEPS: usize = 1;

/// Execution form requested by a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionMode {
    /// Evaluate a single expression (`debug`).
    Expression,
    /// Run a statement body once, capturing its output (`eval`).
    Script,
    /// Expression when possible, statements otherwise (REPL input).
    Adaptive,
}

/// One evaluation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    /// Cleaned source text.
    pub source: String,

    /// Requested execution form.
    pub mode: ExecutionMode,
}

impl ExecutionRequest {
    /// Create a request.
    pub fn new(source: impl Into<String>, mode: ExecutionMode) -> Self {
        Self {
            source: source.into(),
            mode,
        }
    }
}

/// Outcome of a request that compiled.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Everything printed during the call; possibly empty.
    pub captured_output: String,

    /// The resolved return value, absent when it was `None`.
    pub return_value: Option<Value>,

    /// The failure raised during the call.
    pub error: Option<RuntimeError>,

    /// Time spent executing and resolving.
    pub elapsed: Duration,
}

impl ExecutionResult {
    /// A successful call.
    pub fn success(captured_output: impl Into<String>, value: Value, elapsed: Duration) -> Self {
        Self {
            captured_output: captured_output.into(),
            return_value: (!value.is_none()).then_some(value),
            error: None,
            elapsed,
        }
    }

    /// A call that raised.
    pub fn failure(
        captured_output: impl Into<String>,
        error: RuntimeError,
        elapsed: Duration,
    ) -> Self {
        Self {
            captured_output: captured_output.into(),
            return_value: None,
            error: Some(error),
            elapsed,
        }
    }

    /// Check if the call completed without raising.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Check if the rendered text is empty.
    pub fn is_empty(&self) -> bool {
        self.render().is_empty()
    }

    /// Text shown to the operator: captured output followed by the failure
    /// trace or the return value.
    pub fn render(&self) -> String {
        let mut text = self.captured_output.clone();
        if let Some(error) = &self.error {
            text.push_str(&error.render());
        } else if let Some(value) = &self.return_value {
            text.push_str(&value.to_string());
        }
        text
    }
}

/// Dispatches requests to an [`Engine`].
#[derive(Debug)]
pub struct Evaluator<'e, E> {
    engine: &'e E,
}

impl<'e, E: Engine> Evaluator<'e, E> {
    /// Borrow `engine` for dispatch.
    pub fn new(engine: &'e E) -> Self {
        Self { engine }
    }

    /// Compile and run `request` against `env`.
    ///
    /// Compile failures are returned as `Err`; runtime failures are part of
    /// the [`ExecutionResult`].
    pub async fn run(
        &self,
        request: &ExecutionRequest,
        env: &mut Environment,
    ) -> Result<ExecutionResult, CompileError> {
        let source = request.source.as_str();
        let (program, steps) = match request.mode {
            ExecutionMode::Expression => (
                self.engine.compile(source, CompileMode::Expression)?,
                EXPRESSION_AWAIT_STEPS,
            ),
            ExecutionMode::Script => (
                self.engine.compile(source, CompileMode::Statements)?,
                SCRIPT_AWAIT_STEPS,
            ),
            ExecutionMode::Adaptive => (self.compile_adaptive(source)?, EXPRESSION_AWAIT_STEPS),
        };

        let start = Instant::now();
        let mut output = OutputCapture::new();
        let outcome = match self.engine.execute(&program, env, &mut output).await {
            Ok(value) => resolve(value, steps).await,
            Err(err) => Err(err),
        };
        let elapsed = start.elapsed();

        let result = match outcome {
            Ok(value) => ExecutionResult::success(output.into_string(), value, elapsed),
            Err(err) => {
                debug!("{:?} execution raised {}", request.mode, err);
                ExecutionResult::failure(output.into_string(), err, elapsed)
            }
        };
        trace!(
            "{:?} execution finished in {:?}, success={}",
            request.mode,
            result.elapsed,
            result.is_success()
        );
        Ok(result)
    }

    /// Single-line input tries expression mode first; anything else, or a
    /// line that is not an expression, compiles as statements.
    fn compile_adaptive(&self, source: &str) -> Result<E::Program, CompileError> {
        if !source.contains('\n') {
            match self.engine.compile(source, CompileMode::Expression) {
                Ok(program) => return Ok(program),
                Err(err) => trace!("not an expression ({}), compiling as statements", err),
            }
        }
        self.engine.compile(source, CompileMode::Statements)
    }
}
