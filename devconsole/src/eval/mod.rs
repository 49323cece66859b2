//! Evaluation capability and execution-mode dispatch.
//!
//! The console does not compile or run code itself. Hosts supply an
//! [`Engine`]; this module defines the values exchanged with it and selects
//! how each request is compiled, executed and resolved.

pub mod dispatch;
mod environment;
mod error;
mod value;

pub use dispatch::{Evaluator, ExecutionMode, ExecutionRequest, ExecutionResult};
pub use environment::{EnvExtension, Environment, LAST_RESULT, OutputCapture};
pub use error::{CompileError, RuntimeError};
pub use value::{Awaitable, Opaque, Value, resolve};

use std::future::Future;

/// How source should be compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompileMode {
    /// A single evaluable expression. Statements are a compile error.
    Expression,

    /// A statement sequence forming the body of an implicit zero-argument
    /// callable; an explicit `return` supplies the result.
    Statements,
}

/// Code compilation and execution capability supplied by the host.
pub trait Engine: Send + Sync {
    /// Compiled form of a snippet.
    type Program: Send + Sync;

    /// Compile `source` in the given mode.
    fn compile(&self, source: &str, mode: CompileMode) -> Result<Self::Program, CompileError>;

    /// Run a compiled program once against `env`, writing any printed text
    /// to `output`.
    ///
    /// Expression programs return their value; statement programs return
    /// their explicit return value or [`Value::None`]. The value may be
    /// [`Value::Pending`]; the caller resolves it.
    fn execute(
        &self,
        program: &Self::Program,
        env: &mut Environment,
        output: &mut OutputCapture,
    ) -> impl Future<Output = Result<Value, RuntimeError>> + Send;
}
