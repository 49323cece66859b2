//! # devconsole
//!
//! Interactive code-evaluation console for chat command interfaces.
//!
//! devconsole provides the machinery around an operator's `debug`, `eval`
//! and `repl` commands: the host supplies the code engine and the message
//! transport, and the console handles everything in between.
//!
//! ## Features
//!
//! - Expression, script and adaptive (REPL) execution over a pluggable [`Engine`]
//! - Delimiter-aware pagination measured in characters
//! - Continuation-gated page delivery (`more` to see the next page)
//! - Per-channel REPL sessions with pause, resume and quit
//! - Secret redaction and ANSI stripping of all output
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use devconsole::{Command, CommandContext, ConsoleBuilder};
//!
//! let console = ConsoleBuilder::new(engine)
//!     .secret(bot_token)
//!     .build()?;
//!
//! // In the host's command handler:
//! let ctx = CommandContext::new(&channel, message, "!");
//! console.dispatch(&ctx, Command::parse("eval", args)?).await?;
//! ```

pub mod channel;
pub mod console;
pub mod delivery;
pub mod error;
pub mod eval;
pub mod session;
pub mod text;

#[cfg(test)]
mod test_support;

// Re-export main types for convenience
pub use channel::{ChannelId, IncomingMessage, MemoryChannel, MessageChannel, MessageHandle, UserId};
pub use console::{Command, CommandContext, Console, ConsoleBuilder, ConsoleConfig};
pub use delivery::{DeliveryOptions, send_interactive};
pub use error::{Error, Result};
pub use eval::{CompileMode, Engine, Environment, Value};
pub use session::{SessionRegistry, SessionState};
pub use text::{PagifyOptions, pagify, sanitize};
