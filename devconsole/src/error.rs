//! Error types for devconsole.
//!
//! Evaluation failures (`CompileError`, `RuntimeError`) live in
//! [`crate::eval`]; they are always rendered and delivered inside a single
//! invocation and never surface through [`Error`].

use std::time::Duration;

use thiserror::Error;

use crate::channel::ChannelId;

/// Main error type for devconsole operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Message channel errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Session registry errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Console configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Command surface errors
    #[error("Command error: {0}")]
    Command(#[from] CommandError),
}

/// Errors reported by a [`MessageChannel`](crate::channel::MessageChannel).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// No matching message arrived in time
    #[error("No matching message within {0:?}")]
    Timeout(Duration),

    /// The channel refused the operation (missing permission)
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    /// The platform rejected the request
    #[error("Request failed: {message}")]
    Http { message: String },

    /// The message no longer exists
    #[error("Message {0} not found")]
    NotFound(u64),

    /// The channel does not implement this operation
    #[error("Operation not supported: {0}")]
    Unsupported(&'static str),

    /// The channel was closed
    #[error("Channel closed")]
    Closed,
}

impl ChannelError {
    /// Whether this error means the channel does not accept the operation at
    /// all, as opposed to a transient failure.
    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::Forbidden { .. })
    }
}

/// Session registry errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// There is no session for this channel
    #[error("No REPL session running in channel {0}")]
    NoSession(ChannelId),
}

/// Console configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The effective page length would be zero or negative
    #[error("page_length ({page_length}) must exceed shorten_by ({shorten_by})")]
    InvalidPageLength { page_length: usize, shorten_by: usize },

    /// The continuation token is empty
    #[error("Continuation token must not be empty")]
    EmptyContinuationToken,

    /// No quit keyword configured, so a session could never end
    #[error("At least one quit keyword is required")]
    NoQuitKeywords,

    /// The secret could not be compiled into a matcher
    #[error("Invalid sanitizer pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Command surface errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command name
    #[error("Unknown command '{name}'")]
    Unknown { name: String },

    /// A required argument was not supplied
    #[error("Command '{command}' requires an argument")]
    MissingArgument { command: String },

    /// The pause toggle could not be read as a boolean
    #[error("'{value}' is not a recognised boolean")]
    InvalidToggle { value: String },
}

/// Result type alias using devconsole's Error.
pub type Result<T> = std::result::Result<T, Error>;
