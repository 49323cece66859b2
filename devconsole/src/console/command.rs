//! Parsing of the console's command surface.

use crate::channel::{IncomingMessage, MessageChannel, UserId};
use crate::error::CommandError;

/// The invocation a command runs in.
#[derive(Debug)]
pub struct CommandContext<'a, C> {
    /// Channel the command was issued in.
    pub channel: &'a C,

    /// The invoking message.
    pub message: IncomingMessage,

    /// Command prefix in use, quoted back in announcements.
    pub prefix: String,
}

impl<'a, C: MessageChannel> CommandContext<'a, C> {
    /// Create a context for `message` posted in `channel`.
    pub fn new(channel: &'a C, message: IncomingMessage, prefix: impl Into<String>) -> Self {
        Self {
            channel,
            message,
            prefix: prefix.into(),
        }
    }

    /// Author of the invoking message.
    pub fn author(&self) -> UserId {
        self.message.author_id
    }
}

/// A parsed console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `debug <code>`: evaluate one expression.
    Debug(String),
    /// `eval <code>`: run a statement body.
    Eval(String),
    /// `repl`: open a session.
    Repl,
    /// `repl pause [bool]`, also spelled `repl resume [bool]`.
    ///
    /// The argument says whether the session should run: `Some(true)`
    /// resumes, `Some(false)` pauses, `None` toggles.
    Pause(Option<bool>),
}

impl Command {
    /// Parse a command `name` with its unparsed argument text.
    pub fn parse(name: &str, args: &str) -> Result<Self, CommandError> {
        let args = args.trim();
        match name.to_lowercase().as_str() {
            "debug" => Self::code_argument(name, args).map(Self::Debug),
            "eval" => Self::code_argument(name, args).map(Self::Eval),
            "repl" => Self::parse_repl(args),
            _ => Err(CommandError::Unknown {
                name: name.to_string(),
            }),
        }
    }

    fn code_argument(name: &str, args: &str) -> Result<String, CommandError> {
        if args.is_empty() {
            return Err(CommandError::MissingArgument {
                command: name.to_string(),
            });
        }
        Ok(args.to_string())
    }

    fn parse_repl(args: &str) -> Result<Self, CommandError> {
        let mut words = args.split_whitespace();
        let Some(sub) = words.next() else {
            return Ok(Self::Repl);
        };
        let toggle = words.next().map(parse_bool).transpose()?;
        if let Some(extra) = words.next() {
            return Err(CommandError::InvalidToggle {
                value: extra.to_string(),
            });
        }
        match sub.to_lowercase().as_str() {
            "pause" | "resume" => Ok(Self::Pause(toggle)),
            _ => Err(CommandError::Unknown {
                name: format!("repl {}", sub),
            }),
        }
    }
}

/// Read a boolean argument.
pub fn parse_bool(value: &str) -> Result<bool, CommandError> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "y" | "on" | "1" | "enable" => Ok(true),
        "false" | "no" | "n" | "off" | "0" | "disable" => Ok(false),
        _ => Err(CommandError::InvalidToggle {
            value: value.to_string(),
        }),
    }
}
