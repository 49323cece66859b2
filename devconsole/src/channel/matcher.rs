//! Predicates used to wait for specific incoming messages.

use super::message::{ChannelId, IncomingMessage, UserId};

/// Trait for message matching - closures by default, extensible for custom gates.
pub trait MessageMatcher: Send + Sync {
    /// Returns true if the message should be handed to the waiter.
    fn matches(&self, message: &IncomingMessage) -> bool;
}

impl<F> MessageMatcher for F
where
    F: Fn(&IncomingMessage) -> bool + Send + Sync,
{
    fn matches(&self, message: &IncomingMessage) -> bool {
        self(message)
    }
}

/// Continuation gate: the invoking author asking for the next page.
///
/// Content must equal the token, ignoring case. Whitespace is significant.
#[derive(Debug, Clone)]
pub struct ContinuationReply {
    author: UserId,
    channel: ChannelId,
    token: String,
}

impl ContinuationReply {
    /// Gate on `token` from `author` in `channel`.
    pub fn new(author: UserId, channel: ChannelId, token: &str) -> Self {
        Self {
            author,
            channel,
            token: token.to_lowercase(),
        }
    }
}

impl MessageMatcher for ContinuationReply {
    fn matches(&self, message: &IncomingMessage) -> bool {
        message.author_id == self.author
            && message.channel_id == self.channel
            && message.content.to_lowercase() == self.token
    }
}

/// Code-like input for a REPL session: starts with the trigger character.
#[derive(Debug, Clone)]
pub struct CodeInput {
    author: UserId,
    channel: ChannelId,
    trigger: char,
}

impl CodeInput {
    /// Match messages from `author` in `channel` starting with `trigger`.
    pub fn new(author: UserId, channel: ChannelId, trigger: char) -> Self {
        Self {
            author,
            channel,
            trigger,
        }
    }
}

impl MessageMatcher for CodeInput {
    fn matches(&self, message: &IncomingMessage) -> bool {
        message.author_id == self.author
            && message.channel_id == self.channel
            && message.content.starts_with(self.trigger)
    }
}
