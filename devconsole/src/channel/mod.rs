//! Message channel layer.
//!
//! The console never talks to a chat platform directly. Hosts implement
//! [`MessageChannel`] for their transport; [`MemoryChannel`] is an in-process
//! implementation for tests and local tooling.

mod matcher;
pub mod memory;
mod message;

pub use matcher::{CodeInput, ContinuationReply, MessageMatcher};
pub use memory::MemoryChannel;
pub use message::{ChannelId, IncomingMessage, MessageHandle, MessageId, UserId};

use std::future::Future;
use std::time::Duration;

use crate::error::ChannelError;

/// A message-oriented, length-limited channel.
pub trait MessageChannel: Send + Sync {
    /// Identifier of this channel.
    fn id(&self) -> ChannelId;

    /// Send a rendered message.
    fn send(&self, content: &str) -> impl Future<Output = Result<MessageHandle, ChannelError>> + Send;

    /// Delete a single message.
    fn delete(&self, message: &MessageHandle) -> impl Future<Output = Result<(), ChannelError>> + Send;

    /// Delete several messages in one request.
    ///
    /// Channels without bulk deletion (direct messages, accounts lacking the
    /// permission) keep the default, which reports `Unsupported`.
    fn delete_many(
        &self,
        messages: &[MessageHandle],
    ) -> impl Future<Output = Result<(), ChannelError>> + Send {
        let _ = messages;
        async { Err(ChannelError::Unsupported("bulk delete")) }
    }

    /// Wait for the next incoming message accepted by `matcher`.
    ///
    /// With `timeout: None` this waits indefinitely. Expiry is reported as
    /// [`ChannelError::Timeout`].
    fn await_matching(
        &self,
        matcher: &dyn MessageMatcher,
        timeout: Option<Duration>,
    ) -> impl Future<Output = Result<IncomingMessage, ChannelError>> + Send;

    /// Whether the console may react to messages in this channel.
    fn can_add_reactions(&self) -> bool {
        false
    }

    /// Add a reaction to a message.
    fn add_reaction(
        &self,
        message: &MessageHandle,
        emoji: &str,
    ) -> impl Future<Output = Result<(), ChannelError>> + Send {
        let _ = (message, emoji);
        async { Err(ChannelError::Unsupported("reactions")) }
    }
}
