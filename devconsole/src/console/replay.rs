//! Re-dispatching the invoking message as if another user had sent it.

use log::debug;

use super::CommandContext;
use crate::channel::{IncomingMessage, MessageChannel, UserId};
use crate::error::Result;

/// Host hook that feeds a message back through normal message handling.
pub trait EventDispatcher: Send + Sync {
    /// Handle `message` as a newly received message.
    fn dispatch(&self, message: IncomingMessage);
}

/// Help text sent by [`mock_message`] when there is nothing to dispatch.
pub fn mock_message_usage(prefix: &str) -> String {
    format!(
        "Usage: `{}mockmsg <user> [content]`\n\n\
         Dispatch a message as if it were sent by a different user. Without \
         content the invoking message must carry attachments.",
        prefix
    )
}

/// Dispatch `command` (without the prefix) as if `user` had invoked it.
pub fn mock_command<C, D>(dispatcher: &D, ctx: &CommandContext<'_, C>, user: UserId, command: &str)
where
    C: MessageChannel,
    D: EventDispatcher + ?Sized,
{
    let mut message = ctx.message.clone();
    message.author_id = user;
    message.content = format!("{}{}", ctx.prefix, command);
    debug!("mocking command from user {} in channel {}", user, message.channel_id);
    dispatcher.dispatch(message);
}

/// Dispatch the invoking message with its content replaced by `content` and
/// its author by `user`.
///
/// Empty content with no attachments would produce an empty message, so the
/// usage text is sent instead.
pub async fn mock_message<C, D>(
    dispatcher: &D,
    ctx: &CommandContext<'_, C>,
    user: UserId,
    content: &str,
) -> Result<()>
where
    C: MessageChannel,
    D: EventDispatcher + ?Sized,
{
    if content.is_empty() && !ctx.message.has_attachments() {
        ctx.channel.send(&mock_message_usage(&ctx.prefix)).await?;
        return Ok(());
    }
    let mut message = ctx.message.clone();
    message.author_id = user;
    message.content = content.to_string();
    debug!("mocking message from user {} in channel {}", user, message.channel_id);
    dispatcher.dispatch(message);
    Ok(())
}
