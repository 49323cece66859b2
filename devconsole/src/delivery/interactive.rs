//! Continuation-gated page streaming.

use std::time::Duration;

use log::{debug, trace};

use crate::channel::{ContinuationReply, MessageChannel, MessageHandle, UserId};
use crate::error::ChannelError;

/// Reaction used to acknowledge a successful invocation.
pub const DEFAULT_ACK: &str = "\u{2705}";

/// Options for [`send_interactive`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOptions {
    /// Code-block language label. `None` sends pages unboxed.
    pub box_label: Option<String>,

    /// How long to wait for a continuation reply.
    pub timeout: Duration,

    /// Reply that requests the next page, compared without case.
    pub token: String,
}

impl Default for DeliveryOptions {
    fn default() -> Self {
        Self {
            box_label: None,
            timeout: Duration::from_secs(15),
            token: "more".to_string(),
        }
    }
}

impl DeliveryOptions {
    /// Wrap pages in a code block labelled `label`.
    pub fn with_box_label(mut self, label: impl Into<String>) -> Self {
        self.box_label = Some(label.into());
        self
    }

    /// Set the continuation timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the continuation token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    fn render(&self, page: &str) -> String {
        match &self.box_label {
            Some(label) => format!("```{}\n{}\n```", label, page),
            None => page.to_string(),
        }
    }
}

/// Prompt sent while `remaining` pages are still held back.
pub fn remaining_prompt(remaining: usize, token: &str) -> String {
    if remaining == 1 {
        format!(
            "There is still 1 message remaining. Type `{}` to continue.",
            token
        )
    } else {
        format!(
            "There are still {} messages remaining. Type `{}` to continue.",
            remaining, token
        )
    }
}

/// Send `pages` to `channel`, pausing before each further page until
/// `author` replies with the continuation token.
///
/// Returns the handles of the pages that were sent. Timing out on a
/// continuation is not an error: delivery stops and the pages sent so far are
/// returned. Failures to delete prompts or replies are ignored; send failures
/// are returned.
pub async fn send_interactive<C, I, S>(
    channel: &C,
    author: UserId,
    pages: I,
    options: &DeliveryOptions,
) -> Result<Vec<MessageHandle>, ChannelError>
where
    C: MessageChannel,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let pages: Vec<S> = pages.into_iter().collect();
    let mut sent = Vec::with_capacity(pages.len());

    for (index, page) in pages.iter().enumerate() {
        let handle = channel.send(&options.render(page.as_ref())).await?;
        sent.push(handle);

        let remaining = pages.len() - index - 1;
        if remaining == 0 {
            break;
        }

        let prompt = channel
            .send(&remaining_prompt(remaining, &options.token))
            .await?;
        let gate = ContinuationReply::new(author, channel.id(), &options.token);

        match channel.await_matching(&gate, Some(options.timeout)).await {
            Ok(reply) => {
                trace!("continuation received, {} page(s) left", remaining);
                if let Err(e) = channel.delete_many(&[prompt, reply.handle()]).await {
                    debug!("bulk delete failed ({}), deleting prompt only", e);
                    if let Err(e) = channel.delete(&prompt).await {
                        debug!("failed to delete continuation prompt: {}", e);
                    }
                }
            }
            Err(ChannelError::Timeout(limit)) => {
                debug!(
                    "no continuation within {:?}, dropping {} page(s)",
                    limit, remaining
                );
                if let Err(e) = channel.delete(&prompt).await {
                    debug!("failed to delete continuation prompt: {}", e);
                }
                break;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(sent)
}

/// Acknowledge `message` with a reaction.
///
/// Returns whether the reaction was added. Channels that do not allow
/// reactions are skipped without a request.
pub async fn add_ack<C: MessageChannel>(channel: &C, message: &MessageHandle, emoji: &str) -> bool {
    if !channel.can_add_reactions() {
        trace!("reactions not permitted in channel {}", channel.id());
        return false;
    }
    match channel.add_reaction(message, emoji).await {
        Ok(()) => true,
        Err(e) => {
            debug!("failed to acknowledge message {}: {}", message.id, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{ChannelId, MemoryChannel};
    use crate::test_support::init_logging;

    const AUTHOR: UserId = UserId(7);

    fn channel() -> MemoryChannel {
        init_logging();
        MemoryChannel::new(ChannelId(1))
    }

    #[test]
    fn test_prompt_wording() {
        assert_eq!(
            remaining_prompt(1, "more"),
            "There is still 1 message remaining. Type `more` to continue."
        );
        assert_eq!(
            remaining_prompt(2, "more"),
            "There are still 2 messages remaining. Type `more` to continue."
        );
    }

    #[tokio::test]
    async fn test_single_page_sends_no_prompt() {
        let channel = channel();
        let options = DeliveryOptions::default().with_box_label("py");
        let sent = send_interactive(&channel, AUTHOR, ["hello"], &options).await.unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(channel.visible(), vec!["```py\nhello\n```"]);
    }

    #[tokio::test]
    async fn test_empty_pages_send_nothing() {
        let channel = channel();
        let sent = send_interactive(&channel, AUTHOR, Vec::<String>::new(), &DeliveryOptions::default())
            .await
            .unwrap();
        assert!(sent.is_empty());
        assert!(channel.sent().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_stops_after_first_page() {
        let channel = channel();
        let sent = send_interactive(&channel, AUTHOR, ["a", "b", "c"], &DeliveryOptions::default())
            .await
            .unwrap();

        assert_eq!(sent.len(), 1);
        // The prompt was sent and then removed.
        let all = channel.sent();
        assert_eq!(all.len(), 2);
        assert!(all[1].deleted);
        assert_eq!(channel.visible(), vec!["a"]);
    }

    #[tokio::test]
    async fn test_more_replies_release_every_page() {
        let channel = channel();
        channel.push(AUTHOR, "more");
        channel.push(AUTHOR, "MORE");

        let sent = send_interactive(&channel, AUTHOR, ["a", "b", "c"], &DeliveryOptions::default())
            .await
            .unwrap();

        assert_eq!(sent.len(), 3);
        assert_eq!(channel.visible(), vec!["a", "b", "c"]);
        // Two prompts and two replies were bulk deleted.
        assert_eq!(channel.deleted().len(), 4);
        assert_eq!(channel.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_authors_cannot_continue() {
        let channel = channel();
        channel.push(UserId(99), "more");

        let sent = send_interactive(&channel, AUTHOR, ["a", "b"], &DeliveryOptions::default())
            .await
            .unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(channel.pending(), 1);
    }

    #[tokio::test]
    async fn test_falls_back_to_deleting_prompt() {
        let channel = channel();
        channel.set_bulk_delete(false);
        let reply = channel.push(AUTHOR, "more");

        let sent = send_interactive(&channel, AUTHOR, ["a", "b"], &DeliveryOptions::default())
            .await
            .unwrap();

        assert_eq!(sent.len(), 2);
        let deleted = channel.deleted();
        assert_eq!(deleted.len(), 1);
        assert!(!deleted.contains(&reply.id));
        assert_eq!(channel.visible(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_send_failure_propagates() {
        let channel = channel();
        channel.fail_sends_after(
            1,
            ChannelError::Forbidden {
                message: "no".into(),
            },
        );
        let err = send_interactive(&channel, AUTHOR, ["a", "b"], &DeliveryOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_forbidden());
    }

    #[tokio::test]
    async fn test_custom_token() {
        let channel = channel();
        channel.push(AUTHOR, "more");
        channel.push(AUTHOR, "next");
        let options = DeliveryOptions::default()
            .with_token("next")
            .with_timeout(Duration::from_millis(10));

        let sent = send_interactive(&channel, AUTHOR, ["a", "b"], &options).await.unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(
            channel.sent()[1].content,
            "There is still 1 message remaining. Type `next` to continue."
        );
        assert_eq!(channel.pending(), 1);
    }

    #[tokio::test]
    async fn test_ack_respects_permission() {
        let channel = channel();
        let message = channel.message(AUTHOR, "!eval 1");
        assert!(add_ack(&channel, &message.handle(), DEFAULT_ACK).await);

        channel.set_reactions_allowed(false);
        assert!(!add_ack(&channel, &message.handle(), DEFAULT_ACK).await);
        assert_eq!(channel.reactions(), vec![(message.id, DEFAULT_ACK.to_string())]);
    }
}
