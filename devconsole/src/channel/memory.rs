//! In-process message channel.
//!
//! Incoming messages are queued until a waiter claims them, so a test can
//! script a whole conversation up front. Waiters take the *first* queued
//! message their matcher accepts; messages nobody matches stay queued.

use std::collections::VecDeque;
use std::pin::pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::trace;
use tokio::sync::Notify;

use super::matcher::MessageMatcher;
use super::message::{ChannelId, IncomingMessage, MessageHandle, MessageId, UserId};
use super::MessageChannel;
use crate::error::ChannelError;

/// A message sent through a [`MemoryChannel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    /// Handle returned to the sender.
    pub handle: MessageHandle,

    /// Rendered content.
    pub content: String,

    /// Whether the message has since been deleted.
    pub deleted: bool,
}

#[derive(Debug)]
struct SendFailure {
    remaining_ok: usize,
    error: ChannelError,
    repeat: bool,
}

#[derive(Debug, Default)]
struct State {
    sent: Vec<SentMessage>,
    inbox: VecDeque<IncomingMessage>,
    deleted: Vec<MessageId>,
    reactions: Vec<(MessageId, String)>,
    send_failure: Option<SendFailure>,
    bulk_delete: bool,
    reactions_allowed: bool,
    closed: bool,
}

/// In-memory [`MessageChannel`].
#[derive(Debug)]
pub struct MemoryChannel {
    id: ChannelId,
    next_id: AtomicU64,
    state: Mutex<State>,
    arrivals: Notify,
}

impl MemoryChannel {
    /// Create an open channel with bulk deletion and reactions enabled.
    pub fn new(id: ChannelId) -> Self {
        Self {
            id,
            next_id: AtomicU64::new(1),
            state: Mutex::new(State {
                bulk_delete: true,
                reactions_allowed: true,
                ..State::default()
            }),
            arrivals: Notify::new(),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn allocate_id(&self) -> MessageId {
        MessageId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Build a message from `author` without queueing it.
    ///
    /// Use this for the message that invoked a command.
    pub fn message(&self, author: UserId, content: impl Into<String>) -> IncomingMessage {
        IncomingMessage::new(self.allocate_id(), self.id, author, content)
    }

    /// Queue an incoming message from `author` and wake waiters.
    pub fn push(&self, author: UserId, content: impl Into<String>) -> IncomingMessage {
        let message = self.message(author, content);
        self.push_message(message.clone());
        message
    }

    /// Queue an already-built message and wake waiters.
    pub fn push_message(&self, message: IncomingMessage) {
        trace!("memory channel {}: queued {:?}", self.id, message.content);
        self.state().inbox.push_back(message);
        self.arrivals.notify_waiters();
    }

    /// Every message sent so far, including deleted ones.
    pub fn sent(&self) -> Vec<SentMessage> {
        self.state().sent.clone()
    }

    /// Contents of sent messages that have not been deleted.
    pub fn visible(&self) -> Vec<String> {
        self.state()
            .sent
            .iter()
            .filter(|m| !m.deleted)
            .map(|m| m.content.clone())
            .collect()
    }

    /// Ids of every deleted message, sent or incoming, in deletion order.
    pub fn deleted(&self) -> Vec<MessageId> {
        self.state().deleted.clone()
    }

    /// Reactions added so far.
    pub fn reactions(&self) -> Vec<(MessageId, String)> {
        self.state().reactions.clone()
    }

    /// Number of queued messages no waiter has claimed.
    pub fn pending(&self) -> usize {
        self.state().inbox.len()
    }

    /// Enable or disable bulk deletion.
    pub fn set_bulk_delete(&self, enabled: bool) {
        self.state().bulk_delete = enabled;
    }

    /// Allow or forbid reactions.
    pub fn set_reactions_allowed(&self, allowed: bool) {
        self.state().reactions_allowed = allowed;
    }

    /// Let the next `count` sends succeed, then fail every send with `error`.
    pub fn fail_sends_after(&self, count: usize, error: ChannelError) {
        self.state().send_failure = Some(SendFailure {
            remaining_ok: count,
            error,
            repeat: true,
        });
    }

    /// Let the next `count` sends succeed, then fail exactly one with `error`.
    pub fn fail_one_send_after(&self, count: usize, error: ChannelError) {
        self.state().send_failure = Some(SendFailure {
            remaining_ok: count,
            error,
            repeat: false,
        });
    }

    /// Close the channel; pending and future waits fail with `Closed`.
    pub fn close(&self) {
        self.state().closed = true;
        self.arrivals.notify_waiters();
    }

    fn take_matching(&self, matcher: &dyn MessageMatcher) -> Result<Option<IncomingMessage>, ChannelError> {
        let mut state = self.state();
        if state.closed {
            return Err(ChannelError::Closed);
        }
        let position = state.inbox.iter().position(|m| matcher.matches(m));
        Ok(position.and_then(|pos| state.inbox.remove(pos)))
    }

    async fn wait_for(&self, matcher: &dyn MessageMatcher) -> Result<IncomingMessage, ChannelError> {
        loop {
            // Register interest before checking so a push between the check
            // and the await is not lost.
            let mut notified = pin!(self.arrivals.notified());
            notified.as_mut().enable();

            if let Some(message) = self.take_matching(matcher)? {
                return Ok(message);
            }
            notified.await;
        }
    }

    fn mark_deleted(state: &mut State, handle: &MessageHandle) -> Result<(), ChannelError> {
        if state.deleted.contains(&handle.id) {
            return Err(ChannelError::NotFound(handle.id.0));
        }
        state.deleted.push(handle.id);
        if let Some(sent) = state.sent.iter_mut().find(|m| m.handle.id == handle.id) {
            sent.deleted = true;
        }
        Ok(())
    }
}

impl MessageChannel for MemoryChannel {
    fn id(&self) -> ChannelId {
        self.id
    }

    async fn send(&self, content: &str) -> Result<MessageHandle, ChannelError> {
        let handle = MessageHandle {
            id: self.allocate_id(),
            channel_id: self.id,
        };
        let mut state = self.state();
        if state.closed {
            return Err(ChannelError::Closed);
        }
        if let Some(failure) = state.send_failure.as_mut() {
            if failure.remaining_ok == 0 {
                let error = failure.error.clone();
                if !failure.repeat {
                    state.send_failure = None;
                }
                return Err(error);
            }
            failure.remaining_ok -= 1;
        }
        state.sent.push(SentMessage {
            handle,
            content: content.to_string(),
            deleted: false,
        });
        Ok(handle)
    }

    async fn delete(&self, message: &MessageHandle) -> Result<(), ChannelError> {
        let mut state = self.state();
        Self::mark_deleted(&mut state, message)
    }

    async fn delete_many(&self, messages: &[MessageHandle]) -> Result<(), ChannelError> {
        let mut state = self.state();
        if !state.bulk_delete {
            return Err(ChannelError::Unsupported("bulk delete"));
        }
        for message in messages {
            Self::mark_deleted(&mut state, message)?;
        }
        Ok(())
    }

    async fn await_matching(
        &self,
        matcher: &dyn MessageMatcher,
        timeout: Option<Duration>,
    ) -> Result<IncomingMessage, ChannelError> {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, self.wait_for(matcher))
                .await
                .map_err(|_| ChannelError::Timeout(limit))?,
            None => self.wait_for(matcher).await,
        }
    }

    fn can_add_reactions(&self) -> bool {
        self.state().reactions_allowed
    }

    async fn add_reaction(&self, message: &MessageHandle, emoji: &str) -> Result<(), ChannelError> {
        let mut state = self.state();
        if !state.reactions_allowed {
            return Err(ChannelError::Forbidden {
                message: "missing add_reactions permission".to_string(),
            });
        }
        state.reactions.push((message.id, emoji.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ContinuationReply;

    #[tokio::test]
    async fn test_send_and_delete() {
        let channel = MemoryChannel::new(ChannelId(1));
        let first = channel.send("one").await.unwrap();
        channel.send("two").await.unwrap();
        channel.delete(&first).await.unwrap();

        assert_eq!(channel.visible(), vec!["two"]);
        assert_eq!(channel.deleted(), vec![first.id]);
        assert_eq!(
            channel.delete(&first).await,
            Err(ChannelError::NotFound(first.id.0))
        );
    }

    #[tokio::test]
    async fn test_waiter_takes_first_match_only() {
        let channel = MemoryChannel::new(ChannelId(1));
        channel.push(UserId(2), "hello");
        channel.push(UserId(2), "MORE");

        let gate = ContinuationReply::new(UserId(2), ChannelId(1), "more");
        let reply = channel.await_matching(&gate, None).await.unwrap();
        assert_eq!(reply.content, "MORE");
        assert_eq!(channel.pending(), 1);
    }

    #[tokio::test]
    async fn test_waiter_wakes_on_push() {
        let channel = std::sync::Arc::new(MemoryChannel::new(ChannelId(1)));
        let waiter = {
            let channel = channel.clone();
            tokio::spawn(async move {
                let gate = ContinuationReply::new(UserId(2), ChannelId(1), "more");
                channel.await_matching(&gate, None).await
            })
        };
        tokio::task::yield_now().await;
        channel.push(UserId(2), "more");

        let reply = waiter.await.unwrap().unwrap();
        assert_eq!(reply.content, "more");
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_times_out() {
        let channel = MemoryChannel::new(ChannelId(1));
        let gate = ContinuationReply::new(UserId(2), ChannelId(1), "more");
        let result = channel
            .await_matching(&gate, Some(Duration::from_secs(15)))
            .await;
        assert_eq!(result, Err(ChannelError::Timeout(Duration::from_secs(15))));
    }

    #[tokio::test]
    async fn test_close_fails_waiters() {
        let channel = MemoryChannel::new(ChannelId(1));
        channel.close();
        let gate = ContinuationReply::new(UserId(2), ChannelId(1), "more");
        assert_eq!(
            channel.await_matching(&gate, None).await,
            Err(ChannelError::Closed)
        );
    }

    #[tokio::test]
    async fn test_send_failure_injection() {
        let channel = MemoryChannel::new(ChannelId(1));
        channel.fail_sends_after(1, ChannelError::Http { message: "500".into() });
        assert!(channel.send("ok").await.is_ok());
        assert!(channel.send("nope").await.is_err());
        assert!(channel.send("still nope").await.is_err());
        assert_eq!(channel.visible(), vec!["ok"]);
    }

    #[tokio::test]
    async fn test_single_send_failure() {
        let channel = MemoryChannel::new(ChannelId(1));
        channel.fail_one_send_after(0, ChannelError::Http { message: "502".into() });
        assert!(channel.send("lost").await.is_err());
        assert!(channel.send("ok").await.is_ok());
        assert_eq!(channel.visible(), vec!["ok"]);
    }

    #[tokio::test]
    async fn test_bulk_delete_can_be_disabled() {
        let channel = MemoryChannel::new(ChannelId(1));
        let handle = channel.send("x").await.unwrap();
        channel.set_bulk_delete(false);
        assert_eq!(
            channel.delete_many(&[handle]).await,
            Err(ChannelError::Unsupported("bulk delete"))
        );
        assert!(channel.deleted().is_empty());
    }
}
