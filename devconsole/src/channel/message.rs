//! Identifiers and message types exchanged with a channel.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }
    };
}

id_type!(
    /// Identifier of a channel (one REPL session at most per channel).
    ChannelId
);
id_type!(
    /// Identifier of a message author.
    UserId
);
id_type!(
    /// Identifier of a single message.
    MessageId
);

/// Handle to a message that can later be deleted or reacted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageHandle {
    /// The message id.
    pub id: MessageId,

    /// The channel the message lives in.
    pub channel_id: ChannelId,
}

/// A message received from a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingMessage {
    /// The message id.
    pub id: MessageId,

    /// The channel it was posted in.
    pub channel_id: ChannelId,

    /// Who posted it.
    pub author_id: UserId,

    /// Raw text content.
    pub content: String,

    /// Attachment names or URLs, if any.
    #[serde(default)]
    pub attachments: Vec<String>,
}

impl IncomingMessage {
    /// Create a message without attachments.
    pub fn new(
        id: MessageId,
        channel_id: ChannelId,
        author_id: UserId,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id,
            channel_id,
            author_id,
            content: content.into(),
            attachments: vec![],
        }
    }

    /// Handle for deleting or reacting to this message.
    pub fn handle(&self) -> MessageHandle {
        MessageHandle {
            id: self.id,
            channel_id: self.channel_id,
        }
    }

    /// Whether the message carries anything besides text.
    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }
}
