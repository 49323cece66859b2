//! Console configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::delivery::{DEFAULT_ACK, DeliveryOptions};
use crate::error::ConfigError;
use crate::text::{DEFAULT_PLACEHOLDER, PagifyOptions};

/// Tunables for a [`Console`](super::Console).
///
/// Missing fields take their default when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Maximum message length accepted by the channel, in characters.
    pub page_length: usize,

    /// Room reserved on each page for the code-block wrapper.
    pub shorten_by: usize,

    /// Preferred split points, most preferred first.
    pub delimiters: Vec<String>,

    /// Take the first delimiter that matches instead of the latest match.
    pub priority: bool,

    /// Code-block language label for delivered output.
    pub box_label: Option<String>,

    /// How long to wait for a continuation reply.
    pub continuation_timeout: Duration,

    /// Reply that releases the next page.
    pub continuation_token: String,

    /// Leading character that marks a message as REPL input.
    pub trigger: char,

    /// Cleaned REPL inputs that end the session.
    pub quit_keywords: Vec<String>,

    /// Text substituted for the protected secret.
    pub placeholder: String,

    /// Language tags stripped from fenced code.
    pub fence_languages: Vec<String>,

    /// Reaction added to acknowledged messages.
    pub ack_emoji: String,

    /// Remove terminal escape sequences from output.
    pub strip_ansi: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            page_length: 2000,
            shorten_by: 10,
            delimiters: vec!["\n".to_string(), " ".to_string()],
            priority: true,
            box_label: Some("py".to_string()),
            continuation_timeout: Duration::from_secs(15),
            continuation_token: "more".to_string(),
            trigger: '`',
            quit_keywords: vec!["quit".to_string(), "exit".to_string(), "exit()".to_string()],
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            fence_languages: vec!["py".to_string(), "python".to_string()],
            ack_emoji: DEFAULT_ACK.to_string(),
            strip_ansi: true,
        }
    }
}

impl ConsoleConfig {
    /// Check that the configuration can produce pages and end sessions.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_length <= self.shorten_by {
            return Err(ConfigError::InvalidPageLength {
                page_length: self.page_length,
                shorten_by: self.shorten_by,
            });
        }
        if self.continuation_token.trim().is_empty() {
            return Err(ConfigError::EmptyContinuationToken);
        }
        if self.quit_keywords.iter().all(|k| k.is_empty()) {
            return Err(ConfigError::NoQuitKeywords);
        }
        Ok(())
    }

    /// Pager settings for delivered output.
    pub fn pagify_options(&self) -> PagifyOptions {
        PagifyOptions::default()
            .with_delimiters(self.delimiters.iter().cloned())
            .with_priority(self.priority)
            .with_shorten_by(self.shorten_by)
            .with_page_length(self.page_length)
    }

    /// Delivery settings for delivered output.
    pub fn delivery_options(&self) -> DeliveryOptions {
        DeliveryOptions {
            box_label: self.box_label.clone(),
            timeout: self.continuation_timeout,
            token: self.continuation_token.clone(),
        }
    }
}
