//! Delimiter-aware pagination of long output.
//!
//! Pages are produced lazily. All lengths are counted in characters, so a
//! page never exceeds `page_length - shorten_by` characters and never splits
//! a multi-byte character.

use log::warn;
use memchr::memmem;

/// Options controlling how text is split into pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagifyOptions {
    /// Delimiters to split on, in priority order.
    pub delimiters: Vec<String>,

    /// Take the first delimiter that matches instead of the latest match.
    pub priority: bool,

    /// Characters reserved for decoration (code fences, labels).
    pub shorten_by: usize,

    /// Transport length limit of one message.
    pub page_length: usize,
}

impl Default for PagifyOptions {
    fn default() -> Self {
        Self {
            delimiters: vec!["\n".to_string()],
            priority: false,
            shorten_by: 12,
            page_length: 2000,
        }
    }
}

impl PagifyOptions {
    /// Set the delimiters.
    pub fn with_delimiters<I, S>(mut self, delimiters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.delimiters = delimiters.into_iter().map(Into::into).collect();
        self
    }

    /// Set delimiter priority.
    pub fn with_priority(mut self, priority: bool) -> Self {
        self.priority = priority;
        self
    }

    /// Set the number of characters reserved per page.
    pub fn with_shorten_by(mut self, shorten_by: usize) -> Self {
        self.shorten_by = shorten_by;
        self
    }

    /// Set the transport length limit.
    pub fn with_page_length(mut self, page_length: usize) -> Self {
        self.page_length = page_length;
        self
    }

    /// Effective page limit, clamped to at least one character.
    pub fn limit(&self) -> usize {
        self.page_length.saturating_sub(self.shorten_by).max(1)
    }
}

/// Split `text` into pages.
pub fn pagify<'a>(text: &'a str, options: &'a PagifyOptions) -> Pagify<'a> {
    Pagify::new(text, options)
}

/// Lazy page iterator returned by [`pagify`].
///
/// Holds no state besides the unread remainder, so cloning it restarts
/// pagination from the current position.
#[derive(Debug, Clone)]
pub struct Pagify<'a> {
    remaining: &'a str,
    options: &'a PagifyOptions,
    limit: usize,
}

impl<'a> Pagify<'a> {
    /// Create a page iterator over `text`.
    pub fn new(text: &'a str, options: &'a PagifyOptions) -> Self {
        if options.page_length <= options.shorten_by {
            warn!(
                "page_length {} does not exceed shorten_by {}, clamping page limit to 1",
                options.page_length, options.shorten_by
            );
        }
        Self {
            remaining: text,
            options,
            limit: options.limit(),
        }
    }

    /// Byte offset of the split point for the current remainder, or `None`
    /// when the remainder fits in one page.
    fn split_point(&self) -> Option<usize> {
        let text = self.remaining;
        // Byte offset of the `limit`-th character; absent when the text is short enough.
        let (limit_byte, _) = text.char_indices().nth(self.limit)?;

        // Matches must start at character index >= 1 and end at or before the limit.
        let window_start = text.chars().next().map_or(0, char::len_utf8);
        let window = text[window_start..limit_byte].as_bytes();

        let mut matches = self
            .options
            .delimiters
            .iter()
            .map(|d| memmem::rfind(window, d.as_bytes()).map(|i| i + window_start));

        let closest = if self.options.priority {
            matches.find_map(|m| m)
        } else {
            matches.flatten().max()
        };

        Some(closest.unwrap_or(limit_byte))
    }
}

impl Iterator for Pagify<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        while let Some(split) = self.split_point() {
            let (page, rest) = self.remaining.split_at(split);
            self.remaining = rest;
            if !page.trim().is_empty() {
                return Some(page.to_string());
            }
        }

        let last = std::mem::take(&mut self.remaining);
        if last.trim().is_empty() {
            None
        } else {
            Some(last.to_string())
        }
    }
}
