//! Redaction of a protected secret from user-visible output.

use std::borrow::Cow;
use std::fmt;

use regex::{NoExpand, Regex, RegexBuilder};
use secrecy::{ExposeSecret, SecretString};

/// Replacement used when no placeholder is configured.
pub const DEFAULT_PLACEHOLDER: &str = "[EXPUNGED]";

/// Replaces every case-insensitive occurrence of a secret.
#[derive(Clone)]
pub struct Sanitizer {
    /// `None` for an empty secret, which would otherwise match everywhere.
    pattern: Option<Regex>,
    placeholder: String,
}

impl Sanitizer {
    /// Build a sanitizer for `secret`.
    pub fn new(secret: &SecretString, placeholder: impl Into<String>) -> Result<Self, regex::Error> {
        let secret = secret.expose_secret();
        let pattern = if secret.is_empty() {
            None
        } else {
            Some(
                RegexBuilder::new(&regex::escape(secret))
                    .case_insensitive(true)
                    .build()?,
            )
        };
        Ok(Self {
            pattern,
            placeholder: placeholder.into(),
        })
    }

    /// A sanitizer that leaves text unchanged.
    pub fn disabled() -> Self {
        Self {
            pattern: None,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }

    /// Redact the secret from `text`.
    pub fn sanitize<'t>(&self, text: &'t str) -> Cow<'t, str> {
        match &self.pattern {
            Some(pattern) => pattern.replace_all(text, NoExpand(self.placeholder.as_str())),
            None => Cow::Borrowed(text),
        }
    }

    /// The replacement text.
    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }
}

impl fmt::Debug for Sanitizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sanitizer")
            .field("secret", &self.pattern.as_ref().map(|_| "[REDACTED]"))
            .field("placeholder", &self.placeholder)
            .finish()
    }
}

/// One-shot redaction of `secret` with the default placeholder.
pub fn sanitize(output: &str, secret: &str) -> String {
    match Sanitizer::new(&SecretString::from(secret.to_string()), DEFAULT_PLACEHOLDER) {
        Ok(sanitizer) => sanitizer.sanitize(output).into_owned(),
        // An escaped literal always compiles unless it exceeds the size limit.
        Err(_) => output.replace(secret, DEFAULT_PLACEHOLDER),
    }
}
