//! Builder for creating consoles.

use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use secrecy::SecretString;

use super::Console;
use super::config::ConsoleConfig;
use crate::error::{ConfigError, Result};
use crate::eval::{EnvExtension, Engine, Environment, Value};
use crate::text::Sanitizer;

/// Builder for constructing a [`Console`].
///
/// # Example
///
/// ```rust,ignore
/// use devconsole::ConsoleBuilder;
///
/// let console = ConsoleBuilder::new(engine)
///     .secret(bot_token)
///     .binding("bot", Value::opaque(bot_handle))
///     .page_length(2000)
///     .build()?;
/// ```
pub struct ConsoleBuilder<E> {
    engine: E,
    secret: Option<SecretString>,
    config: ConsoleConfig,
    bindings: Environment,
    extensions: IndexMap<String, Arc<dyn EnvExtension>>,
}

impl<E: Engine> ConsoleBuilder<E> {
    /// Start building a console around `engine`.
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            secret: None,
            config: ConsoleConfig::default(),
            bindings: Environment::new(),
            extensions: IndexMap::new(),
        }
    }

    /// Set the secret redacted from all output.
    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(SecretString::from(secret.into()));
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: ConsoleConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the channel's message length limit.
    pub fn page_length(mut self, page_length: usize) -> Self {
        self.config.page_length = page_length;
        self
    }

    /// Set the room reserved per page for decoration.
    pub fn shorten_by(mut self, shorten_by: usize) -> Self {
        self.config.shorten_by = shorten_by;
        self
    }

    /// Set the code-block label, or `None` to send output unboxed.
    pub fn box_label(mut self, label: Option<&str>) -> Self {
        self.config.box_label = label.map(str::to_string);
        self
    }

    /// Set how long delivery waits for a continuation reply.
    pub fn continuation_timeout(mut self, timeout: Duration) -> Self {
        self.config.continuation_timeout = timeout;
        self
    }

    /// Set the continuation reply token.
    pub fn continuation_token(mut self, token: impl Into<String>) -> Self {
        self.config.continuation_token = token.into();
        self
    }

    /// Set the REPL input trigger character.
    pub fn trigger(mut self, trigger: char) -> Self {
        self.config.trigger = trigger;
        self
    }

    /// Set the redaction placeholder.
    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.config.placeholder = placeholder.into();
        self
    }

    /// Add a base binding visible to every invocation.
    pub fn binding(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.bindings.set(name, value);
        self
    }

    /// Register an environment extension.
    pub fn extension(mut self, name: impl Into<String>, extension: impl EnvExtension + 'static) -> Self {
        self.extensions.insert(name.into(), Arc::new(extension));
        self
    }

    /// Build the console.
    ///
    /// Fails if the configuration is invalid.
    pub fn build(self) -> Result<Console<E>> {
        self.config.validate()?;

        let sanitizer = match &self.secret {
            Some(secret) => {
                Sanitizer::new(secret, self.config.placeholder.clone()).map_err(ConfigError::from)?
            }
            None => Sanitizer::disabled(),
        };

        Ok(Console::new(
            self.engine,
            self.config,
            sanitizer,
            self.bindings,
            self.extensions,
        ))
    }
}
