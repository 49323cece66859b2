//! The console: command handlers tying evaluation, sessions and delivery
//! together.

mod builder;
mod command;
mod config;
pub mod replay;

pub use builder::ConsoleBuilder;
pub use command::{Command, CommandContext, parse_bool};
pub use config::ConsoleConfig;

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use indexmap::IndexMap;
use log::{debug, trace, warn};

use crate::channel::{CodeInput, IncomingMessage, MessageChannel, MessageHandle, UserId};
use crate::delivery::{DeliveryOptions, add_ack, send_interactive};
use crate::error::{ChannelError, Result, SessionError};
use crate::eval::{
    EnvExtension, Environment, Evaluator, ExecutionMode, ExecutionRequest, ExecutionResult, Engine,
    Value,
};
use crate::session::{OpenOutcome, SessionRegistry, SessionState};
use crate::text::{PagifyOptions, Sanitizer, cleanup_code, is_quit, pagify, strip_ansi};

const MODULE_NAME: &str = "__main__";

/// Interactive code console over an [`Engine`].
///
/// One console serves every channel; share it by reference or `Arc`.
pub struct Console<E> {
    engine: E,
    config: ConsoleConfig,
    sanitizer: Sanitizer,
    pages: PagifyOptions,
    delivery: DeliveryOptions,
    sessions: SessionRegistry,
    bindings: Environment,
    extensions: RwLock<IndexMap<String, Arc<dyn EnvExtension>>>,
    last_result: Mutex<Value>,
}

impl<E: Engine> Console<E> {
    /// Start building a console around `engine`.
    pub fn builder(engine: E) -> ConsoleBuilder<E> {
        ConsoleBuilder::new(engine)
    }

    pub(crate) fn new(
        engine: E,
        config: ConsoleConfig,
        sanitizer: Sanitizer,
        bindings: Environment,
        extensions: IndexMap<String, Arc<dyn EnvExtension>>,
    ) -> Self {
        Self {
            pages: config.pagify_options(),
            delivery: config.delivery_options(),
            engine,
            config,
            sanitizer,
            sessions: SessionRegistry::new(),
            bindings,
            extensions: RwLock::new(extensions),
            last_result: Mutex::new(Value::None),
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    /// The session registry.
    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Result of the latest successful `debug` or `eval`.
    pub fn last_result(&self) -> Value {
        self.last_result
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_last_result(&self, value: Value) {
        *self.last_result.lock().unwrap_or_else(PoisonError::into_inner) = value;
    }

    /// Register an environment extension, replacing any with the same name.
    pub fn add_env_extension(
        &self,
        name: impl Into<String>,
        extension: impl EnvExtension + 'static,
    ) -> Option<Arc<dyn EnvExtension>> {
        let name = name.into();
        debug!("adding environment extension '{}'", name);
        self.extensions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, Arc::new(extension))
    }

    /// Unregister an environment extension.
    pub fn remove_env_extension(&self, name: &str) -> Option<Arc<dyn EnvExtension>> {
        debug!("removing environment extension '{}'", name);
        self.extensions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .shift_remove(name)
    }

    /// Build the environment for an invocation by `message`.
    pub fn environment(&self, message: &IncomingMessage) -> Environment {
        let mut env = self.bindings.clone();
        env.set("author", Value::opaque(message.author_id));
        env.set("channel", Value::opaque(message.channel_id));
        env.set("message", Value::opaque(message.clone()));
        env.set_last_result(self.last_result());
        env.set("__name__", MODULE_NAME);

        let extensions = self
            .extensions
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        for (name, extension) in extensions.iter() {
            let value = extension.provide(message).unwrap_or_else(|e| {
                debug!("environment extension '{}' failed: {}", name, e);
                Value::Error(e)
            });
            env.set(name.clone(), value);
        }
        env
    }

    /// Run a parsed command.
    pub async fn dispatch<C: MessageChannel>(
        &self,
        ctx: &CommandContext<'_, C>,
        command: Command,
    ) -> Result<()> {
        trace!("dispatching {:?} in channel {}", command, ctx.channel.id());
        match command {
            Command::Debug(code) => self.debug(ctx, &code).await,
            Command::Eval(body) => self.eval(ctx, &body).await,
            Command::Repl => self.repl(ctx).await,
            Command::Pause(running) => self.pause(ctx, running).await,
        }
    }

    /// Evaluate a single expression and reply with its value.
    pub async fn debug<C: MessageChannel>(&self, ctx: &CommandContext<'_, C>, code: &str) -> Result<()> {
        self.run_once(ctx, code, ExecutionMode::Expression).await
    }

    /// Run a statement body and reply with its output and return value.
    pub async fn eval<C: MessageChannel>(&self, ctx: &CommandContext<'_, C>, body: &str) -> Result<()> {
        self.run_once(ctx, body, ExecutionMode::Script).await
    }

    async fn run_once<C: MessageChannel>(
        &self,
        ctx: &CommandContext<'_, C>,
        source: &str,
        mode: ExecutionMode,
    ) -> Result<()> {
        let mut env = self.environment(&ctx.message);
        let code = cleanup_code(source, &self.config.fence_languages);
        let request = ExecutionRequest::new(code, mode);

        match Evaluator::new(&self.engine).run(&request, &mut env).await {
            Ok(result) => {
                let text = result.render();
                if let Some(value) = result.return_value.as_ref().filter(|_| !text.is_empty()) {
                    self.set_last_result(value.clone());
                }
                self.acknowledge(ctx.channel, &ctx.message.handle(), &result).await;
                self.deliver(ctx.channel, ctx.author(), &text).await
            }
            Err(err) => {
                debug!("{:?} compile failed: {}", mode, err);
                self.deliver(ctx.channel, ctx.author(), &err.diagram()).await
            }
        }
    }

    /// Open a REPL session in the invoking channel and serve it until the
    /// author quits.
    pub async fn repl<C: MessageChannel>(&self, ctx: &CommandContext<'_, C>) -> Result<()> {
        let channel_id = ctx.channel.id();
        match self.sessions.open(channel_id) {
            OpenOutcome::Opened => {}
            OpenOutcome::AlreadyRunning => {
                ctx.channel
                    .send("Already running a REPL session in this channel. Exit it with `quit`.")
                    .await?;
                return Ok(());
            }
            OpenOutcome::AlreadyPaused => {
                ctx.channel
                    .send(&format!(
                        "Already running a REPL session in this channel. Resume the REPL with `{}repl resume`.",
                        ctx.prefix
                    ))
                    .await?;
                return Ok(());
            }
        }
        let session = self.sessions.guard(channel_id);

        let mut env = self.environment(&ctx.message);
        env.set_last_result(Value::None);

        ctx.channel
            .send(&format!(
                "Enter code to execute or evaluate. `exit()` or `quit` to exit. `{}repl pause` to pause.",
                ctx.prefix
            ))
            .await?;

        let input = CodeInput::new(ctx.author(), channel_id, self.config.trigger);
        let evaluator = Evaluator::new(&self.engine);

        loop {
            let response = ctx.channel.await_matching(&input, None).await?;
            let cleaned = cleanup_code(&response.content, &self.config.fence_languages);

            let state = session.state();
            if state == SessionState::Absent {
                debug!("session in channel {} was closed externally", channel_id);
                return Ok(());
            }
            if is_quit(cleaned, &self.config.quit_keywords) {
                ctx.channel.send("Exiting.").await?;
                return Ok(());
            }
            if state == SessionState::Paused {
                trace!("session in channel {} is paused, ignoring input", channel_id);
                continue;
            }

            env.set("message", Value::opaque(response.clone()));
            let request = ExecutionRequest::new(cleaned, ExecutionMode::Adaptive);

            let text = match evaluator.run(&request, &mut env).await {
                Ok(result) => {
                    let text = result.render();
                    if let Some(value) = result.return_value.as_ref().filter(|_| !text.is_empty()) {
                        env.set_last_result(value.clone());
                        session.record_result(value.clone());
                    }
                    self.acknowledge(ctx.channel, &response.handle(), &result).await;
                    text
                }
                Err(err) => err.diagram(),
            };
            self.deliver(ctx.channel, ctx.author(), &text).await?;
        }
    }

    /// Resume (`Some(true)`), pause (`Some(false)`) or toggle (`None`) the
    /// REPL session in the invoking channel.
    pub async fn pause<C: MessageChannel>(
        &self,
        ctx: &CommandContext<'_, C>,
        running: Option<bool>,
    ) -> Result<()> {
        let reply = match self.sessions.set_running(ctx.channel.id(), running) {
            Ok(SessionState::Paused) => "The REPL session in this channel is now paused.",
            Ok(SessionState::Running) => "The REPL session in this channel has been resumed.",
            Ok(SessionState::Absent) | Err(SessionError::NoSession(_)) => {
                "There is no currently running REPL session in this channel."
            }
        };
        ctx.channel.send(reply).await?;
        Ok(())
    }

    async fn acknowledge<C: MessageChannel>(
        &self,
        channel: &C,
        message: &MessageHandle,
        result: &ExecutionResult,
    ) {
        if result.is_success() && !result.is_empty() {
            add_ack(channel, message, &self.config.ack_emoji).await;
        }
    }

    /// Clean, redact, paginate and send `text`.
    ///
    /// Forbidden sends are dropped; other send failures are reported once in
    /// the channel. Only a closed channel is returned as an error.
    async fn deliver<C: MessageChannel>(&self, channel: &C, author: UserId, text: &str) -> Result<()> {
        let text = if self.config.strip_ansi {
            strip_ansi(text)
        } else {
            text.to_string()
        };
        let text = self.sanitizer.sanitize(&text);

        match send_interactive(channel, author, pagify(&text, &self.pages), &self.delivery).await {
            Ok(sent) => {
                trace!("delivered {} page(s) to channel {}", sent.len(), channel.id());
                Ok(())
            }
            Err(ChannelError::Closed) => Err(ChannelError::Closed.into()),
            Err(e) if e.is_forbidden() => {
                debug!("not allowed to send in channel {}: {}", channel.id(), e);
                Ok(())
            }
            Err(e) => {
                warn!("failed to deliver output to channel {}: {}", channel.id(), e);
                if let Err(e) = channel.send(&format!("Unexpected error: `{}`", e)).await {
                    debug!("failed to report delivery error: {}", e);
                }
                Ok(())
            }
        }
    }
}
