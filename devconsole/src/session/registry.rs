//! Session registry keyed by channel.
//!
//! At most one session exists per channel. Every operation takes the same
//! lock, so opening is an atomic check-then-insert and pause commands can
//! never race a session into existence. Each opened session carries an
//! epoch, so a guard only ever acts on the session it was taken for.
//!
//! ```text
//!            open              quit
//!   Absent ───────► Running ─────────► Absent
//!                    │   ▲
//!              pause │   │ resume
//!                    ▼   │      quit
//!                   Paused ──────────► Absent
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{debug, trace};

use crate::channel::ChannelId;
use crate::error::SessionError;
use crate::eval::Value;

/// Lifecycle state of a channel's session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No session in this channel.
    Absent,
    /// Inputs are evaluated.
    Running,
    /// Inputs are ignored until resumed; quit still works.
    Paused,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Absent => "absent",
            Self::Running => "running",
            Self::Paused => "paused",
        };
        f.write_str(name)
    }
}

/// Result of [`SessionRegistry::open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    /// A new session was created in the running state.
    Opened,
    /// A running session already exists; nothing changed.
    AlreadyRunning,
    /// A paused session already exists; nothing changed.
    AlreadyPaused,
}

#[derive(Debug)]
struct Session {
    epoch: u64,
    state: SessionState,
    last_result: Value,
}

/// Owner of every live session.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<ChannelId, Session>>,
    epochs: AtomicU64,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<ChannelId, Session>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open a session in `channel` unless one already exists.
    pub fn open(&self, channel: ChannelId) -> OpenOutcome {
        let mut sessions = self.sessions();
        match sessions.get(&channel).map(|s| s.state) {
            Some(SessionState::Paused) => OpenOutcome::AlreadyPaused,
            Some(_) => OpenOutcome::AlreadyRunning,
            None => {
                let epoch = self.epochs.fetch_add(1, Ordering::Relaxed) + 1;
                sessions.insert(
                    channel,
                    Session {
                        epoch,
                        state: SessionState::Running,
                        last_result: Value::None,
                    },
                );
                debug!("session {} opened in channel {}", epoch, channel);
                OpenOutcome::Opened
            }
        }
    }

    /// Resume (`Some(true)`), pause (`Some(false)`) or toggle (`None`) the
    /// session in `channel`, returning the new state.
    pub fn set_running(
        &self,
        channel: ChannelId,
        running: Option<bool>,
    ) -> Result<SessionState, SessionError> {
        let mut sessions = self.sessions();
        let session = sessions
            .get_mut(&channel)
            .ok_or(SessionError::NoSession(channel))?;
        let run = running.unwrap_or(session.state == SessionState::Paused);
        session.state = if run {
            SessionState::Running
        } else {
            SessionState::Paused
        };
        debug!("session in channel {} is now {}", channel, session.state);
        Ok(session.state)
    }

    /// Current state of `channel`'s session.
    pub fn state(&self, channel: ChannelId) -> SessionState {
        self.sessions()
            .get(&channel)
            .map_or(SessionState::Absent, |s| s.state)
    }

    /// Store the latest successful result of `channel`'s session.
    ///
    /// Returns `false` if there is no session.
    pub fn record_result(&self, channel: ChannelId, value: Value) -> bool {
        match self.sessions().get_mut(&channel) {
            Some(session) => {
                session.last_result = value;
                true
            }
            None => false,
        }
    }

    /// The latest successful result of `channel`'s session.
    pub fn last_result(&self, channel: ChannelId) -> Option<Value> {
        self.sessions()
            .get(&channel)
            .map(|s| s.last_result.clone())
    }

    /// Remove `channel`'s session. Returns whether one existed.
    pub fn close(&self, channel: ChannelId) -> bool {
        let removed = self.sessions().remove(&channel).is_some();
        if removed {
            debug!("session closed in channel {}", channel);
        }
        removed
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions().len()
    }

    /// Check if there are no live sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions().is_empty()
    }

    /// Channels with a live session.
    pub fn channels(&self) -> Vec<ChannelId> {
        self.sessions().keys().copied().collect()
    }

    /// Tie `channel`'s current session to the returned guard's lifetime.
    ///
    /// If the session is later closed and another opened in its place, the
    /// guard sees [`SessionState::Absent`] and leaves the new one alone.
    pub fn guard(&self, channel: ChannelId) -> SessionGuard<'_> {
        let epoch = self.sessions().get(&channel).map(|s| s.epoch);
        SessionGuard {
            registry: self,
            channel,
            epoch,
        }
    }
}

/// Removes its session when dropped.
///
/// Held by the REPL loop, so the session disappears however the loop ends.
#[derive(Debug)]
pub struct SessionGuard<'a> {
    registry: &'a SessionRegistry,
    channel: ChannelId,
    epoch: Option<u64>,
}

impl SessionGuard<'_> {
    /// Channel of the guarded session.
    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    fn owns(&self, session: &Session) -> bool {
        self.epoch == Some(session.epoch)
    }

    /// Current state of the guarded session.
    pub fn state(&self) -> SessionState {
        self.registry
            .sessions()
            .get(&self.channel)
            .filter(|s| self.owns(s))
            .map_or(SessionState::Absent, |s| s.state)
    }

    /// Store the latest successful result of the guarded session.
    ///
    /// Returns `false` if the session is gone.
    pub fn record_result(&self, value: Value) -> bool {
        match self
            .registry
            .sessions()
            .get_mut(&self.channel)
            .filter(|s| self.owns(s))
        {
            Some(session) => {
                session.last_result = value;
                true
            }
            None => false,
        }
    }
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        let mut sessions = self.registry.sessions();
        if sessions.get(&self.channel).is_some_and(|s| self.owns(s)) {
            sessions.remove(&self.channel);
            trace!("session guard released channel {}", self.channel);
        }
    }
}
