//! Per-channel REPL session tracking.

mod registry;

pub use registry::{OpenOutcome, SessionGuard, SessionRegistry, SessionState};
