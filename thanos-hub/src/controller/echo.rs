//! Echo suppression for device feedback
//!
//! After the controller issues a command it updates its own state right away.
//! The device then reports the new state back on the status topic, sometimes
//! after a later command has already been issued. Feedback arriving within the
//! cooldown of the last local command is treated as an echo and dropped so the
//! UI does not bounce between old and new values.
//!
//! This is a time heuristic: a genuine device-side change inside the window is
//! lost too, and is picked up on the next report.

use std::time::Duration;
use tokio::time::Instant;

/// Default cooldown after a local command
pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(500);

/// Tracks when the controller last issued a command
///
/// Lives inside the state store so recording and checking share its lock.
#[derive(Debug, Clone)]
pub struct EchoSuppressor {
    cooldown: Duration,
    last_local_command: Option<Instant>,
}

impl EchoSuppressor {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_local_command: None,
        }
    }

    /// Note that a local command was issued at `now`
    pub fn record_local(&mut self, now: Instant) {
        self.last_local_command = Some(now);
    }

    /// Whether device feedback received at `now` should overwrite state
    pub fn should_apply(&self, now: Instant) -> bool {
        match self.last_local_command {
            None => true,
            Some(issued) => now.saturating_duration_since(issued) > self.cooldown,
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }
}

impl Default for EchoSuppressor {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}
