//! Controller state store
//!
//! Single owner of LED state, connection health, clap history and the echo
//! suppression timestamp. Every operation takes the one lock for its whole
//! duration, so readers never observe a half-applied update, and the
//! compare-and-update steps (echo check, clap interpretation) cannot
//! interleave with a concurrent local command.
//!
//! Nothing here performs I/O. Callers publish outbound commands after the
//! returned future completes, outside the critical section.

use super::echo::{EchoSuppressor, DEFAULT_COOLDOWN};
use super::interpreter::{interpret, InterpreterSettings};
use super::liveness::{heartbeat_is_fresh, DEFAULT_HEARTBEAT_TIMEOUT};
use super::types::{ClapEvent, CommandAction, CommandIntent, DeviceFeedback, DeviceState};
use std::collections::VecDeque;
use std::time::Duration;
use thanos_common::api::{ClapHistoryEntry, StatusResponse};
use thanos_common::config::ControllerConfig;
use thanos_common::time::{clock_string, NEVER};
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Default number of clap events kept
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// Store tuning, usually derived from `[controller]` config
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreSettings {
    pub interpreter: InterpreterSettings,
    pub echo_cooldown: Duration,
    pub heartbeat_timeout: Duration,
    pub history_capacity: usize,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            interpreter: InterpreterSettings::default(),
            echo_cooldown: DEFAULT_COOLDOWN,
            heartbeat_timeout: DEFAULT_HEARTBEAT_TIMEOUT,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl From<&ControllerConfig> for StoreSettings {
    fn from(config: &ControllerConfig) -> Self {
        Self {
            interpreter: InterpreterSettings {
                step: config.brightness_step,
                mode: config.brightness_mode,
            },
            echo_cooldown: Duration::from_millis(config.echo_cooldown_ms),
            heartbeat_timeout: Duration::from_secs(config.heartbeat_timeout_secs),
            history_capacity: config.history_capacity.max(1),
        }
    }
}

/// Device connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectionHealth {
    pub connected: bool,
    pub last_heartbeat: Option<Instant>,
}

/// Most recent accepted clap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastClap {
    pub pattern: u8,
    /// "HH:MM:SS"
    pub time: String,
}

/// Owned point-in-time copy of the store
#[derive(Debug, Clone, PartialEq)]
pub struct StateSnapshot {
    pub device: DeviceState,
    pub health: ConnectionHealth,
    /// Newest first
    pub history: Vec<ClapHistoryEntry>,
    pub last_clap: Option<LastClap>,
    pub mic_level: i64,
    /// Most recent accepted state change and where it came from
    pub last_change: Option<CommandIntent>,
}

impl From<StateSnapshot> for StatusResponse {
    fn from(snapshot: StateSnapshot) -> Self {
        let (clap_pattern, last_clap_time) = match snapshot.last_clap {
            Some(clap) => (clap.pattern, clap.time),
            None => (0, NEVER.to_string()),
        };

        StatusResponse {
            led_status: snapshot.device.led_status().to_string(),
            brightness: snapshot.device.brightness,
            clap_pattern,
            last_clap_time,
            mic_level: snapshot.mic_level,
            esp32_connected: snapshot.health.connected,
            clap_history: snapshot.history,
        }
    }
}

/// Result of offering device feedback to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackOutcome {
    /// State overwritten with the reported value
    Applied(DeviceState),
    /// State already matched the report
    Unchanged,
    /// Inside the echo cooldown, ignored
    Suppressed,
}

/// Result of recording a clap
#[derive(Debug, Clone, PartialEq)]
pub struct ClapOutcome {
    pub entry: ClapHistoryEntry,
    /// Command to publish, already applied optimistically
    pub intent: Option<CommandIntent>,
    pub state: DeviceState,
}

#[derive(Debug)]
struct StoreInner {
    device: DeviceState,
    health: ConnectionHealth,
    history: VecDeque<ClapHistoryEntry>,
    last_clap: Option<LastClap>,
    mic_level: i64,
    last_change: Option<CommandIntent>,
    echo: EchoSuppressor,
}

impl StoreInner {
    fn apply_local(&mut self, action: CommandAction, now: Instant) -> CommandIntent {
        self.device = self.device.after(action);
        self.echo.record_local(now);
        let intent = CommandIntent::local(action, now);
        self.last_change = Some(intent);
        intent
    }

    fn refresh_liveness(&mut self, now: Instant, timeout: Duration) -> bool {
        if self.health.connected && !heartbeat_is_fresh(self.health.last_heartbeat, now, timeout) {
            self.health.connected = false;
            return true;
        }
        false
    }
}

/// Serialized access to all controller state
#[derive(Debug)]
pub struct StateStore {
    inner: Mutex<StoreInner>,
    settings: StoreSettings,
}

impl StateStore {
    pub fn new(settings: StoreSettings) -> Self {
        let history_capacity = settings.history_capacity.max(1);
        Self {
            inner: Mutex::new(StoreInner {
                device: DeviceState::default(),
                health: ConnectionHealth::default(),
                history: VecDeque::with_capacity(history_capacity),
                last_clap: None,
                mic_level: 0,
                last_change: None,
                echo: EchoSuppressor::new(settings.echo_cooldown),
            }),
            settings: StoreSettings {
                history_capacity,
                ..settings
            },
        }
    }

    /// Apply a locally issued command optimistically and start the echo cooldown
    pub async fn apply_local(&self, action: CommandAction, now: Instant) -> (CommandIntent, DeviceState) {
        let mut inner = self.inner.lock().await;
        let intent = inner.apply_local(action, now);
        (intent, inner.device)
    }

    /// Apply device-reported state unless it is likely an echo
    pub async fn apply_feedback(&self, feedback: &DeviceFeedback, now: Instant) -> FeedbackOutcome {
        let mut inner = self.inner.lock().await;

        if !inner.echo.should_apply(now) {
            return FeedbackOutcome::Suppressed;
        }

        let reported = inner.device.after(feedback.action);
        if reported == inner.device {
            return FeedbackOutcome::Unchanged;
        }
        inner.device = reported;
        inner.last_change = Some(CommandIntent::feedback(feedback.action, now));
        FeedbackOutcome::Applied(reported)
    }

    /// Record a clap, interpret it against the current state and apply the
    /// resulting command, all in one critical section
    pub async fn record_clap(&self, event: &ClapEvent, now: Instant) -> ClapOutcome {
        let mut inner = self.inner.lock().await;

        let entry = ClapHistoryEntry {
            time: clock_string(event.observed_at),
            pattern: event.pattern,
            source: event.source,
        };
        inner.history.push_front(entry.clone());
        inner.history.truncate(self.settings.history_capacity);
        inner.last_clap = Some(LastClap {
            pattern: event.pattern,
            time: entry.time.clone(),
        });
        inner.mic_level = event.mic_level.unwrap_or(0);

        let intent = interpret(
            event.pattern,
            event.average_period,
            inner.device,
            &self.settings.interpreter,
        )
        .map(|action| inner.apply_local(action, now));

        ClapOutcome {
            entry,
            intent,
            state: inner.device,
        }
    }

    /// Record a heartbeat; returns true if the device was previously disconnected
    pub async fn record_heartbeat(&self, now: Instant) -> bool {
        let mut inner = self.inner.lock().await;
        let was_connected = inner.health.connected;
        inner.health.connected = true;
        inner.health.last_heartbeat = Some(now);
        !was_connected
    }

    /// Forget the last heartbeat after the device announced it went offline;
    /// returns true if it was connected
    pub async fn mark_offline(&self) -> bool {
        let mut inner = self.inner.lock().await;
        let was_connected = inner.health.connected;
        inner.health.connected = false;
        inner.health.last_heartbeat = None;
        was_connected
    }

    /// Mark the device disconnected if its heartbeat is stale; returns true if
    /// this call flipped it
    pub async fn check_liveness(&self, now: Instant) -> bool {
        self.inner
            .lock()
            .await
            .refresh_liveness(now, self.settings.heartbeat_timeout)
    }

    /// Connection flag as last computed, without rechecking
    pub async fn is_connected(&self) -> bool {
        self.inner.lock().await.health.connected
    }

    pub async fn device_state(&self) -> DeviceState {
        self.inner.lock().await.device
    }

    /// Recompute liveness and copy everything out
    ///
    /// The bool is true when the recompute flipped the device to disconnected.
    pub async fn snapshot(&self, now: Instant) -> (StateSnapshot, bool) {
        let mut inner = self.inner.lock().await;
        let flipped = inner.refresh_liveness(now, self.settings.heartbeat_timeout);

        let snapshot = StateSnapshot {
            device: inner.device,
            health: inner.health,
            history: inner.history.iter().cloned().collect(),
            last_clap: inner.last_clap.clone(),
            mic_level: inner.mic_level,
            last_change: inner.last_change,
        };
        (snapshot, flipped)
    }
}
