//! Controller entry points used by the MQTT loop and the HTTP handlers

use super::decoder::{decode, InboundEvent};
use super::store::{FeedbackOutcome, StateSnapshot, StateStore};
use super::types::{ClapEvent, CommandAction, CommandIntent, DeviceFeedback, DeviceState};
use crate::error::{Error, Result};
use crate::transport::CommandSink;
use chrono::Local;
use std::sync::Arc;
use thanos_common::config::TopicConfig;
use thanos_common::events::{ClapSource, EventBus, HubEvent};
use thanos_common::time;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Shared controller handle
///
/// All state lives in the store; the controller itself is immutable and is
/// shared between tasks behind an `Arc`.
///
/// Anything that may publish a command holds `outbound` from the store update
/// until the send returns, so commands reach the wire in the order the store
/// applied them. Reads and feedback never take it.
pub struct Controller {
    store: Arc<StateStore>,
    sink: Arc<dyn CommandSink>,
    topics: TopicConfig,
    events: EventBus,
    outbound: Mutex<()>,
}

impl Controller {
    pub fn new(
        store: Arc<StateStore>,
        sink: Arc<dyn CommandSink>,
        topics: TopicConfig,
        events: EventBus,
    ) -> Self {
        Self {
            store,
            sink,
            topics,
            events,
            outbound: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Process one inbound MQTT message
    ///
    /// Never fails: malformed or unknown messages are logged and dropped
    /// without touching state.
    pub async fn handle_inbound(&self, topic: &str, payload: &[u8]) {
        let now = Instant::now();

        match decode(&self.topics, topic, payload, Local::now()) {
            InboundEvent::Clap(event) => {
                self.process_clap(event, now).await;
            }
            InboundEvent::Heartbeat => {
                if self.store.record_heartbeat(now).await {
                    info!("Device connected");
                    self.emit_connection(true);
                } else {
                    debug!("Heartbeat");
                }
            }
            InboundEvent::DeviceOffline => {
                if self.store.mark_offline().await {
                    warn!("Device reported offline");
                    self.emit_connection(false);
                }
            }
            InboundEvent::Feedback(feedback) => self.process_feedback(feedback, now).await,
            InboundEvent::Unrecognized(reason) => {
                warn!(topic, "Dropping message: {}", reason);
            }
        }
    }

    /// Issue a direct command (HTTP control endpoint)
    pub async fn issue_command(&self, action: CommandAction) -> CommandIntent {
        let _outbound = self.outbound.lock().await;
        let (intent, state) = self.store.apply_local(action, Instant::now()).await;
        info!("Command: {}", action);
        self.emit_state(state);
        self.publish(action).await;
        intent
    }

    /// Run a simulated clap through the same path as a sensor clap
    ///
    /// Returns the command it produced, if any.
    pub async fn submit_clap(&self, pattern: i64, source: ClapSource) -> Result<Option<CommandAction>> {
        let event = ClapEvent::new(pattern, source, Local::now()).ok_or(Error::UnknownPattern(pattern))?;
        Ok(self.process_clap(event, Instant::now()).await)
    }

    /// Current state with connection status recomputed
    pub async fn get_snapshot(&self) -> StateSnapshot {
        let (snapshot, flipped) = self.store.snapshot(Instant::now()).await;
        if flipped {
            warn!("No heartbeat from device, marking disconnected");
            self.emit_connection(false);
        }
        snapshot
    }

    async fn process_clap(&self, event: ClapEvent, now: Instant) -> Option<CommandAction> {
        let _outbound = self.outbound.lock().await;
        let outcome = self.store.record_clap(&event, now).await;
        info!(
            source = %event.source,
            period = ?event.average_period,
            "Clap pattern {} detected",
            event.pattern
        );
        self.events.emit_lossy(HubEvent::ClapDetected {
            pattern: event.pattern,
            source: event.source,
            timestamp: time::now(),
        });

        let action = outcome.intent?.action;
        self.emit_state(outcome.state);
        self.publish(action).await;
        Some(action)
    }

    async fn process_feedback(&self, feedback: DeviceFeedback, now: Instant) {
        match self.store.apply_feedback(&feedback, now).await {
            FeedbackOutcome::Applied(state) => {
                info!("Device reports {}", feedback.raw);
                self.emit_state(state);
            }
            FeedbackOutcome::Unchanged => {
                debug!("Device confirms {}", feedback.raw);
            }
            FeedbackOutcome::Suppressed => {
                debug!("Ignoring echo {}", feedback.raw);
                self.events.emit_lossy(HubEvent::FeedbackSuppressed {
                    payload: feedback.raw,
                    timestamp: time::now(),
                });
            }
        }
    }

    /// Send outside the store lock but inside `outbound`; a failed send leaves
    /// the optimistic state
    async fn publish(&self, action: CommandAction) {
        if let Err(e) = self.sink.send_command(action).await {
            error!("Failed to send {}: {}", action, e);
        }
    }

    fn emit_state(&self, state: DeviceState) {
        self.events.emit_lossy(HubEvent::StateChanged {
            led_on: state.led_on,
            brightness: state.brightness,
            timestamp: time::now(),
        });
    }

    fn emit_connection(&self, connected: bool) {
        self.events.emit_lossy(HubEvent::DeviceConnectionChanged {
            connected,
            timestamp: time::now(),
        });
    }
}
