//! Event types for the Thanos event system
//!
//! Provides shared event definitions and the EventBus used to fan controller
//! changes out to SSE clients.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Where a clap pattern came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClapSource {
    /// Detected by the microphone on the sensor device
    Device,
    /// Simulated through the HTTP API
    Api,
}

impl std::fmt::Display for ClapSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClapSource::Device => write!(f, "device"),
            ClapSource::Api => write!(f, "api"),
        }
    }
}

/// Thanos event types
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HubEvent {
    /// LED state changed, either optimistically from a local command or
    /// from accepted device feedback
    StateChanged {
        led_on: bool,
        /// Brightness percentage (0-100)
        brightness: u8,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A clap pattern was accepted and added to history
    ClapDetected {
        pattern: u8,
        source: ClapSource,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Device liveness flipped
    DeviceConnectionChanged {
        connected: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Device feedback arrived inside the echo cooldown and was ignored
    FeedbackSuppressed {
        /// Raw feedback payload, e.g. "BRIGHTNESS:128"
        payload: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl HubEvent {
    /// Event name used for the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            HubEvent::StateChanged { .. } => "StateChanged",
            HubEvent::ClapDetected { .. } => "ClapDetected",
            HubEvent::DeviceConnectionChanged { .. } => "DeviceConnectionChanged",
            HubEvent::FeedbackSuppressed { .. } => "FeedbackSuppressed",
        }
    }
}

/// Central event distribution bus
///
/// Wraps tokio::broadcast: publishing never blocks, slow subscribers see
/// `Lagged` instead of stalling the controller.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<HubEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<HubEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: HubEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = HubEvent::ClapDetected {
            pattern: 3,
            source: ClapSource::Api,
            timestamp: chrono::Utc::now(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "ClapDetected");
        assert_eq!(json["pattern"], 3);
        assert_eq!(json["source"], "api");
        assert_eq!(event.event_type(), "ClapDetected");
    }

    #[tokio::test]
    async fn test_event_bus_delivers_to_subscribers() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        bus.emit_lossy(HubEvent::DeviceConnectionChanged {
            connected: true,
            timestamp: chrono::Utc::now(),
        });

        match rx.recv().await.unwrap() {
            HubEvent::DeviceConnectionChanged { connected, .. } => assert!(connected),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_emit_without_subscribers_is_silent() {
        let bus = EventBus::new(4);
        bus.emit_lossy(HubEvent::StateChanged {
            led_on: false,
            brightness: 0,
            timestamp: chrono::Utc::now(),
        });
        assert_eq!(bus.capacity(), 4);
    }
}
