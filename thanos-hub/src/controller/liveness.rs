//! Device liveness tracking
//!
//! The device publishes a heartbeat every few seconds. Heartbeat ingestion
//! marks the device connected immediately; this module's periodic task only
//! detects the absence of heartbeats and never asserts liveness itself.

use super::store::StateStore;
use std::sync::Arc;
use std::time::Duration;
use thanos_common::events::{EventBus, HubEvent};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How often the monitor checks heartbeat recency
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(5);

/// Heartbeat age after which the device counts as disconnected
pub const DEFAULT_HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(10);

/// True when a heartbeat was seen no more than `timeout` before `now`
pub fn heartbeat_is_fresh(last_heartbeat: Option<Instant>, now: Instant, timeout: Duration) -> bool {
    last_heartbeat.is_some_and(|seen| now.saturating_duration_since(seen) <= timeout)
}

/// Periodic task flipping the device to disconnected when heartbeats stop
pub struct LivenessMonitor {
    store: Arc<StateStore>,
    events: EventBus,
    interval: Duration,
    cancel: CancellationToken,
}

impl LivenessMonitor {
    pub fn new(
        store: Arc<StateStore>,
        events: EventBus,
        interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            store,
            events,
            interval,
            cancel,
        }
    }

    /// Run until the cancellation token fires
    ///
    /// ```rust,ignore
    /// let monitor = LivenessMonitor::new(store, events, interval, cancel.child_token());
    /// tokio::spawn(monitor.run());
    /// ```
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Liveness monitor started ({}ms interval)", self.interval.as_millis());

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    info!("Liveness monitor stopped");
                    break;
                }
                _ = ticker.tick() => {
                    if self.store.check_liveness(Instant::now()).await {
                        warn!("No heartbeat from device, marking disconnected");
                        self.events.emit_lossy(HubEvent::DeviceConnectionChanged {
                            connected: false,
                            timestamp: thanos_common::time::now(),
                        });
                    } else {
                        debug!("Liveness check: no change");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::store::StoreSettings;

    #[test]
    fn test_heartbeat_freshness() {
        let t0 = Instant::now();
        let timeout = DEFAULT_HEARTBEAT_TIMEOUT;

        assert!(!heartbeat_is_fresh(None, t0, timeout));
        assert!(heartbeat_is_fresh(Some(t0), t0, timeout));
        assert!(heartbeat_is_fresh(Some(t0), t0 + Duration::from_secs(10), timeout));
        assert!(!heartbeat_is_fresh(Some(t0), t0 + Duration::from_secs(11), timeout));
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_detects_missing_heartbeats() {
        let store = Arc::new(StateStore::new(StoreSettings::default()));
        let events = EventBus::new(16);
        let mut rx = events.subscribe();
        let cancel = CancellationToken::new();

        store.record_heartbeat(Instant::now()).await;

        let monitor = LivenessMonitor::new(
            Arc::clone(&store),
            events.clone(),
            DEFAULT_CHECK_INTERVAL,
            cancel.clone(),
        );
        let task = tokio::spawn(monitor.run());

        // Heartbeat at second 9 keeps the device alive past second 10
        tokio::time::sleep(Duration::from_secs(9)).await;
        store.record_heartbeat(Instant::now()).await;
        tokio::time::sleep(Duration::from_secs(7)).await;
        assert!(store.is_connected().await);

        // Silence for longer than the timeout, then one more check interval
        tokio::time::sleep(Duration::from_secs(11)).await;
        assert!(!store.is_connected().await);

        match rx.recv().await.unwrap() {
            HubEvent::DeviceConnectionChanged { connected, .. } => assert!(!connected),
            other => panic!("unexpected event {:?}", other),
        }

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("monitor should stop on cancel")
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_without_heartbeat_stays_disconnected() {
        let store = Arc::new(StateStore::new(StoreSettings::default()));
        let cancel = CancellationToken::new();
        let monitor = LivenessMonitor::new(
            Arc::clone(&store),
            EventBus::new(4),
            Duration::from_secs(5),
            cancel.clone(),
        );
        let task = tokio::spawn(monitor.run());

        tokio::time::sleep(Duration::from_secs(12)).await;
        assert!(!store.is_connected().await);

        cancel.cancel();
        task.await.unwrap();
    }
}
