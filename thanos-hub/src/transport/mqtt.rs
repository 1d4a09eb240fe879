//! MQTT connection to the sensor/actuator device
//!
//! One task owns the rumqttc event loop: it re-subscribes on every ConnAck
//! and hands each publish to [`Controller::handle_inbound`]. Requests to the
//! client use the non-blocking `try_*` calls because the same task is the one
//! draining the request queue.

use super::CommandSink;
use crate::controller::{CommandAction, Controller};
use crate::error::Result;
use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use std::sync::Arc;
use std::time::Duration;
use thanos_common::config::MqttConfig;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Capacity of the client → event loop request queue
const REQUEST_CHANNEL_CAPACITY: usize = 20;

/// Build client options from config
///
/// Without a configured client id a random suffix is used so two hubs on one
/// broker do not keep disconnecting each other.
pub fn mqtt_options(config: &MqttConfig) -> MqttOptions {
    let client_id = config.client_id.clone().unwrap_or_else(|| {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        format!("thanos-hub-{}", &suffix[..8])
    });

    let mut options = MqttOptions::new(client_id, config.host.clone(), config.port);
    options.set_keep_alive(Duration::from_secs(config.keep_alive_secs.max(1)));
    options.set_clean_session(true);
    options
}

/// Create the client and its (not yet polled) event loop
pub fn connect(config: &MqttConfig) -> (AsyncClient, EventLoop) {
    AsyncClient::new(mqtt_options(config), REQUEST_CHANNEL_CAPACITY)
}

/// Publishes commands on the LED control topic
pub struct MqttCommandSink {
    client: AsyncClient,
    topic: String,
}

impl MqttCommandSink {
    pub fn new(client: AsyncClient, topic: impl Into<String>) -> Self {
        Self {
            client,
            topic: topic.into(),
        }
    }
}

#[async_trait]
impl CommandSink for MqttCommandSink {
    async fn send_command(&self, action: CommandAction) -> Result<()> {
        let payload = action.to_payload();
        self.client
            .try_publish(self.topic.as_str(), QoS::AtLeastOnce, false, payload.clone())?;
        info!(topic = %self.topic, "Sent → {}", payload);
        Ok(())
    }
}

/// Inbound side: drives the event loop until cancelled
pub struct InboundLoop {
    client: AsyncClient,
    eventloop: EventLoop,
    controller: Arc<Controller>,
    subscriptions: Vec<String>,
    reconnect_delay: Duration,
    cancel: CancellationToken,
}

impl InboundLoop {
    pub fn new(
        client: AsyncClient,
        eventloop: EventLoop,
        controller: Arc<Controller>,
        config: &MqttConfig,
        cancel: CancellationToken,
    ) -> Self {
        let subscriptions = config
            .topics
            .inbound()
            .iter()
            .map(|t| t.to_string())
            .collect();

        Self {
            client,
            eventloop,
            controller,
            subscriptions,
            reconnect_delay: Duration::from_millis(config.reconnect_delay_ms),
            cancel,
        }
    }

    fn subscribe_all(&self) {
        for topic in &self.subscriptions {
            match self.client.try_subscribe(topic.as_str(), QoS::AtLeastOnce) {
                Ok(()) => info!("Subscribed to: {}", topic),
                Err(e) => error!("Subscribe to {} failed: {}", topic, e),
            }
        }
    }

    /// Run until the cancellation token fires
    pub async fn run(mut self) {
        info!("MQTT inbound loop started");

        loop {
            let event = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                event = self.eventloop.poll() => event,
            };

            match event {
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    debug!(topic = %publish.topic, bytes = publish.payload.len(), "MQTT message");
                    self.controller
                        .handle_inbound(&publish.topic, &publish.payload)
                        .await;
                }
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    info!("Connected to MQTT broker ({:?})", ack.code);
                    // Broker may have dropped our session; subscribe on every connect
                    self.subscribe_all();
                }
                Ok(Event::Incoming(Packet::Disconnect)) => {
                    warn!("MQTT broker sent disconnect");
                }
                Ok(_) => {}
                Err(e) => {
                    error!(
                        "MQTT connection error: {}, retrying in {}ms",
                        e,
                        self.reconnect_delay.as_millis()
                    );
                    tokio::select! {
                        _ = self.cancel.cancelled() => break,
                        _ = tokio::time::sleep(self.reconnect_delay) => {}
                    }
                }
            }
        }

        if let Err(e) = self.client.try_disconnect() {
            debug!("MQTT disconnect request failed: {}", e);
        }
        info!("MQTT inbound loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_use_configured_broker() {
        let config = MqttConfig {
            host: "192.168.51.183".to_string(),
            port: 1884,
            client_id: Some("Web_Interface".to_string()),
            keep_alive_secs: 60,
            ..MqttConfig::default()
        };

        let options = mqtt_options(&config);
        assert_eq!(options.broker_address(), ("192.168.51.183".to_string(), 1884));
        assert_eq!(options.client_id(), "Web_Interface");
        assert_eq!(options.keep_alive(), Duration::from_secs(60));
    }

    #[test]
    fn test_generated_client_ids_are_distinct() {
        let config = MqttConfig::default();
        let a = mqtt_options(&config).client_id();
        let b = mqtt_options(&config).client_id();

        assert!(a.starts_with("thanos-hub-"));
        assert_eq!(a.len(), "thanos-hub-".len() + 8);
        assert_ne!(a, b);
    }
}
