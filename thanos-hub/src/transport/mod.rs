//! Outbound command delivery and the MQTT adapter
//!
//! The controller only knows the [`CommandSink`] trait. Production wires in
//! [`mqtt::MqttCommandSink`]; tests and broker-less runs use [`ChannelSink`].

pub mod mqtt;

use crate::controller::CommandAction;
use crate::error::{Error, Result};
use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

/// Delivers LED commands to the actuator
#[async_trait]
pub trait CommandSink: Send + Sync {
    /// Send one command; the wire form is [`CommandAction::to_payload`]
    async fn send_command(&self, action: CommandAction) -> Result<()>;
}

/// Sink that forwards wire payloads into an in-process channel
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelSink {
    /// Create a sink and the receiver that observes what it sends
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl CommandSink for ChannelSink {
    async fn send_command(&self, action: CommandAction) -> Result<()> {
        let payload = action.to_payload();
        debug!("Channel sink: {}", payload);
        self.tx
            .send(payload)
            .map_err(|_| Error::Transport("command channel closed".to_string()))
    }
}
