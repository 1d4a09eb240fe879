//! Configuration loading and config file resolution
//!
//! Every field in the TOML schema is optional. A missing config file is not an
//! error: the service logs a warning and starts with compiled defaults. A file
//! that exists but cannot be parsed is an error.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "THANOS_CONFIG";

/// How clap patterns 3 and 4 pick a brightness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BrightnessMode {
    /// Fixed steps: 2 dims, 3 brightens, 4 goes to maximum
    #[default]
    Step,
    /// Patterns 3 and 4 derive brightness from the clap cadence when the
    /// sensor reports an average period
    Cadence,
}

/// MQTT topic names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicConfig {
    /// Clap pattern events (device → hub)
    pub clap: String,
    /// LED status feedback (device → hub)
    pub led_status: String,
    /// Periodic heartbeat (device → hub)
    pub heartbeat: String,
    /// Retained presence / last-will channel (device → hub)
    pub system: String,
    /// LED commands (hub → device)
    pub led_control: String,
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            clap: "thanos/clap".to_string(),
            led_status: "thanos/led/status".to_string(),
            heartbeat: "thanos/heartbeat".to_string(),
            system: "thanos/system/esp32".to_string(),
            led_control: "thanos/led/control".to_string(),
        }
    }
}

impl TopicConfig {
    /// Topics the hub subscribes to
    pub fn inbound(&self) -> [&str; 4] {
        [
            self.clap.as_str(),
            self.led_status.as_str(),
            self.heartbeat.as_str(),
            self.system.as_str(),
        ]
    }
}

/// `[mqtt]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    /// Client id; a random one is generated when unset
    pub client_id: Option<String>,
    pub keep_alive_secs: u64,
    /// Delay before polling the event loop again after a connection error
    pub reconnect_delay_ms: u64,
    pub topics: TopicConfig,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            client_id: None,
            keep_alive_secs: 30,
            reconnect_delay_ms: 2000,
            topics: TopicConfig::default(),
        }
    }
}

/// `[http]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind_address: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

/// `[controller]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Brightness percentage added/removed by patterns 3/2
    pub brightness_step: u8,
    pub brightness_mode: BrightnessMode,
    /// Window after a local command during which device feedback is ignored
    pub echo_cooldown_ms: u64,
    /// How often the liveness monitor checks heartbeat recency
    pub liveness_interval_secs: u64,
    /// Heartbeat age after which the device counts as disconnected
    pub heartbeat_timeout_secs: u64,
    /// Number of clap events kept in the history ring
    pub history_capacity: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            brightness_step: 25,
            brightness_mode: BrightnessMode::Step,
            echo_cooldown_ms: 500,
            liveness_interval_secs: 5,
            heartbeat_timeout_secs: 10,
            history_capacity: 10,
        }
    }
}

/// `[logging]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is not set
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Full TOML config file schema
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub mqtt: MqttConfig,
    pub http: HttpConfig,
    pub controller: ControllerConfig,
    pub logging: LoggingConfig,
}

impl TomlConfig {
    /// Parse config from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Read and parse a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Reject values the controller cannot run with
    pub fn validate(&self) -> Result<()> {
        let c = &self.controller;
        if c.brightness_step == 0 || c.brightness_step > 100 {
            return Err(Error::Config(format!(
                "controller.brightness_step must be 1-100, got {}",
                c.brightness_step
            )));
        }
        if c.history_capacity == 0 {
            return Err(Error::Config(
                "controller.history_capacity must be at least 1".to_string(),
            ));
        }
        if c.liveness_interval_secs == 0 || c.heartbeat_timeout_secs == 0 {
            return Err(Error::Config(
                "controller liveness interval and heartbeat timeout must be non-zero".to_string(),
            ));
        }
        if self.mqtt.keep_alive_secs == 0 {
            return Err(Error::Config("mqtt.keep_alive_secs must be non-zero".to_string()));
        }

        let inbound = self.mqtt.topics.inbound();
        for (i, topic) in inbound.iter().enumerate() {
            if topic.is_empty() {
                return Err(Error::Config("mqtt topic names must not be empty".to_string()));
            }
            if inbound[i + 1..].contains(topic) {
                return Err(Error::Config(format!(
                    "mqtt topic '{}' is configured for more than one inbound channel",
                    topic
                )));
            }
        }
        if self.mqtt.topics.led_control.is_empty() {
            return Err(Error::Config("mqtt.topics.led_control must not be empty".to_string()));
        }

        Ok(())
    }
}

/// Config file resolution following priority order:
/// 1. Command-line argument (highest priority)
/// 2. `THANOS_CONFIG` environment variable
/// 3. User config directory (`~/.config/thanos/config.toml`)
/// 4. System config (`/etc/thanos/config.toml`, Linux only)
pub struct ConfigFileResolver {
    cli_path: Option<PathBuf>,
}

impl ConfigFileResolver {
    pub fn new(cli_path: Option<PathBuf>) -> Self {
        Self { cli_path }
    }

    /// Find the config file to load, or None when compiled defaults apply
    ///
    /// Explicit paths (CLI, env) are returned even when the file does not
    /// exist so the caller can warn about them.
    pub fn resolve(&self) -> Option<PathBuf> {
        if let Some(path) = &self.cli_path {
            return Some(path.clone());
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        if let Some(user_config) = dirs::config_dir().map(|d| d.join("thanos").join("config.toml")) {
            if user_config.exists() {
                return Some(user_config);
            }
        }

        if cfg!(target_os = "linux") {
            let system_config = PathBuf::from("/etc/thanos/config.toml");
            if system_config.exists() {
                return Some(system_config);
            }
        }

        None
    }

    /// Resolve, load and validate the config
    ///
    /// Missing file → warning + defaults. Unreadable or invalid file → error.
    pub fn load(&self) -> Result<TomlConfig> {
        let config = match self.resolve() {
            Some(path) if path.exists() => {
                info!("Loading config from {}", path.display());
                TomlConfig::from_file(&path)?
            }
            Some(path) => {
                warn!(
                    "Config file {} not found, using compiled defaults",
                    path.display()
                );
                TomlConfig::default()
            }
            None => {
                info!("No config file found, using compiled defaults");
                TomlConfig::default()
            }
        };

        config.validate()?;
        Ok(config)
    }
}
