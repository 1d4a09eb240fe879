//! Hub configuration: TOML file plus command-line overrides
//!
//! File resolution and schema live in `thanos_common::config`. This module
//! layers the few settings that may be overridden per launch (broker address
//! and HTTP port) on top of whatever the file produced.

use crate::controller::StoreSettings;
use crate::error::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;
use thanos_common::config::{ConfigFileResolver, TomlConfig};
use tracing::info;

/// Values taken from CLI flags or their environment fallbacks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub mqtt_host: Option<String>,
    pub mqtt_port: Option<u16>,
    pub http_port: Option<u16>,
}

impl CliOverrides {
    /// Overwrite file values with whatever was given on the command line
    pub fn apply(&self, config: &mut TomlConfig) {
        if let Some(host) = &self.mqtt_host {
            config.mqtt.host = host.clone();
        }
        if let Some(port) = self.mqtt_port {
            config.mqtt.port = port;
        }
        if let Some(port) = self.http_port {
            config.http.port = port;
        }
    }
}

/// Fully resolved hub configuration
#[derive(Debug, Clone)]
pub struct HubConfig {
    pub file: TomlConfig,
    /// Where `file` came from, `None` when compiled defaults are in use
    pub source: Option<PathBuf>,
}

impl HubConfig {
    /// Resolve the config file, load it and apply CLI overrides
    pub fn load(overrides: &CliOverrides) -> Result<Self> {
        let resolver = ConfigFileResolver::new(overrides.config_path.clone());
        let source = resolver.resolve().filter(|p| p.exists());
        let mut file = resolver.load()?;

        overrides.apply(&mut file);
        // Overrides can invalidate an otherwise valid file (e.g. port 0)
        file.validate()?;
        if file.http.port == 0 || file.mqtt.port == 0 {
            return Err(Error::Config("ports must be non-zero".to_string()));
        }

        Ok(Self { file, source })
    }

    pub fn store_settings(&self) -> StoreSettings {
        StoreSettings::from(&self.file.controller)
    }

    pub fn liveness_interval(&self) -> Duration {
        Duration::from_secs(self.file.controller.liveness_interval_secs)
    }

    /// Log the effective settings at startup
    pub fn log_summary(&self) {
        match &self.source {
            Some(path) => info!("Config file: {}", path.display()),
            None => info!("Config file: none, using defaults"),
        }
        info!(
            "MQTT broker {}:{}, HTTP {}:{}",
            self.file.mqtt.host, self.file.mqtt.port, self.file.http.bind_address, self.file.http.port
        );
        info!(
            "Brightness step {}% ({:?} mode), echo cooldown {}ms, heartbeat timeout {}s",
            self.file.controller.brightness_step,
            self.file.controller.brightness_mode,
            self.file.controller.echo_cooldown_ms,
            self.file.controller.heartbeat_timeout_secs
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_overrides_replace_file_values() {
        let mut config = TomlConfig::from_toml_str(
            r#"
            [mqtt]
            host = "broker.lan"
            port = 1883

            [http]
            port = 5000
            "#,
        )
        .unwrap();

        let overrides = CliOverrides {
            mqtt_host: Some("192.168.51.183".to_string()),
            http_port: Some(8080),
            ..CliOverrides::default()
        };
        overrides.apply(&mut config);

        assert_eq!(config.mqtt.host, "192.168.51.183");
        assert_eq!(config.mqtt.port, 1883);
        assert_eq!(config.http.port, 8080);
    }

    #[test]
    fn test_load_explicit_file_with_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[controller]\nbrightness_step = 50\necho_cooldown_ms = 250").unwrap();

        let overrides = CliOverrides {
            config_path: Some(file.path().to_path_buf()),
            mqtt_port: Some(1884),
            ..CliOverrides::default()
        };
        let config = HubConfig::load(&overrides).unwrap();

        assert_eq!(config.source.as_deref(), Some(file.path()));
        assert_eq!(config.file.mqtt.port, 1884);

        let settings = config.store_settings();
        assert_eq!(settings.interpreter.step, 50);
        assert_eq!(settings.echo_cooldown, Duration::from_millis(250));
    }

    #[test]
    fn test_zero_port_override_rejected() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let overrides = CliOverrides {
            config_path: Some(file.path().to_path_buf()),
            http_port: Some(0),
            ..CliOverrides::default()
        };
        assert!(matches!(HubConfig::load(&overrides), Err(Error::Config(_))));
    }
}
