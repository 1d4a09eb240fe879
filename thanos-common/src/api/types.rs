//! Shared API request/response types
//!
//! Wire shapes for the hub's HTTP surface. Field names are fixed by the web
//! dashboard and existing clients, so they are not renamed to Rust style.

use crate::events::ClapSource;
use serde::{Deserialize, Serialize};

// ========================================
// Status
// ========================================

/// One clap in the status history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClapHistoryEntry {
    /// Local wall-clock time, "HH:MM:SS"
    pub time: String,
    pub pattern: u8,
    pub source: ClapSource,
}

/// Response body for `GET /api/status`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    /// "ON" or "OFF"
    pub led_status: String,
    /// Brightness percentage (0-100)
    pub brightness: u8,
    /// Most recent clap pattern, 0 before the first clap
    pub clap_pattern: u8,
    /// "HH:MM:SS" of the most recent clap, or "Never"
    pub last_clap_time: String,
    pub mic_level: i64,
    pub esp32_connected: bool,
    /// Newest first, at most the configured history capacity
    pub clap_history: Vec<ClapHistoryEntry>,
}

// ========================================
// Control
// ========================================

/// Command names accepted by `POST /api/control`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlCommand {
    On,
    Off,
    Brightness,
}

/// Request body for `POST /api/control`
///
/// ```
/// use thanos_common::api::types::{ControlCommand, ControlRequest};
///
/// let req: ControlRequest =
///     serde_json::from_str(r#"{"command": "brightness", "brightness": 40}"#).unwrap();
/// assert_eq!(req.command, ControlCommand::Brightness);
/// assert_eq!(req.brightness, Some(40.0));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlRequest {
    pub command: ControlCommand,
    /// Required for `brightness`; percentage, clamped to 0-100
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brightness: Option<f64>,
}

/// Request body for `POST /api/clap_test`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClapTestRequest {
    #[serde(default = "default_pattern")]
    pub pattern: i64,
}

fn default_pattern() -> i64 {
    1
}

/// Generic `{status: "..."}` response used by command endpoints and errors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub status: String,
}

impl ActionResponse {
    pub fn success() -> Self {
        Self {
            status: "success".to_string(),
        }
    }

    pub fn error(message: impl std::fmt::Display) -> Self {
        Self {
            status: format!("error: {}", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clap_test_pattern_defaults_to_one() {
        let req: ClapTestRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.pattern, 1);
    }

    #[test]
    fn test_unknown_control_command_rejected() {
        let result = serde_json::from_str::<ControlRequest>(r#"{"command": "blink"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_status_response_field_names() {
        let status = StatusResponse {
            led_status: "ON".to_string(),
            brightness: 75,
            clap_pattern: 3,
            last_clap_time: "12:00:01".to_string(),
            mic_level: 0,
            esp32_connected: true,
            clap_history: vec![ClapHistoryEntry {
                time: "12:00:01".to_string(),
                pattern: 3,
                source: ClapSource::Device,
            }],
        };

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["led_status"], "ON");
        assert_eq!(json["esp32_connected"], true);
        assert_eq!(json["clap_history"][0]["source"], "device");
    }
}
