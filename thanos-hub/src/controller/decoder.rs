//! Inbound MQTT payload decoding
//!
//! Turns `(topic, payload)` pairs into typed events. Decoding never fails from
//! the caller's point of view: anything that does not parse becomes
//! [`InboundEvent::Unrecognized`] carrying the reason, which the caller logs
//! before dropping the message.

use super::types::{pwm_to_percent, ClapEvent, CommandAction, DeviceFeedback, MAX_PWM};
use chrono::{DateTime, Local};
use serde::Deserialize;
use thanos_common::config::TopicConfig;
use thanos_common::events::ClapSource;
use thiserror::Error;

/// Why a message was dropped
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("payload is not valid UTF-8")]
    NotUtf8,

    #[error("invalid clap payload: {0}")]
    InvalidPayload(String),

    #[error("clap payload has no pattern")]
    MissingPattern,

    #[error("unknown clap pattern {0}")]
    UnknownPattern(i64),

    #[error("unrecognized literal '{0}'")]
    UnknownLiteral(String),

    #[error("no handler for topic '{0}'")]
    UnknownTopic(String),
}

/// A decoded inbound message
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    Clap(ClapEvent),
    Heartbeat,
    Feedback(DeviceFeedback),
    /// The device announced it is going away (retained last-will)
    DeviceOffline,
    Unrecognized(DecodeError),
}

/// Clap payload as published by the sensor
///
/// `Option` fields accept both an absent key and `null`; a present value of
/// the wrong type fails deserialization instead of silently defaulting.
#[derive(Debug, Deserialize)]
struct ClapPayload {
    #[serde(default)]
    pattern: Option<i64>,
    #[serde(default)]
    average_period: Option<f64>,
    #[serde(default)]
    mic_level: Option<i64>,
}

/// Decode one message received on `topic`
pub fn decode(
    topics: &TopicConfig,
    topic: &str,
    payload: &[u8],
    observed_at: DateTime<Local>,
) -> InboundEvent {
    if topic == topics.heartbeat {
        return InboundEvent::Heartbeat;
    }

    let result = if topic == topics.clap {
        decode_clap(payload, observed_at).map(InboundEvent::Clap)
    } else if topic == topics.led_status {
        decode_feedback(payload).map(InboundEvent::Feedback)
    } else if topic == topics.system {
        decode_presence(payload)
    } else {
        Err(DecodeError::UnknownTopic(topic.to_string()))
    };

    result.unwrap_or_else(InboundEvent::Unrecognized)
}

fn decode_clap(payload: &[u8], observed_at: DateTime<Local>) -> Result<ClapEvent, DecodeError> {
    let value: serde_json::Value = serde_json::from_slice(payload)
        .map_err(|e| DecodeError::InvalidPayload(e.to_string()))?;
    // serde would happily map a JSON array onto the struct positionally
    if !value.is_object() {
        return Err(DecodeError::InvalidPayload("expected a JSON object".to_string()));
    }
    let parsed = ClapPayload::deserialize(value)
        .map_err(|e| DecodeError::InvalidPayload(e.to_string()))?;

    let pattern = parsed.pattern.ok_or(DecodeError::MissingPattern)?;
    let event = ClapEvent::new(pattern, ClapSource::Device, observed_at)
        .ok_or(DecodeError::UnknownPattern(pattern))?;
    Ok(event
        .with_average_period(parsed.average_period)
        .with_mic_level(parsed.mic_level))
}

fn text(payload: &[u8]) -> Result<&str, DecodeError> {
    std::str::from_utf8(payload)
        .map(str::trim)
        .map_err(|_| DecodeError::NotUtf8)
}

fn decode_feedback(payload: &[u8]) -> Result<DeviceFeedback, DecodeError> {
    let raw = text(payload)?;

    let action = match raw {
        "ON" => CommandAction::On,
        "OFF" => CommandAction::Off,
        other => {
            let value = other
                .strip_prefix("BRIGHTNESS:")
                .and_then(|v| v.trim().parse::<i64>().ok())
                .ok_or_else(|| DecodeError::UnknownLiteral(other.to_string()))?;
            // Out-of-range duty values are clamped, not rejected
            let pwm = value.clamp(0, MAX_PWM as i64) as u16;
            CommandAction::SetBrightness(pwm_to_percent(pwm))
        }
    };

    Ok(DeviceFeedback {
        action,
        raw: raw.to_string(),
    })
}

fn decode_presence(payload: &[u8]) -> Result<InboundEvent, DecodeError> {
    match text(payload)? {
        "online" => Ok(InboundEvent::Heartbeat),
        "offline" => Ok(InboundEvent::DeviceOffline),
        other => Err(DecodeError::UnknownLiteral(other.to_string())),
    }
}
