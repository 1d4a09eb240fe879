//! Domain types shared by the controller components

use chrono::{DateTime, Local};
use thanos_common::events::ClapSource;
use tokio::time::Instant;

/// Highest brightness percentage
pub const MAX_PERCENT: u8 = 100;

/// Highest PWM duty value understood by the actuator firmware
pub const MAX_PWM: u16 = 255;

/// Convert a brightness percentage (0-100) to the actuator's 0-255 range
pub fn percent_to_pwm(percent: u8) -> u16 {
    let percent = percent.min(MAX_PERCENT) as f64;
    (percent / 100.0 * MAX_PWM as f64).round() as u16
}

/// Convert a 0-255 duty value reported by the device to a percentage
pub fn pwm_to_percent(pwm: u16) -> u8 {
    let pwm = pwm.min(MAX_PWM) as f64;
    (pwm / MAX_PWM as f64 * 100.0).round() as u8
}

/// Clamp an arbitrary integer percentage into 0-100
pub fn clamp_percent(value: i64) -> u8 {
    value.clamp(0, MAX_PERCENT as i64) as u8
}

/// LED state as the controller believes it to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceState {
    pub led_on: bool,
    /// Percentage, 0-100
    pub brightness: u8,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            led_on: false,
            brightness: 0,
        }
    }
}

impl DeviceState {
    /// State after the actuator executes `action`
    ///
    /// ON without a value means full brightness; a brightness command turns
    /// the LED on exactly when the value is non-zero.
    pub fn after(self, action: CommandAction) -> Self {
        match action {
            CommandAction::On => Self {
                led_on: true,
                brightness: MAX_PERCENT,
            },
            CommandAction::Off => Self {
                led_on: false,
                brightness: 0,
            },
            CommandAction::SetBrightness(value) => {
                let brightness = value.min(MAX_PERCENT);
                Self {
                    led_on: brightness > 0,
                    brightness,
                }
            }
        }
    }

    /// "ON"/"OFF" as shown in the status API
    pub fn led_status(&self) -> &'static str {
        if self.led_on {
            "ON"
        } else {
            "OFF"
        }
    }
}

/// What the actuator should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandAction {
    On,
    Off,
    /// Brightness percentage, 0-100
    SetBrightness(u8),
}

impl CommandAction {
    /// Brightness command from an unchecked percentage, clamped to 0-100
    pub fn brightness(percent: i64) -> Self {
        CommandAction::SetBrightness(clamp_percent(percent))
    }

    /// Outbound wire form: `ON`, `OFF` or `BRIGHTNESS:<0-255>`
    pub fn to_payload(&self) -> String {
        match self {
            CommandAction::On => "ON".to_string(),
            CommandAction::Off => "OFF".to_string(),
            CommandAction::SetBrightness(percent) => {
                format!("BRIGHTNESS:{}", percent_to_pwm(*percent))
            }
        }
    }
}

impl std::fmt::Display for CommandAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandAction::On => write!(f, "ON"),
            CommandAction::Off => write!(f, "OFF"),
            CommandAction::SetBrightness(percent) => write!(f, "BRIGHTNESS {}%", percent),
        }
    }
}

/// Who a state change came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOrigin {
    /// Reported by the device on the status topic
    DeviceFeedback,
    /// Issued by this controller (clap or API)
    Local,
}

/// A state change together with its origin and time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandIntent {
    pub action: CommandAction,
    pub issued_by: CommandOrigin,
    pub issued_at: Instant,
}

impl CommandIntent {
    pub fn local(action: CommandAction, issued_at: Instant) -> Self {
        Self {
            action,
            issued_by: CommandOrigin::Local,
            issued_at,
        }
    }

    pub fn feedback(action: CommandAction, issued_at: Instant) -> Self {
        Self {
            action,
            issued_by: CommandOrigin::DeviceFeedback,
            issued_at,
        }
    }
}

/// LED state reported by the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceFeedback {
    pub action: CommandAction,
    /// Payload as received, for logs and events
    pub raw: String,
}

/// A decoded clap pattern
#[derive(Debug, Clone, PartialEq)]
pub struct ClapEvent {
    /// Always 1-4; anything else is rejected before a ClapEvent exists
    pub pattern: u8,
    /// Mean interval between claps in seconds, if the sensor reported it
    pub average_period: Option<f64>,
    pub mic_level: Option<i64>,
    pub source: ClapSource,
    pub observed_at: DateTime<Local>,
}

/// Lowest and highest accepted clap pattern
pub const PATTERN_RANGE: std::ops::RangeInclusive<i64> = 1..=4;

impl ClapEvent {
    /// Build an event, rejecting patterns outside 1-4
    pub fn new(
        pattern: i64,
        source: ClapSource,
        observed_at: DateTime<Local>,
    ) -> Option<Self> {
        if !PATTERN_RANGE.contains(&pattern) {
            return None;
        }
        Some(Self {
            pattern: pattern as u8,
            average_period: None,
            mic_level: None,
            source,
            observed_at,
        })
    }

    pub fn with_average_period(mut self, average_period: Option<f64>) -> Self {
        self.average_period = average_period;
        self
    }

    pub fn with_mic_level(mut self, mic_level: Option<i64>) -> Self {
        self.mic_level = mic_level;
        self
    }
}
