//! Clap pattern → LED command mapping
//!
//! Pure functions; the store calls [`interpret`] while it holds the state lock
//! so the "current brightness" it reads is the one the command is applied to.

use super::types::{pwm_to_percent, CommandAction, DeviceState, MAX_PERCENT, MAX_PWM};
use thanos_common::config::BrightnessMode;

/// Fastest clap interval the sensor can produce (seconds)
pub const MIN_PERIOD_SECS: f64 = 0.05;

/// Slowest interval still counted as part of one pattern (seconds)
pub const MAX_PERIOD_SECS: f64 = 0.80;

/// Interpreter tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterpreterSettings {
    /// Percentage moved by patterns 2 and 3
    pub step: u8,
    pub mode: BrightnessMode,
}

impl Default for InterpreterSettings {
    fn default() -> Self {
        Self {
            step: 25,
            mode: BrightnessMode::Step,
        }
    }
}

/// Map a clap cadence to a PWM duty value
///
/// Faster clapping gives a brighter LED. Periods are clamped to
/// [`MIN_PERIOD_SECS`, `MAX_PERIOD_SECS`] first, so anything faster is full
/// brightness and anything slower is dark.
pub fn period_to_pwm(average_period: f64) -> u16 {
    let period = average_period.clamp(MIN_PERIOD_SECS, MAX_PERIOD_SECS);
    let fraction = 1.0 - (period - MIN_PERIOD_SECS) / (MAX_PERIOD_SECS - MIN_PERIOD_SECS);
    (MAX_PWM as f64 * fraction).round().clamp(0.0, MAX_PWM as f64) as u16
}

/// Decide what a clap pattern should do given the current LED state
///
/// Returns `None` for patterns outside 1-4.
pub fn interpret(
    pattern: u8,
    average_period: Option<f64>,
    current: DeviceState,
    settings: &InterpreterSettings,
) -> Option<CommandAction> {
    let step = settings.step;

    let action = match pattern {
        1 => {
            if current.led_on {
                CommandAction::Off
            } else {
                CommandAction::On
            }
        }
        2 => CommandAction::SetBrightness(current.brightness.saturating_sub(step)),
        3 => match cadence_brightness(average_period, settings) {
            Some(percent) => CommandAction::SetBrightness(percent),
            None => CommandAction::SetBrightness(
                current.brightness.saturating_add(step).min(MAX_PERCENT),
            ),
        },
        4 => match cadence_brightness(average_period, settings) {
            Some(percent) => CommandAction::SetBrightness(percent),
            None => CommandAction::SetBrightness(MAX_PERCENT),
        },
        _ => return None,
    };

    Some(action)
}

fn cadence_brightness(average_period: Option<f64>, settings: &InterpreterSettings) -> Option<u8> {
    if settings.mode != BrightnessMode::Cadence {
        return None;
    }
    average_period
        .filter(|p| p.is_finite() && *p > 0.0)
        .map(|p| pwm_to_percent(period_to_pwm(p)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(led_on: bool, brightness: u8) -> DeviceState {
        DeviceState { led_on, brightness }
    }

    fn step_settings(step: u8) -> InterpreterSettings {
        InterpreterSettings {
            step,
            mode: BrightnessMode::Step,
        }
    }

    #[test]
    fn test_period_mapping_formula() {
        for i in 0..=75 {
            let p = MIN_PERIOD_SECS + i as f64 * 0.01;
            let expected = (255.0 * (1.0 - (p - 0.05) / 0.75)).round() as u16;
            assert_eq!(period_to_pwm(p), expected, "period {}", p);
        }
    }

    #[test]
    fn test_period_mapping_is_non_increasing() {
        let mut last = period_to_pwm(0.0);
        let mut p = 0.0;
        while p < 1.2 {
            let pwm = period_to_pwm(p);
            assert!(pwm <= last, "brightness rose at period {}", p);
            last = pwm;
            p += 0.005;
        }
    }

    #[test]
    fn test_period_mapping_outside_window() {
        assert_eq!(period_to_pwm(0.01), 255);
        assert_eq!(period_to_pwm(-3.0), 255);
        assert_eq!(period_to_pwm(0.05), 255);
        assert_eq!(period_to_pwm(0.80), 0);
        assert_eq!(period_to_pwm(2.5), 0);
    }

    #[test]
    fn test_toggle_is_an_involution() {
        let settings = InterpreterSettings::default();
        for start in [state(false, 0), state(true, 100), state(true, 40)] {
            let once = start.after(interpret(1, None, start, &settings).unwrap());
            assert_ne!(once.led_on, start.led_on);
            let twice = once.after(interpret(1, None, once, &settings).unwrap());
            assert_eq!(twice.led_on, start.led_on);
        }
    }

    #[test]
    fn test_dim_and_brighten_stay_in_range() {
        let settings = step_settings(25);
        for brightness in 0..=100u8 {
            let current = state(brightness > 0, brightness);
            match interpret(2, None, current, &settings) {
                Some(CommandAction::SetBrightness(v)) => {
                    assert_eq!(v, brightness.saturating_sub(25));
                }
                other => panic!("unexpected {:?}", other),
            }
            match interpret(3, None, current, &settings) {
                Some(CommandAction::SetBrightness(v)) => {
                    assert!(v <= 100);
                    assert_eq!(v, (brightness + 25).min(100));
                }
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn test_step_size_is_configurable() {
        let current = state(true, 60);
        assert_eq!(
            interpret(2, None, current, &step_settings(50)),
            Some(CommandAction::SetBrightness(10))
        );
        assert_eq!(
            interpret(3, None, current, &step_settings(50)),
            Some(CommandAction::SetBrightness(100))
        );
    }

    #[test]
    fn test_pattern_four_is_maximum() {
        let settings = InterpreterSettings::default();
        assert_eq!(
            interpret(4, Some(0.7), state(false, 0), &settings),
            Some(CommandAction::SetBrightness(100))
        );
    }

    #[test]
    fn test_unknown_patterns_produce_nothing() {
        let settings = InterpreterSettings::default();
        assert_eq!(interpret(0, None, state(false, 0), &settings), None);
        assert_eq!(interpret(5, None, state(true, 100), &settings), None);
    }

    #[test]
    fn test_cadence_mode_uses_period() {
        let settings = InterpreterSettings {
            step: 25,
            mode: BrightnessMode::Cadence,
        };
        let current = state(true, 50);

        // 0.425s is the middle of the window → 128/255 → 50%
        assert_eq!(
            interpret(3, Some(0.425), current, &settings),
            Some(CommandAction::SetBrightness(50))
        );
        assert_eq!(
            interpret(4, Some(0.05), current, &settings),
            Some(CommandAction::SetBrightness(100))
        );

        // No period reported: fall back to steps
        assert_eq!(
            interpret(3, None, current, &settings),
            Some(CommandAction::SetBrightness(75))
        );
        assert_eq!(
            interpret(4, Some(0.0), current, &settings),
            Some(CommandAction::SetBrightness(100))
        );

        // Toggle and dim ignore the cadence
        assert_eq!(interpret(1, Some(0.1), current, &settings), Some(CommandAction::Off));
        assert_eq!(
            interpret(2, Some(0.1), current, &settings),
            Some(CommandAction::SetBrightness(25))
        );
    }
}
