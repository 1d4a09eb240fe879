//! Timestamp utilities

use chrono::{DateTime, Local, Utc};

/// Shown for `last_clap_time` before any clap has been seen
pub const NEVER: &str = "Never";

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Wall-clock time of day as shown to users, e.g. "14:03:27"
pub fn clock_string(at: DateTime<Local>) -> String {
    at.format("%H:%M:%S").to_string()
}
