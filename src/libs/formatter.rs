//! Duration formatting for terminal output.
//!
//! Elapsed timer values are milliseconds; they are shown as `HH:MM:SS`
//! with hours allowed to grow past two digits.
//!
//! ```rust
//! use taskpulse::libs::formatter::format_elapsed;
//!
//! assert_eq!(format_elapsed(7_000), "00:00:07");
//! assert_eq!(format_elapsed(3_725_999), "01:02:05");
//! ```

pub fn format_elapsed(millis: u64) -> String {
    let total_seconds = millis / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}
