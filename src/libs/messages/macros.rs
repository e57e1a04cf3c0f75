//! Output macros for user-facing messages.
//!
//! Every macro takes anything implementing `Display` (usually a
//! [`Message`](super::Message)) and routes it to one of two sinks:
//!
//! - **Normal mode**: `println!`/`eprintln!` with an emoji prefix
//! - **Debug mode**: the matching `tracing` macro, so output is structured
//!   and filtered by the subscriber installed in `main`
//!
//! Debug mode is on when `TASKPULSE_DEBUG` or `RUST_LOG` is set. The check
//! runs once per process.
//!
//! | Macro               | Prefix | Normal sink | Debug sink         |
//! |---------------------|--------|-------------|--------------------|
//! | `msg_print!`        |        | stdout      | `tracing::info!`   |
//! | `msg_success!`      | ✅     | stdout      | `tracing::info!`   |
//! | `msg_info!`         | ℹ️     | stdout      | `tracing::info!`   |
//! | `msg_warning!`      | ⚠️     | stdout      | `tracing::warn!`   |
//! | `msg_error!`        | ❌     | stderr      | `tracing::error!`  |
//! | `msg_debug!`        | 🔍     | (dropped)   | `tracing::debug!`  |
//!
//! `msg_error_anyhow!` and `msg_bail_anyhow!` build an `anyhow::Error`
//! from a message instead of printing it.
//!
//! ```rust
//! use taskpulse::libs::messages::Message;
//! use taskpulse::{msg_debug, msg_success};
//!
//! msg_success!(Message::TaskCreated(1, "Review".to_string()));
//! msg_debug!(Message::TimerOperationSkipped("pause".to_string(), 1));
//! ```

use std::sync::OnceLock;

static DEBUG_MODE: OnceLock<bool> = OnceLock::new();

#[doc(hidden)]
pub fn is_debug_mode() -> bool {
    *DEBUG_MODE.get_or_init(|| std::env::var("TASKPULSE_DEBUG").is_ok() || std::env::var("RUST_LOG").is_ok())
}

/// Prints a plain message; `true` as second argument pads it with blank lines.
#[macro_export]
macro_rules! msg_print {
    ($msg:expr) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::info!("{}", $msg);
        } else {
            println!("{}", $msg);
        }
    };
    ($msg:expr, true) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::info!("\n{}\n", $msg);
        } else {
            println!("\n{}\n", $msg);
        }
    };
}

#[macro_export]
macro_rules! msg_success {
    ($msg:expr) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::info!("✅ {}", $msg);
        } else {
            println!("✅ {}", $msg);
        }
    };
    ($msg:expr, true) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::info!("\n✅ {}\n", $msg);
        } else {
            println!("\n✅ {}\n", $msg);
        }
    };
}

/// Errors always go to stderr in normal mode.
#[macro_export]
macro_rules! msg_error {
    ($msg:expr) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::error!("❌ {}", $msg);
        } else {
            eprintln!("❌ {}", $msg);
        }
    };
    ($msg:expr, true) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::error!("\n❌ {}\n", $msg);
        } else {
            eprintln!("\n❌ {}\n", $msg);
        }
    };
}

#[macro_export]
macro_rules! msg_warning {
    ($msg:expr) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::warn!("⚠️  {}", $msg);
        } else {
            println!("⚠️  {}", $msg);
        }
    };
    ($msg:expr, true) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::warn!("\n⚠️  {}\n", $msg);
        } else {
            println!("\n⚠️  {}\n", $msg);
        }
    };
}

#[macro_export]
macro_rules! msg_info {
    ($msg:expr) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::info!("ℹ️  {}", $msg);
        } else {
            println!("ℹ️  {}", $msg);
        }
    };
    ($msg:expr, true) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::info!("\nℹ️  {}\n", $msg);
        } else {
            println!("\nℹ️  {}\n", $msg);
        }
    };
}

/// Internal diagnostics. Silent unless debug mode is on.
#[macro_export]
macro_rules! msg_debug {
    ($msg:expr) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::debug!("🔍 {}", $msg);
        }
    };
}

#[macro_export]
macro_rules! msg_error_anyhow {
    ($msg:expr) => {
        anyhow::anyhow!("❌ {}", $msg)
    };
}

#[macro_export]
macro_rules! msg_bail_anyhow {
    ($msg:expr) => {
        anyhow::bail!("❌ {}", $msg)
    };
}
