//! # Taskpulse - task timers with live change feeds
//!
//! A command-line utility and library for tracking time spent on tasks.
//!
//! ## Features
//!
//! - **Task Timers**: start, pause, resume and stop with persisted elapsed time
//! - **Change Events**: one store subscription per table, fanned out to listeners
//! - **Connectivity**: periodic probing and backoff-limited reconnection
//! - **Storage**: local SQLite store or a PostgREST-style HTTP backend
//!
//! ## Usage
//!
//! ```rust,no_run
//! use taskpulse::commands::Cli;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Cli::menu().await
//! }
//! ```

pub mod api;
pub mod commands;
pub mod db;
pub mod libs;
