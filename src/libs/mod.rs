//! Core library modules for taskpulse.
//!
//! - **Tasks and timers**: task model, the pure timer state machine and the
//!   store-backed timer operations with per-task processing guard
//! - **Realtime**: change-event registry multiplexing store subscriptions
//! - **Connectivity**: probe-driven connection monitor with bounded reconnects
//! - **Infrastructure**: configuration, data directory, messaging, clock
//! - **Terminal**: table view and duration formatting
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use taskpulse::db::local::LocalStore;
//! use taskpulse::db::tasks::Tasks;
//! use taskpulse::libs::task::NewTask;
//! use taskpulse::libs::task_timer::TaskTimers;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let store = Arc::new(LocalStore::open()?);
//! let task = Tasks::new(store.clone()).insert(&NewTask::new("Review", "", None))?;
//! TaskTimers::new(store).start_timer(&task).await?;
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod config;
pub mod connection;
pub mod data_storage;
pub mod formatter;
pub mod guard;
pub mod messages;
pub mod realtime;
pub mod shutdown;
pub mod task;
pub mod task_timer;
pub mod timer;
pub mod view;
