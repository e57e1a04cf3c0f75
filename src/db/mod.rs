//! Storage layer for taskpulse.
//!
//! The synchronization core never talks to SQLite or HTTP directly; it uses
//! the capabilities declared in [`store`]. This module provides the local
//! SQLite implementation of those capabilities plus typed task access.
//!
//! ```rust
//! use std::sync::Arc;
//! use taskpulse::db::{local::LocalStore, tasks::Tasks};
//! use taskpulse::libs::task::NewTask;
//!
//! let store = Arc::new(LocalStore::in_memory()?);
//! let tasks = Tasks::new(store);
//! let task = tasks.insert(&NewTask::new("Book photographer", "", Some("u-1")))?;
//! assert_eq!(task.timer.elapsed_time, 0);
//! # Ok::<(), anyhow::Error>(())
//! ```

/// SQLite connection setup.
pub mod db;

/// JSON-record store over SQLite with an in-process change feed.
pub mod local;

/// Versioned schema changes.
pub mod migrations;

/// Store capabilities consumed by the synchronization core.
pub mod store;

/// Typed task repository.
pub mod tasks;
