//! Capabilities the synchronization core consumes from a data store.
//!
//! A store is anything that can answer a cheap health probe, push per-table
//! change notifications, and apply a partial update to a row. The local
//! SQLite store ([`crate::db::local::LocalStore`]) implements all three; the
//! hosted REST backend ([`crate::api::rest::RestStore`]) implements the probe
//! and the persist side.
//!
//! The traits are object safe so consumers can hold `Arc<dyn Probe>` and
//! friends without knowing which backend sits behind them.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;

/// A single row as a JSON object keyed by column name.
pub type Record = Map<String, Value>;

/// Change notification as delivered by a store's change feed.
///
/// `event_type` is the wire spelling (`"INSERT"`, `"UPDATE"`, `"DELETE"`).
/// Hosted feeds send `{}` rather than omitting an absent side, so an empty
/// object is possible in either record slot.
#[derive(Debug, Clone, PartialEq)]
pub struct RawChange {
    pub event_type: String,
    pub new: Option<Record>,
    pub old: Option<Record>,
}

/// Callback a change feed invokes for every change on the subscribed table.
pub type RawChangeCallback = Box<dyn Fn(RawChange) + Send + Sync>;

/// Opaque handle identifying one underlying change-feed subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(pub u64);

impl fmt::Display for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// Failures reported by a data store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("store unreachable: {0}")]
    Unreachable(String),

    /// The store answered but rejected the request.
    #[error("store rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// No row with the given id exists in the table.
    #[error("no record with id {id} in table '{table}'")]
    NotFound { table: String, id: i64 },

    /// A table or column name is not a plain identifier.
    #[error("invalid identifier '{0}'")]
    InvalidIdentifier(String),

    /// The change feed refused to open a subscription.
    #[error("subscription to table '{table}' failed: {reason}")]
    Subscription { table: String, reason: String },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Cheap read used for connectivity checks.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self) -> Result<(), StoreError>;
}

/// Push-based per-table change notifications.
pub trait ChangeFeed: Send + Sync {
    /// Opens a subscription on `table`. Implementations must not invoke
    /// `on_event` before this call returns.
    fn subscribe(&self, table: &str, on_event: RawChangeCallback) -> Result<SubscriptionHandle, StoreError>;

    /// Closes a subscription. Unknown handles are ignored.
    fn unsubscribe(&self, handle: SubscriptionHandle);
}

/// Generic partial update of one row, returning the stored row.
#[async_trait]
pub trait Persist: Send + Sync {
    async fn persist(&self, table: &str, id: i64, patch: &Record) -> Result<Record, StoreError>;
}

/// Accepts only `[A-Za-z_][A-Za-z0-9_]*` so names can be spliced into SQL and URLs.
pub fn validate_identifier(name: &str) -> Result<&str, StoreError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => (first.is_ascii_alphabetic() || first == '_') && chars.all(|c| c.is_ascii_alphanumeric() || c == '_'),
        None => false,
    };
    if valid {
        Ok(name)
    } else {
        Err(StoreError::InvalidIdentifier(name.to_string()))
    }
}
