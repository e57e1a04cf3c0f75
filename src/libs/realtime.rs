//! Change-event registry: one store subscription per table, many listeners.
//!
//! Consumers (list views, counters, caches) register a callback for a table
//! and receive every INSERT/UPDATE/DELETE on it. However many consumers
//! watch a table, the store sees exactly one subscription, opened when the
//! first listener arrives and closed when the last one leaves.
//!
//! ```text
//!  store feed ──▶ dispatch(table) ──▶ snapshot of listeners ──▶ cb1, cb2, cb3
//! ```
//!
//! The registry does not filter by owner; listeners inspect the records
//! themselves (see [`ChangeEvent::owned_by`]).

use crate::db::store::{ChangeFeed, RawChange, RawChangeCallback, Record, SubscriptionHandle};
use crate::libs::messages::Message;
use crate::{msg_debug, msg_error, msg_warning};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeEventType {
    Insert,
    Update,
    Delete,
}

impl FromStr for ChangeEventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "INSERT" => Ok(ChangeEventType::Insert),
            "UPDATE" => Ok(ChangeEventType::Update),
            "DELETE" => Ok(ChangeEventType::Delete),
            _ => Err(s.to_string()),
        }
    }
}

impl fmt::Display for ChangeEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChangeEventType::Insert => "INSERT",
            ChangeEventType::Update => "UPDATE",
            ChangeEventType::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub table: String,
    pub event_type: ChangeEventType,
    pub new_record: Option<Record>,
    pub old_record: Option<Record>,
}

impl ChangeEvent {
    /// Converts a feed payload, treating `{}` as an absent record.
    pub fn from_raw(table: &str, raw: RawChange) -> Result<Self, String> {
        let event_type = raw.event_type.parse()?;
        Ok(ChangeEvent {
            table: table.to_string(),
            event_type,
            new_record: raw.new.filter(|r| !r.is_empty()),
            old_record: raw.old.filter(|r| !r.is_empty()),
        })
    }

    /// Id of the affected row, taken from whichever side carries it.
    pub fn record_id(&self) -> Option<i64> {
        self.field("id").and_then(Value::as_i64)
    }

    /// True when `field` equals `owner` on the new or the old record.
    pub fn owned_by(&self, field: &str, owner: &str) -> bool {
        [&self.new_record, &self.old_record]
            .into_iter()
            .flatten()
            .any(|record| record.get(field).and_then(Value::as_str) == Some(owner))
    }

    fn field(&self, name: &str) -> Option<&Value> {
        self.new_record
            .as_ref()
            .and_then(|r| r.get(name))
            .or_else(|| self.old_record.as_ref().and_then(|r| r.get(name)))
    }
}

pub type ChangeListener = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

type ListenerId = u64;

#[derive(Default)]
struct TableChannel {
    /// `None` when opening the store subscription failed.
    subscription: Option<SubscriptionHandle>,
    listeners: Vec<(ListenerId, ChangeListener)>,
}

type Tables = Mutex<HashMap<String, TableChannel>>;

/// Cheap to clone; clones share the same tables.
#[derive(Clone)]
pub struct ChangeEventRegistry {
    feed: Arc<dyn ChangeFeed>,
    tables: Arc<Tables>,
    next_id: Arc<AtomicU64>,
}

impl ChangeEventRegistry {
    pub fn new(feed: Arc<dyn ChangeFeed>) -> Self {
        Self {
            feed,
            tables: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Adds `callback` to `table`, opening the store subscription if this is
    /// the first listener (or if an earlier attempt to open it failed).
    ///
    /// Registering the same callback twice yields two independent entries.
    pub fn register_listener<F>(&self, table: &str, callback: F) -> ListenerHandle
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut tables = self.tables.lock();
        let channel = tables.entry(table.to_string()).or_default();

        if channel.subscription.is_none() {
            let dispatch = Self::dispatcher(Arc::downgrade(&self.tables), table.to_string());
            match self.feed.subscribe(table, dispatch) {
                Ok(handle) => {
                    msg_debug!(Message::SubscriptionOpened(table.to_string(), handle.to_string()));
                    channel.subscription = Some(handle);
                }
                Err(e) => msg_error!(Message::SubscriptionFailed(table.to_string(), e.to_string())),
            }
        }
        channel.listeners.push((id, Arc::new(callback)));

        ListenerHandle {
            feed: Arc::downgrade(&self.feed),
            tables: Arc::downgrade(&self.tables),
            table: table.to_string(),
            id,
        }
    }

    pub fn listener_count(&self, table: &str) -> usize {
        self.tables.lock().get(table).map_or(0, |c| c.listeners.len())
    }

    pub fn is_subscribed(&self, table: &str) -> bool {
        self.tables.lock().get(table).is_some_and(|c| c.subscription.is_some())
    }

    /// Builds the closure handed to the store. It holds the tables weakly so
    /// a forgotten subscription cannot keep the registry alive.
    fn dispatcher(tables: Weak<Tables>, table: String) -> RawChangeCallback {
        Box::new(move |raw| {
            let Some(tables) = tables.upgrade() else {
                return;
            };
            let event = match ChangeEvent::from_raw(&table, raw) {
                Ok(event) => event,
                Err(kind) => {
                    msg_warning!(Message::UnknownChangeEvent(table.clone(), kind));
                    return;
                }
            };

            // Snapshot, then release the lock: callbacks may (un)register.
            let listeners: Vec<ChangeListener> = match tables.lock().get(&table) {
                Some(channel) => channel.listeners.iter().map(|(_, cb)| cb.clone()).collect(),
                None => return,
            };
            for listener in listeners {
                listener(&event);
            }
        })
    }
}

/// Registration receipt. Call [`ListenerHandle::unsubscribe`] to stop
/// receiving events; dropping the handle leaves the listener registered.
#[must_use = "keep the handle to be able to unsubscribe"]
pub struct ListenerHandle {
    feed: Weak<dyn ChangeFeed>,
    tables: Weak<Tables>,
    table: String,
    id: ListenerId,
}

impl ListenerHandle {
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Removes this listener; closes the store subscription if it was the last one.
    pub fn unsubscribe(self) {
        let Some(tables) = self.tables.upgrade() else {
            return;
        };

        let closed = {
            let mut tables = tables.lock();
            let Some(channel) = tables.get_mut(&self.table) else {
                return;
            };
            channel.listeners.retain(|(id, _)| *id != self.id);
            if channel.listeners.is_empty() {
                tables.remove(&self.table).and_then(|c| c.subscription)
            } else {
                None
            }
        };

        if let (Some(handle), Some(feed)) = (closed, self.feed.upgrade()) {
            feed.unsubscribe(handle);
            msg_debug!(Message::SubscriptionClosed(self.table.clone(), handle.to_string()));
        }
    }
}

impl fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerHandle").field("table", &self.table).field("id", &self.id).finish()
    }
}
