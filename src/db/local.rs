//! SQLite-backed data store with an in-process change feed.
//!
//! Rows are read and written as JSON records keyed by column name, so any
//! table created by the migrations can be used by name. Every successful
//! write is pushed to the subscribers of that table, giving local consumers
//! the same INSERT/UPDATE/DELETE stream a hosted realtime backend would.
//!
//! ## Locking
//!
//! The connection and the subscriber map sit behind separate mutexes.
//! Change callbacks always run after both are released, so a callback may
//! read from the store or (un)subscribe without deadlocking.
//!
//! ```rust
//! use taskpulse::db::local::LocalStore;
//! use serde_json::json;
//!
//! let store = LocalStore::in_memory()?;
//! let record = json!({ "name": "Prepare casting sheet" });
//! let row = store.insert("tasks", record.as_object().unwrap())?;
//! assert_eq!(row["timer_status"], "idle");
//! # Ok::<(), anyhow::Error>(())
//! ```

use super::db::Db;
use super::store::{validate_identifier, ChangeFeed, Persist, Probe, RawChange, RawChangeCallback, Record, StoreError, SubscriptionHandle};
use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};
use serde_json::{Number, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

type Subscriber = (String, Arc<dyn Fn(RawChange) + Send + Sync>);

pub struct LocalStore {
    conn: Mutex<Connection>,
    subscribers: Mutex<HashMap<u64, Subscriber>>,
    next_handle: AtomicU64,
}

impl LocalStore {
    pub fn new(db: Db) -> Self {
        Self {
            conn: Mutex::new(db.conn),
            subscribers: Mutex::new(HashMap::new()),
            next_handle: AtomicU64::new(1),
        }
    }

    /// Opens the database file in the data directory.
    pub fn open() -> Result<Self> {
        Ok(Self::new(Db::new()?))
    }

    pub fn in_memory() -> Result<Self> {
        Ok(Self::new(Db::in_memory()?))
    }

    pub fn insert(&self, table: &str, record: &Record) -> Result<Record, StoreError> {
        let table = validate_identifier(table)?;
        let (columns, values) = split_record(record)?;

        let row = {
            let conn = self.conn.lock();
            let sql = if columns.is_empty() {
                format!("INSERT INTO {table} DEFAULT VALUES")
            } else {
                let placeholders = vec!["?"; columns.len()].join(", ");
                format!("INSERT INTO {table} ({}) VALUES ({placeholders})", columns.join(", "))
            };
            conn.execute(&sql, params_from_iter(values))?;
            let id = conn.last_insert_rowid();
            select_one(&conn, table, id)?.ok_or_else(|| StoreError::NotFound {
                table: table.to_string(),
                id,
            })?
        };

        self.emit(table, "INSERT", Some(row.clone()), None);
        Ok(row)
    }

    pub fn fetch(&self, table: &str, id: i64) -> Result<Option<Record>, StoreError> {
        let table = validate_identifier(table)?;
        let conn = self.conn.lock();
        select_one(&conn, table, id)
    }

    pub fn list(&self, table: &str) -> Result<Vec<Record>, StoreError> {
        let table = validate_identifier(table)?;
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!("SELECT * FROM {table} ORDER BY id"))?;
        let rows = stmt.query_map([], row_to_record)?.collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Applies `patch` to row `id` and returns the updated row. The `id`
    /// key, if present in the patch, is ignored.
    pub fn update(&self, table: &str, id: i64, patch: &Record) -> Result<Record, StoreError> {
        let table = validate_identifier(table)?;
        let (columns, mut values) = split_record(patch)?;

        let (old, new) = {
            let conn = self.conn.lock();
            let old = select_one(&conn, table, id)?.ok_or_else(|| StoreError::NotFound {
                table: table.to_string(),
                id,
            })?;
            if columns.is_empty() {
                return Ok(old);
            }

            let assignments = columns.iter().map(|c| format!("{c} = ?")).collect::<Vec<_>>().join(", ");
            values.push(SqlValue::Integer(id));
            conn.execute(&format!("UPDATE {table} SET {assignments} WHERE id = ?"), params_from_iter(values))?;

            let new = select_one(&conn, table, id)?.ok_or_else(|| StoreError::NotFound {
                table: table.to_string(),
                id,
            })?;
            (old, new)
        };

        self.emit(table, "UPDATE", Some(new.clone()), Some(old));
        Ok(new)
    }

    /// Deletes row `id` and returns it as it was.
    pub fn delete(&self, table: &str, id: i64) -> Result<Record, StoreError> {
        let table = validate_identifier(table)?;

        let old = {
            let conn = self.conn.lock();
            let old = select_one(&conn, table, id)?.ok_or_else(|| StoreError::NotFound {
                table: table.to_string(),
                id,
            })?;
            conn.execute(&format!("DELETE FROM {table} WHERE id = ?1"), [id])?;
            old
        };

        self.emit(table, "DELETE", None, Some(old.clone()));
        Ok(old)
    }

    pub fn subscriber_count(&self, table: &str) -> usize {
        self.subscribers.lock().values().filter(|(t, _)| t == table).count()
    }

    fn emit(&self, table: &str, event_type: &str, new: Option<Record>, old: Option<Record>) {
        let targets: Vec<_> = self
            .subscribers
            .lock()
            .values()
            .filter(|(t, _)| t == table)
            .map(|(_, cb)| cb.clone())
            .collect();

        for callback in targets {
            callback(RawChange {
                event_type: event_type.to_string(),
                new: new.clone(),
                old: old.clone(),
            });
        }
    }
}

#[async_trait]
impl Probe for LocalStore {
    async fn probe(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }
}

impl ChangeFeed for LocalStore {
    fn subscribe(&self, table: &str, on_event: RawChangeCallback) -> Result<SubscriptionHandle, StoreError> {
        let table = validate_identifier(table).map_err(|e| StoreError::Subscription {
            table: table.to_string(),
            reason: e.to_string(),
        })?;
        let id = self.next_handle.fetch_add(1, Ordering::Relaxed);
        self.subscribers.lock().insert(id, (table.to_string(), Arc::from(on_event)));
        Ok(SubscriptionHandle(id))
    }

    fn unsubscribe(&self, handle: SubscriptionHandle) {
        self.subscribers.lock().remove(&handle.0);
    }
}

#[async_trait]
impl Persist for LocalStore {
    async fn persist(&self, table: &str, id: i64, patch: &Record) -> Result<Record, StoreError> {
        self.update(table, id, patch)
    }
}

fn select_one(conn: &Connection, table: &str, id: i64) -> Result<Option<Record>, StoreError> {
    let mut stmt = conn.prepare(&format!("SELECT * FROM {table} WHERE id = ?1"))?;
    Ok(stmt.query_row([id], row_to_record).optional()?)
}

fn split_record(record: &Record) -> Result<(Vec<&str>, Vec<SqlValue>), StoreError> {
    let mut columns = Vec::with_capacity(record.len());
    let mut values = Vec::with_capacity(record.len());
    for (column, value) in record.iter().filter(|(c, _)| c.as_str() != "id") {
        columns.push(validate_identifier(column)?);
        values.push(json_to_sql(value));
    }
    Ok((columns, values))
}

fn json_to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(*b as i64),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        nested => SqlValue::Text(nested.to_string()),
    }
}

fn row_to_record(row: &Row) -> rusqlite::Result<Record> {
    let mut record = Record::new();
    for (index, name) in row.as_ref().column_names().into_iter().enumerate() {
        let value = match row.get_ref(index)? {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::from(i),
            ValueRef::Real(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
            ValueRef::Text(bytes) | ValueRef::Blob(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        };
        record.insert(name.to_string(), value);
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn crud_round_trip_emits_events() {
        let store = LocalStore::in_memory().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let handle = store
            .subscribe("tasks", Box::new(move |raw| sink.lock().push(raw.event_type)))
            .unwrap();

        let row = store.insert("tasks", &record(json!({ "name": "Shoot lookbook" }))).unwrap();
        let id = row["id"].as_i64().unwrap();
        assert_eq!(row["status"], "pending");

        let updated = store.update("tasks", id, &record(json!({ "comment": "studio B" }))).unwrap();
        assert_eq!(updated["comment"], "studio B");

        let removed = store.delete("tasks", id).unwrap();
        assert_eq!(removed["id"], json!(id));
        assert!(store.fetch("tasks", id).unwrap().is_none());

        store.unsubscribe(handle);
        store.insert("tasks", &record(json!({ "name": "after" }))).unwrap();
        assert_eq!(*seen.lock(), vec!["INSERT", "UPDATE", "DELETE"]);
    }

    #[test]
    fn update_of_missing_row_is_not_found() {
        let store = LocalStore::in_memory().unwrap();
        let err = store.update("tasks", 404, &record(json!({ "name": "x" }))).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { id: 404, .. }));
    }

    #[test]
    fn hostile_names_are_rejected() {
        let store = LocalStore::in_memory().unwrap();
        assert!(matches!(store.list("tasks--"), Err(StoreError::InvalidIdentifier(_))));
        let err = store.insert("tasks", &record(json!({ "name) VALUES ('x'); --": 1 }))).unwrap_err();
        assert!(matches!(err, StoreError::InvalidIdentifier(_)));
    }

    #[test]
    fn subscribers_only_see_their_table() {
        let store = LocalStore::in_memory().unwrap();
        let hits = Arc::new(AtomicU64::new(0));
        let counter = hits.clone();
        store
            .subscribe(
                "migrations",
                Box::new(move |_| {
                    counter.fetch_add(1, Ordering::Relaxed);
                }),
            )
            .unwrap();
        store.insert("tasks", &record(json!({ "name": "Fitting" }))).unwrap();
        assert_eq!(hits.load(Ordering::Relaxed), 0);
        assert_eq!(store.subscriber_count("migrations"), 1);
    }
}
