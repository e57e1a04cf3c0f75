//! Task entity with its embedded timer state.
//!
//! Tasks travel through the store as JSON records; the column names below
//! are the record keys. Timestamps are RFC 3339 strings in UTC.

use crate::db::store::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub const TASKS_TABLE: &str = "tasks";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in progress",
            TaskStatus::Completed => "completed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerStatus {
    #[default]
    Idle,
    Running,
    Paused,
}

impl fmt::Display for TimerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimerStatus::Idle => "idle",
            TimerStatus::Running => "running",
            TimerStatus::Paused => "paused",
        };
        f.write_str(name)
    }
}

/// Persisted timer snapshot.
///
/// `elapsed_time` holds milliseconds accumulated by finished running
/// intervals; the interval in progress is always derived from
/// `timer_start_time` at read time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaskTimerState {
    #[serde(default)]
    pub timer_status: TimerStatus,
    #[serde(default)]
    pub timer_start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub elapsed_time: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    #[serde(default)]
    pub owner_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(flatten)]
    pub timer: TaskTimerState,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Fields needed to create a task; the store assigns `id`.
#[derive(Debug, Clone, Serialize)]
pub struct NewTask {
    pub name: String,
    pub comment: String,
    pub owner_id: Option<String>,
    pub status: TaskStatus,
    pub timer_status: TimerStatus,
    pub elapsed_time: u64,
    pub created_at: DateTime<Utc>,
}

impl NewTask {
    pub fn new(name: &str, comment: &str, owner_id: Option<&str>) -> Self {
        NewTask {
            name: name.to_string(),
            comment: comment.to_string(),
            owner_id: owner_id.map(str::to_string),
            status: TaskStatus::Pending,
            timer_status: TimerStatus::Idle,
            elapsed_time: 0,
            created_at: Utc::now(),
        }
    }

    pub fn to_record(&self) -> Result<Record, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(serde::de::Error::custom(format!("expected a JSON object, got {other}"))),
        }
    }
}

impl Task {
    pub fn from_record(record: Record) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn task_reads_sqlite_shaped_record() {
        let record = json!({
            "id": 7,
            "owner_id": "u-1",
            "name": "Retouch set",
            "comment": null,
            "status": "in_progress",
            "timer_status": "running",
            "timer_start_time": "2025-03-01T10:00:00Z",
            "elapsed_time": 1500,
            "completed_at": null,
            "created_at": "2025-03-01T09:00:00Z"
        });
        let Value::Object(map) = record else { panic!() };

        let task = Task::from_record(map).unwrap();
        assert_eq!(task.id, 7);
        assert_eq!(task.comment, None);
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.timer.timer_status, TimerStatus::Running);
        assert_eq!(task.timer.elapsed_time, 1500);
        assert!(task.timer.timer_start_time.is_some());
    }

    #[test]
    fn missing_timer_columns_default_to_idle() {
        let Value::Object(map) = json!({ "id": 1, "name": "Call agency" }) else { panic!() };
        let task = Task::from_record(map).unwrap();
        assert_eq!(task.timer, TaskTimerState::default());
        assert_eq!(task.status, TaskStatus::Pending);
    }
}
