//! Elapsed-time accounting for task timers.
//!
//! Pure functions only: given the persisted [`TaskTimerState`] and the
//! current wall-clock time, compute either the patch to persist or a
//! rejection. Nothing here touches the store, so a caller can persist the
//! patch and only then adopt the new state.
//!
//! ## State machine
//!
//! ```text
//!            start              pause
//!   Idle ───────────▶ Running ───────────▶ Paused
//!    ▲                 │  ▲                  │
//!    │      stop       │  └──── resume ──────┤
//!    └─────────────────┴─────────────────────┘
//!                            stop
//! ```
//!
//! The running interval is never accumulated in memory. It is always
//! `now - timer_start_time`, which keeps totals correct across restarts.

use crate::db::store::{Record, StoreError};
use crate::libs::task::{Task, TaskStatus, TaskTimerState, TimerStatus};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    Start,
    Pause,
    Resume,
    Stop,
}

impl fmt::Display for TimerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimerAction::Start => "start",
            TimerAction::Pause => "pause",
            TimerAction::Resume => "resume",
            TimerAction::Stop => "stop",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TimerError {
    /// Stored timer state contradicts itself; refusing to compute from it.
    #[error("timer invariant violated on {action}: {reason}")]
    InvariantViolation { action: TimerAction, reason: String },

    /// The store rejected the write; the previous state is still authoritative.
    #[error("failed to persist timer state: {0}")]
    Persistence(#[from] StoreError),
}

/// Fields to write back after an accepted transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerPatch {
    pub timer: TaskTimerState,
    pub status: Option<TaskStatus>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TimerPatch {
    /// Column map for [`crate::db::store::Persist::persist`]. Timer columns
    /// are always written in full so a cleared start time reaches the store
    /// as `null`.
    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert("timer_status".into(), json!(self.timer.timer_status));
        record.insert(
            "timer_start_time".into(),
            self.timer.timer_start_time.map_or(Value::Null, |t| json!(t)),
        );
        record.insert("elapsed_time".into(), json!(self.timer.elapsed_time));
        if let Some(status) = self.status {
            record.insert("status".into(), json!(status));
        }
        if let Some(completed_at) = self.completed_at {
            record.insert("completed_at".into(), json!(completed_at));
        }
        record
    }

    /// `task` with this patch applied, as the store should now hold it.
    pub fn apply_to(&self, task: &Task) -> Task {
        let mut updated = task.clone();
        updated.timer = self.timer.clone();
        if let Some(status) = self.status {
            updated.status = status;
        }
        if self.completed_at.is_some() {
            updated.completed_at = self.completed_at;
        }
        updated
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Apply(TimerPatch),
    /// Precondition not met; the stored state stays as it is.
    Rejected { action: TimerAction, status: TimerStatus },
}

/// Total elapsed milliseconds including the interval in progress.
///
/// Read-only and cheap; safe to call on every display tick. A start time in
/// the future (clock skew between devices) contributes zero.
pub fn current_elapsed_time(state: &TaskTimerState, now: DateTime<Utc>) -> u64 {
    match (state.timer_status, state.timer_start_time) {
        (TimerStatus::Running, Some(started)) => {
            let running = (now - started).num_milliseconds().max(0) as u64;
            state.elapsed_time.saturating_add(running)
        }
        _ => state.elapsed_time,
    }
}

pub fn transition(action: TimerAction, state: &TaskTimerState, now: DateTime<Utc>) -> Result<Transition, TimerError> {
    let rejected = Transition::Rejected {
        action,
        status: state.timer_status,
    };

    let patch = match (action, state.timer_status) {
        (TimerAction::Start, TimerStatus::Idle) | (TimerAction::Resume, TimerStatus::Paused) => TimerPatch {
            timer: TaskTimerState {
                timer_status: TimerStatus::Running,
                timer_start_time: Some(now),
                elapsed_time: state.elapsed_time,
            },
            status: Some(TaskStatus::InProgress),
            completed_at: None,
        },
        (TimerAction::Pause, TimerStatus::Running) => TimerPatch {
            timer: TaskTimerState {
                timer_status: TimerStatus::Paused,
                timer_start_time: None,
                elapsed_time: close_running_interval(action, state, now)?,
            },
            status: None,
            completed_at: None,
        },
        (TimerAction::Stop, TimerStatus::Running) => TimerPatch {
            timer: TaskTimerState {
                timer_status: TimerStatus::Idle,
                timer_start_time: None,
                elapsed_time: close_running_interval(action, state, now)?,
            },
            status: Some(TaskStatus::Completed),
            completed_at: Some(now),
        },
        (TimerAction::Stop, TimerStatus::Paused) => TimerPatch {
            timer: TaskTimerState {
                timer_status: TimerStatus::Idle,
                timer_start_time: None,
                elapsed_time: state.elapsed_time,
            },
            status: Some(TaskStatus::Completed),
            completed_at: Some(now),
        },
        _ => return Ok(rejected),
    };

    Ok(Transition::Apply(patch))
}

/// `elapsed_time + (now - timer_start_time)` for a running timer.
fn close_running_interval(action: TimerAction, state: &TaskTimerState, now: DateTime<Utc>) -> Result<u64, TimerError> {
    let started = state.timer_start_time.ok_or_else(|| TimerError::InvariantViolation {
        action,
        reason: "timer is running but has no start time".to_string(),
    })?;

    let running = (now - started).num_milliseconds();
    if running < 0 {
        return Err(TimerError::InvariantViolation {
            action,
            reason: format!("start time {} is after now {}", started.to_rfc3339(), now.to_rfc3339()),
        });
    }

    Ok(state.elapsed_time.saturating_add(running as u64))
}
