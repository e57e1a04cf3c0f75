//! Timer operations on tasks, persisted through the store.
//!
//! Each operation follows the same path:
//!
//! 1. claim the task in the [`ProcessingGuard`] (or report `Skipped`),
//! 2. compute the transition from the task's *persisted* state,
//! 3. write the patch through [`Persist`],
//! 4. hand back the row the store returned, or the locally patched task
//!    if that row cannot be decoded.
//!
//! The task passed in is never modified. If the write fails the caller
//! still holds the last persisted state, which stays authoritative.

use crate::db::store::Persist;
use crate::libs::clock::{Clock, SystemClock};
use crate::libs::guard::ProcessingGuard;
use crate::libs::messages::Message;
use crate::libs::task::{Task, TASKS_TABLE};
use crate::libs::timer::{self, TimerAction, TimerError, Transition};
use crate::{msg_debug, msg_error, msg_warning};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum TimerOutcome {
    /// The transition was persisted; this is the stored task.
    Applied(Task),
    /// Another operation on the same task was still in flight.
    Skipped,
    /// The timer was not in a state this action applies to.
    Unchanged,
}

#[derive(Clone)]
pub struct TaskTimers {
    store: Arc<dyn Persist>,
    clock: Arc<dyn Clock>,
    guard: ProcessingGuard,
}

impl TaskTimers {
    pub fn new(store: Arc<dyn Persist>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn Persist>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            guard: ProcessingGuard::new(),
        }
    }

    pub fn guard(&self) -> &ProcessingGuard {
        &self.guard
    }

    /// Live total for display, in milliseconds.
    pub fn current_elapsed_time(&self, task: &Task) -> u64 {
        timer::current_elapsed_time(&task.timer, self.clock.now())
    }

    pub async fn start_timer(&self, task: &Task) -> Result<TimerOutcome, TimerError> {
        self.run(TimerAction::Start, task).await
    }

    pub async fn pause_timer(&self, task: &Task) -> Result<TimerOutcome, TimerError> {
        self.run(TimerAction::Pause, task).await
    }

    pub async fn resume_timer(&self, task: &Task) -> Result<TimerOutcome, TimerError> {
        self.run(TimerAction::Resume, task).await
    }

    pub async fn stop_timer(&self, task: &Task) -> Result<TimerOutcome, TimerError> {
        self.run(TimerAction::Stop, task).await
    }

    /// Dispatches `action` to the matching operation.
    pub async fn apply(&self, action: TimerAction, task: &Task) -> Result<TimerOutcome, TimerError> {
        self.run(action, task).await
    }

    async fn run(&self, action: TimerAction, task: &Task) -> Result<TimerOutcome, TimerError> {
        let Some(_ticket) = self.guard.try_acquire(task.id) else {
            msg_debug!(Message::TimerOperationSkipped(action.to_string(), task.id));
            return Ok(TimerOutcome::Skipped);
        };

        let patch = match timer::transition(action, &task.timer, self.clock.now()) {
            Ok(Transition::Apply(patch)) => patch,
            Ok(Transition::Rejected { status, .. }) => {
                msg_debug!(Message::TimerTransitionRejected(action.to_string(), task.id, status.to_string()));
                return Ok(TimerOutcome::Unchanged);
            }
            Err(e) => {
                msg_error!(Message::TimerInvariantViolated(task.id, e.to_string()));
                return Err(e);
            }
        };

        let row = self.store.persist(TASKS_TABLE, task.id, &patch.to_record()).await.map_err(|e| {
            msg_error!(Message::TimerPersistFailed(action.to_string(), task.id, e.to_string()));
            TimerError::Persistence(e)
        })?;

        // The write is committed at this point; an unreadable row falls back to the local patch.
        let stored = Task::from_record(row).unwrap_or_else(|e| {
            msg_warning!(Message::TimerRowUnreadable(task.id, e.to_string()));
            patch.apply_to(task)
        });

        Ok(TimerOutcome::Applied(stored))
    }
}
