//! Per-task in-flight flag for timer operations.
//!
//! A second operation on a task that is already being processed is turned
//! away immediately instead of waiting.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct ProcessingGuard {
    in_flight: Arc<Mutex<HashSet<i64>>>,
}

impl ProcessingGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_processing(&self, id: i64) -> bool {
        self.in_flight.lock().contains(&id)
    }

    pub fn set_processing(&self, id: i64, processing: bool) {
        let mut in_flight = self.in_flight.lock();
        if processing {
            in_flight.insert(id);
        } else {
            in_flight.remove(&id);
        }
    }

    /// Marks `id` as processing unless it already is.
    ///
    /// The check and the insert happen under one lock. The returned ticket
    /// clears the flag when dropped, so early returns and `?` release it too.
    pub fn try_acquire(&self, id: i64) -> Option<ProcessingTicket> {
        if !self.in_flight.lock().insert(id) {
            return None;
        }
        Some(ProcessingTicket {
            guard: self.clone(),
            id,
        })
    }
}

#[must_use = "the task is released as soon as the ticket is dropped"]
#[derive(Debug)]
pub struct ProcessingTicket {
    guard: ProcessingGuard,
    id: i64,
}

impl Drop for ProcessingTicket {
    fn drop(&mut self) {
        self.guard.set_processing(self.id, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_is_refused_until_release() {
        let guard = ProcessingGuard::new();
        let ticket = guard.try_acquire(3).unwrap();
        assert!(guard.is_processing(3));
        assert!(guard.try_acquire(3).is_none());
        assert!(guard.try_acquire(4).is_some());

        drop(ticket);
        assert!(!guard.is_processing(3));
        assert!(guard.try_acquire(3).is_some());
    }

    #[test]
    fn ticket_released_on_error_path() {
        fn failing(guard: &ProcessingGuard) -> Result<(), String> {
            let _ticket = guard.try_acquire(9).ok_or("busy")?;
            Err("store down".into())
        }

        let guard = ProcessingGuard::new();
        assert_eq!(failing(&guard), Err("store down".to_string()));
        assert!(!guard.is_processing(9));
    }

    #[test]
    fn manual_flags() {
        let guard = ProcessingGuard::new();
        guard.set_processing(1, true);
        assert!(guard.is_processing(1));
        guard.set_processing(1, false);
        assert!(!guard.is_processing(1));
    }
}
