//! Connectivity monitor for the data store.
//!
//! One monitor is shared by everything that needs to know whether the store
//! is reachable: a status banner, a manual "retry" action, the watch loop.
//! It is an explicit handle, constructed once and passed around by clone.
//!
//! ## Lifecycle
//!
//! 1. [`ConnectionMonitor::new`] builds the monitor around a [`Probe`].
//! 2. [`ConnectionMonitor::start`] spawns the background loop, which probes
//!    right away and then every `probe_interval`.
//! 3. [`ConnectionMonitor::destroy`] stops the loop and drops all listeners.
//!
//! ## Reconnection
//!
//! The periodic loop only records failures. Retrying with backoff happens
//! through [`ConnectionMonitor::reconnect`], which waits
//! `base_delay * attempt` before probing and gives up for good after
//! `max_reconnect_attempts` consecutive failures. Any successful probe
//! resets the attempt counter.

use crate::db::store::Probe;
use crate::libs::config::RealtimeConfig;
use crate::libs::messages::Message;
use crate::{msg_debug, msg_info, msg_warning};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

const MIN_PROBE_INTERVAL_SECS: u64 = 1;

/// Wait before reconnect `attempt` (1-based): `base_delay * attempt`,
/// saturating instead of overflowing.
pub fn backoff_delay(base_delay: Duration, attempt: u32) -> Duration {
    base_delay.saturating_mul(attempt)
}

/// Snapshot of the monitor's view of the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionState {
    pub is_connected: bool,
    /// True only while a reconnect attempt is waiting or probing.
    pub is_reconnecting: bool,
    pub last_error: Option<String>,
    pub reconnect_attempts: u32,
    pub max_reconnect_attempts: u32,
}

impl ConnectionState {
    fn initial(max_reconnect_attempts: u32) -> Self {
        ConnectionState {
            is_connected: true,
            is_reconnecting: false,
            last_error: None,
            reconnect_attempts: 0,
            max_reconnect_attempts,
        }
    }

    /// Whether a manual retry would be attempted right now.
    pub fn can_reconnect(&self) -> bool {
        !self.is_reconnecting && self.reconnect_attempts < self.max_reconnect_attempts
    }
}

pub type ConnectionListener = Arc<dyn Fn(&ConnectionState) + Send + Sync>;

struct Inner {
    probe: Arc<dyn Probe>,
    probe_interval: Duration,
    base_delay: Duration,
    state: Mutex<ConnectionState>,
    listeners: Mutex<Vec<(u64, ConnectionListener)>>,
    next_listener_id: AtomicU64,
    background: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(handle) = self.background.get_mut().take() {
            handle.abort();
        }
    }
}

#[derive(Clone)]
pub struct ConnectionMonitor {
    inner: Arc<Inner>,
}

impl ConnectionMonitor {
    pub fn new(probe: Arc<dyn Probe>, config: &RealtimeConfig) -> Self {
        let inner = Inner {
            probe,
            // a zero period would panic inside the probe loop
            probe_interval: Duration::from_secs(config.probe_interval.max(MIN_PROBE_INTERVAL_SECS)),
            base_delay: Duration::from_millis(config.base_delay),
            state: Mutex::new(ConnectionState::initial(config.max_reconnect_attempts)),
            listeners: Mutex::new(Vec::new()),
            next_listener_id: AtomicU64::new(1),
            background: Mutex::new(None),
        };
        Self { inner: Arc::new(inner) }
    }

    /// Spawns the periodic probe loop. Must be called inside a Tokio runtime.
    /// Calling it again while the loop is alive does nothing.
    pub fn start(&self) {
        let mut background = self.inner.background.lock();
        if background.as_ref().is_some_and(|h| !h.is_finished()) {
            return;
        }

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let period = self.inner.probe_interval;
        *background = Some(tokio::spawn(async move {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                // first tick completes immediately
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                ConnectionMonitor { inner }.check_connection().await;
            }
        }));
        msg_debug!(Message::ConnectionMonitorStarted(period.as_secs()));
    }

    /// Stops the probe loop and forgets every listener.
    pub fn destroy(&self) {
        if let Some(handle) = self.inner.background.lock().take() {
            handle.abort();
        }
        self.inner.listeners.lock().clear();
        msg_debug!(Message::ConnectionMonitorStopped);
    }

    pub fn snapshot(&self) -> ConnectionState {
        self.inner.state.lock().clone()
    }

    /// Probes the store once and records the outcome. Never fails; the error,
    /// if any, ends up in [`ConnectionState::last_error`].
    pub async fn check_connection(&self) -> bool {
        let result = self.inner.probe.probe().await;

        let (was_connected, state) = {
            let mut state = self.inner.state.lock();
            let was_connected = state.is_connected;
            match &result {
                Ok(()) => {
                    state.is_connected = true;
                    state.last_error = None;
                    state.reconnect_attempts = 0;
                }
                Err(e) => {
                    state.is_connected = false;
                    state.last_error = Some(e.to_string());
                }
            }
            state.is_reconnecting = false;
            (was_connected, state.clone())
        };

        match (&result, was_connected) {
            (Ok(()), false) => msg_info!(Message::ConnectionRestored),
            (Err(e), true) => msg_warning!(Message::ConnectionLost(e.to_string())),
            (Err(e), false) => msg_debug!(Message::ConnectionStillDown(e.to_string())),
            (Ok(()), true) => {}
        }

        self.notify(&state);
        result.is_ok()
    }

    /// One backoff-delayed reconnection attempt.
    ///
    /// Returns `false` right away, without sleeping or probing, while another
    /// attempt is in flight or once the attempt budget is spent.
    pub async fn reconnect(&self) -> bool {
        let (attempt, state) = {
            let mut state = self.inner.state.lock();
            if !state.can_reconnect() {
                msg_debug!(Message::ReconnectRefused(state.reconnect_attempts, state.max_reconnect_attempts));
                return false;
            }
            state.reconnect_attempts += 1;
            state.is_reconnecting = true;
            (state.reconnect_attempts, state.clone())
        };
        self.notify(&state);

        let delay = backoff_delay(self.inner.base_delay, attempt);
        let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        msg_info!(Message::ReconnectAttempt(attempt, state.max_reconnect_attempts, delay_ms));
        time::sleep(delay).await;

        self.check_connection().await
    }

    /// Registers `listener` and immediately calls it with the current state.
    pub fn subscribe<F>(&self, listener: F) -> ConnectionSubscription
    where
        F: Fn(&ConnectionState) + Send + Sync + 'static,
    {
        let listener: ConnectionListener = Arc::new(listener);
        let id = self.inner.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.inner.listeners.lock().push((id, listener.clone()));

        listener(&self.snapshot());

        ConnectionSubscription {
            inner: Arc::downgrade(&self.inner),
            id,
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.lock().len()
    }

    fn notify(&self, state: &ConnectionState) {
        let listeners: Vec<ConnectionListener> = self.inner.listeners.lock().iter().map(|(_, l)| l.clone()).collect();
        for listener in listeners {
            listener(state);
        }
    }
}

#[must_use = "keep the subscription to be able to unsubscribe"]
pub struct ConnectionSubscription {
    inner: Weak<Inner>,
    id: u64,
}

impl ConnectionSubscription {
    pub fn unsubscribe(self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.listeners.lock().retain(|(id, _)| *id != self.id);
        }
    }
}
