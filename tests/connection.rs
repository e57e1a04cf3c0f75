#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use taskpulse::db::store::{Probe, StoreError};
    use taskpulse::libs::config::RealtimeConfig;
    use taskpulse::libs::connection::{ConnectionMonitor, ConnectionState};
    use test_context::{test_context, AsyncTestContext};

    #[derive(Default)]
    struct MockProbe {
        calls: AtomicUsize,
        healthy: AtomicBool,
    }

    #[async_trait]
    impl Probe for MockProbe {
        async fn probe(&self) -> Result<(), StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.healthy.load(Ordering::SeqCst) {
                Ok(())
            } else {
                Err(StoreError::Unreachable("connection refused".to_string()))
            }
        }
    }

    struct MonitorContext {
        probe: Arc<MockProbe>,
        monitor: ConnectionMonitor,
    }

    impl AsyncTestContext for MonitorContext {
        async fn setup() -> Self {
            let probe = Arc::new(MockProbe::default());
            let config = RealtimeConfig {
                probe_interval: 3600,
                base_delay: 1,
                max_reconnect_attempts: 5,
            };
            let monitor = ConnectionMonitor::new(probe.clone(), &config);
            MonitorContext { probe, monitor }
        }

        async fn teardown(self) {
            self.monitor.destroy();
        }
    }

    #[test_context(MonitorContext)]
    #[tokio::test]
    async fn test_initial_state_is_optimistic(ctx: &mut MonitorContext) {
        let state = ctx.monitor.snapshot();
        assert!(state.is_connected);
        assert!(!state.is_reconnecting);
        assert_eq!(state.last_error, None);
        assert_eq!(state.reconnect_attempts, 0);
        assert_eq!(state.max_reconnect_attempts, 5);
    }

    #[test_context(MonitorContext)]
    #[tokio::test]
    async fn test_reconnect_is_bounded(ctx: &mut MonitorContext) {
        assert!(!ctx.monitor.check_connection().await);
        assert_eq!(ctx.probe.calls.load(Ordering::SeqCst), 1);

        for attempt in 1..=5 {
            assert!(!ctx.monitor.reconnect().await);
            assert_eq!(ctx.monitor.snapshot().reconnect_attempts, attempt);
        }
        let probes = ctx.probe.calls.load(Ordering::SeqCst);
        assert_eq!(probes, 6);

        assert!(!ctx.monitor.reconnect().await);
        assert_eq!(ctx.probe.calls.load(Ordering::SeqCst), probes);

        let state = ctx.monitor.snapshot();
        assert!(!state.can_reconnect());
        assert!(!state.is_reconnecting);
        assert_eq!(state.last_error.as_deref(), Some("store unreachable: connection refused"));
    }

    #[test_context(MonitorContext)]
    #[tokio::test]
    async fn test_successful_check_resets_attempts(ctx: &mut MonitorContext) {
        ctx.monitor.check_connection().await;
        ctx.monitor.reconnect().await;
        ctx.monitor.reconnect().await;
        assert_eq!(ctx.monitor.snapshot().reconnect_attempts, 2);

        ctx.probe.healthy.store(true, Ordering::SeqCst);
        assert!(ctx.monitor.check_connection().await);

        let state = ctx.monitor.snapshot();
        assert!(state.is_connected);
        assert_eq!(state.reconnect_attempts, 0);
        assert_eq!(state.last_error, None);
    }

    #[test_context(MonitorContext)]
    #[tokio::test]
    async fn test_reconnect_succeeds_when_store_returns(ctx: &mut MonitorContext) {
        ctx.monitor.check_connection().await;
        ctx.probe.healthy.store(true, Ordering::SeqCst);

        assert!(ctx.monitor.reconnect().await);
        assert!(ctx.monitor.snapshot().is_connected);
        assert_eq!(ctx.monitor.snapshot().reconnect_attempts, 0);
    }

    #[test_context(MonitorContext)]
    #[tokio::test]
    async fn test_subscribe_delivers_current_state_immediately(ctx: &mut MonitorContext) {
        let seen: Arc<Mutex<Vec<ConnectionState>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let subscription = ctx.monitor.subscribe(move |state| sink.lock().push(state.clone()));

        assert_eq!(seen.lock().len(), 1);
        assert!(seen.lock()[0].is_connected);

        ctx.monitor.check_connection().await;
        ctx.monitor.reconnect().await;
        {
            let seen = seen.lock();
            // check, reconnect start, reconnect probe
            assert_eq!(seen.len(), 4);
            assert!(!seen[1].is_connected);
            assert!(seen[2].is_reconnecting);
            assert!(!seen[3].is_reconnecting);
        }

        subscription.unsubscribe();
        assert_eq!(ctx.monitor.listener_count(), 0);
        ctx.monitor.check_connection().await;
        assert_eq!(seen.lock().len(), 4);
    }

    #[test_context(MonitorContext)]
    #[tokio::test]
    async fn test_concurrent_reconnect_is_refused(ctx: &mut MonitorContext) {
        ctx.monitor.check_connection().await;
        let first = ctx.monitor.clone();
        let second = ctx.monitor.clone();

        let (a, b) = tokio::join!(first.reconnect(), second.reconnect());
        assert!(!a && !b);
        assert_eq!(ctx.monitor.snapshot().reconnect_attempts, 1);
        assert_eq!(ctx.probe.calls.load(Ordering::SeqCst), 2);
    }

    #[test_context(MonitorContext)]
    #[tokio::test]
    async fn test_background_loop_probes_and_stops(ctx: &mut MonitorContext) {
        ctx.monitor.start();
        ctx.monitor.start();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(ctx.probe.calls.load(Ordering::SeqCst), 1);
        assert!(!ctx.monitor.snapshot().is_connected);

        let _subscription = ctx.monitor.subscribe(|_| {});
        ctx.monitor.destroy();
        assert_eq!(ctx.monitor.listener_count(), 0);
    }

    fn monitor_with(probe: Arc<MockProbe>, probe_interval: u64, base_delay: u64) -> ConnectionMonitor {
        let config = RealtimeConfig {
            probe_interval,
            base_delay,
            max_reconnect_attempts: 5,
        };
        ConnectionMonitor::new(probe, &config)
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_waits_base_delay_times_attempt() {
        let probe = Arc::new(MockProbe::default());
        let monitor = monitor_with(probe.clone(), 3600, 50);
        monitor.check_connection().await;

        for attempt in 1..=3u32 {
            let started = tokio::time::Instant::now();
            assert!(!monitor.reconnect().await);
            let waited = started.elapsed();
            let expected = Duration::from_millis(50) * attempt;
            assert!(waited >= expected, "attempt {attempt} waited {waited:?}");
            assert!(waited < expected + Duration::from_millis(5), "attempt {attempt} waited {waited:?}");
        }
        assert_eq!(probe.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_loop_probes_every_interval_until_destroyed() {
        let probe = Arc::new(MockProbe::default());
        let monitor = monitor_with(probe.clone(), 10, 1);

        monitor.start();
        tokio::time::sleep(Duration::from_secs(25)).await;
        // ticks at 0s, 10s and 20s
        assert_eq!(probe.calls.load(Ordering::SeqCst), 3);

        monitor.destroy();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(probe.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_probe_interval_still_probes() {
        let probe = Arc::new(MockProbe::default());
        let monitor = monitor_with(probe.clone(), 0, 1);

        monitor.start();
        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert!(probe.calls.load(Ordering::SeqCst) >= 2);
        assert!(!monitor.snapshot().is_connected);
        monitor.destroy();
    }
}
