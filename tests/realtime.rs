#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use taskpulse::db::local::LocalStore;
    use taskpulse::db::store::{ChangeFeed, RawChange, RawChangeCallback, Record, StoreError, SubscriptionHandle};
    use taskpulse::libs::realtime::{ChangeEvent, ChangeEventRegistry, ChangeEventType};
    use test_context::{test_context, TestContext};

    /// Feed that records subscriptions and lets the test push raw changes.
    #[derive(Default)]
    struct MockFeed {
        created: AtomicUsize,
        removed: AtomicUsize,
        fail: bool,
        callbacks: Mutex<HashMap<u64, Arc<dyn Fn(RawChange) + Send + Sync>>>,
    }

    impl MockFeed {
        fn push(&self, event_type: &str, new: Option<Record>, old: Option<Record>) {
            let callbacks: Vec<_> = self.callbacks.lock().values().cloned().collect();
            for callback in callbacks {
                callback(RawChange {
                    event_type: event_type.to_string(),
                    new: new.clone(),
                    old: old.clone(),
                });
            }
        }
    }

    impl ChangeFeed for MockFeed {
        fn subscribe(&self, table: &str, on_event: RawChangeCallback) -> Result<SubscriptionHandle, StoreError> {
            if self.fail {
                return Err(StoreError::Subscription {
                    table: table.to_string(),
                    reason: "channel error".to_string(),
                });
            }
            let id = self.created.fetch_add(1, Ordering::SeqCst) as u64 + 1;
            self.callbacks.lock().insert(id, Arc::from(on_event));
            Ok(SubscriptionHandle(id))
        }

        fn unsubscribe(&self, handle: SubscriptionHandle) {
            if self.callbacks.lock().remove(&handle.0).is_some() {
                self.removed.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    struct RegistryContext {
        feed: Arc<MockFeed>,
        registry: ChangeEventRegistry,
    }

    impl TestContext for RegistryContext {
        fn setup() -> Self {
            let feed = Arc::new(MockFeed::default());
            let registry = ChangeEventRegistry::new(feed.clone());
            RegistryContext { feed, registry }
        }
    }

    fn record(value: serde_json::Value) -> Option<Record> {
        value.as_object().cloned()
    }

    #[test_context(RegistryContext)]
    #[test]
    fn test_fan_out_in_registration_order(ctx: &mut RegistryContext) {
        let order = Arc::new(Mutex::new(Vec::new()));
        let handles: Vec<_> = (1..=3)
            .map(|n| {
                let order = order.clone();
                ctx.registry.register_listener("tasks", move |event: &ChangeEvent| {
                    order.lock().push((n, event.event_type, event.record_id()));
                })
            })
            .collect();

        assert_eq!(ctx.feed.created.load(Ordering::SeqCst), 1);
        ctx.feed.push("UPDATE", record(json!({ "id": 7, "name": "a" })), record(json!({ "id": 7 })));

        let expected: Vec<_> = (1..=3).map(|n| (n, ChangeEventType::Update, Some(7))).collect();
        assert_eq!(*order.lock(), expected);

        for handle in handles {
            handle.unsubscribe();
        }
        assert_eq!(ctx.feed.removed.load(Ordering::SeqCst), 1);
    }

    #[test_context(RegistryContext)]
    #[test]
    fn test_subscription_reference_counting(ctx: &mut RegistryContext) {
        let first = ctx.registry.register_listener("tasks", |_| {});
        let second = ctx.registry.register_listener("tasks", |_| {});
        assert_eq!(ctx.feed.created.load(Ordering::SeqCst), 1);
        assert_eq!(ctx.registry.listener_count("tasks"), 2);

        first.unsubscribe();
        assert_eq!(ctx.feed.removed.load(Ordering::SeqCst), 0);
        assert!(ctx.registry.is_subscribed("tasks"));

        second.unsubscribe();
        assert_eq!(ctx.feed.removed.load(Ordering::SeqCst), 1);
        assert!(!ctx.registry.is_subscribed("tasks"));
        assert_eq!(ctx.registry.listener_count("tasks"), 0);

        let third = ctx.registry.register_listener("tasks", |_| {});
        assert_eq!(ctx.feed.created.load(Ordering::SeqCst), 2);
        third.unsubscribe();
    }

    #[test_context(RegistryContext)]
    #[test]
    fn test_tables_are_independent(ctx: &mut RegistryContext) {
        let tasks = ctx.registry.register_listener("tasks", |_| {});
        let projects = ctx.registry.register_listener("projects", |_| {});
        assert_eq!(ctx.feed.created.load(Ordering::SeqCst), 2);

        tasks.unsubscribe();
        assert!(ctx.registry.is_subscribed("projects"));
        assert_eq!(projects.table(), "projects");
        projects.unsubscribe();
    }

    #[test_context(RegistryContext)]
    #[test]
    fn test_same_callback_twice_is_called_twice(ctx: &mut RegistryContext) {
        let hits = Arc::new(AtomicUsize::new(0));
        let callback = {
            let hits = hits.clone();
            move |_: &ChangeEvent| {
                hits.fetch_add(1, Ordering::SeqCst);
            }
        };
        let a = ctx.registry.register_listener("tasks", callback.clone());
        let b = ctx.registry.register_listener("tasks", callback);

        ctx.feed.push("INSERT", record(json!({ "id": 1 })), None);
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        a.unsubscribe();
        ctx.feed.push("INSERT", record(json!({ "id": 2 })), None);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
        b.unsubscribe();
    }

    #[test_context(RegistryContext)]
    #[test]
    fn test_listener_may_unsubscribe_itself(ctx: &mut RegistryContext) {
        let slot: Arc<Mutex<Option<taskpulse::libs::realtime::ListenerHandle>>> = Arc::new(Mutex::new(None));
        let hits = Arc::new(AtomicUsize::new(0));

        let handle = {
            let slot = slot.clone();
            let hits = hits.clone();
            ctx.registry.register_listener("tasks", move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
                if let Some(handle) = slot.lock().take() {
                    handle.unsubscribe();
                }
            })
        };
        *slot.lock() = Some(handle);

        ctx.feed.push("DELETE", None, record(json!({ "id": 3 })));
        ctx.feed.push("DELETE", None, record(json!({ "id": 4 })));

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(ctx.feed.removed.load(Ordering::SeqCst), 1);
    }

    #[test_context(RegistryContext)]
    #[test]
    fn test_unknown_event_type_is_dropped(ctx: &mut RegistryContext) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let handle = ctx.registry.register_listener("tasks", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        ctx.feed.push("TRUNCATE", None, None);
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        ctx.feed.push("insert", record(json!({ "id": 1 })), record(json!({})));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        handle.unsubscribe();
    }

    #[test]
    fn test_failed_subscription_retries_on_next_registration() {
        let failing = Arc::new(MockFeed { fail: true, ..MockFeed::default() });
        let registry = ChangeEventRegistry::new(failing);

        let handle = registry.register_listener("tasks", |_| {});
        assert!(!registry.is_subscribed("tasks"));
        assert_eq!(registry.listener_count("tasks"), 1);
        handle.unsubscribe();
        assert_eq!(registry.listener_count("tasks"), 0);
    }

    #[test]
    fn test_local_store_drives_registry() {
        let store = Arc::new(LocalStore::in_memory().unwrap());
        let registry = ChangeEventRegistry::new(store.clone());
        let events = Arc::new(Mutex::new(Vec::new()));

        let sink = events.clone();
        let handle = registry.register_listener("tasks", move |event: &ChangeEvent| {
            sink.lock().push(event.clone());
        });
        assert_eq!(store.subscriber_count("tasks"), 1);

        let row = store.insert("tasks", json!({ "name": "Edit reel", "owner_id": "u-1" }).as_object().unwrap()).unwrap();
        let id = row["id"].as_i64().unwrap();
        store.delete("tasks", id).unwrap();

        {
            let events = events.lock();
            assert_eq!(events.len(), 2);
            assert_eq!(events[0].event_type, ChangeEventType::Insert);
            assert!(events[0].old_record.is_none());
            assert_eq!(events[1].event_type, ChangeEventType::Delete);
            assert_eq!(events[1].record_id(), Some(id));
            assert!(events[1].owned_by("owner_id", "u-1"));
            assert!(!events[1].owned_by("owner_id", "u-2"));
        }

        handle.unsubscribe();
        assert_eq!(store.subscriber_count("tasks"), 0);
    }
}
