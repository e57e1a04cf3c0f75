#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use taskpulse::db::db::{Db, DB_FILE_NAME};
    use taskpulse::db::local::LocalStore;
    use taskpulse::db::tasks::{TaskFilter, Tasks};
    use taskpulse::libs::data_storage::DataStorage;
    use taskpulse::libs::task::{NewTask, TaskStatus, TimerStatus};
    use tempfile::TempDir;
    use test_context::{test_context, TestContext};

    struct TaskTestContext {
        _temp_dir: TempDir,
    }

    impl TestContext for TaskTestContext {
        fn setup() -> Self {
            let temp_dir = tempfile::tempdir().unwrap();
            std::env::set_var("HOME", temp_dir.path());
            std::env::set_var("LOCALAPPDATA", temp_dir.path());
            TaskTestContext { _temp_dir: temp_dir }
        }
    }

    fn memory_tasks() -> Tasks {
        Tasks::new(Arc::new(LocalStore::in_memory().unwrap()))
    }

    #[test_context(TaskTestContext)]
    #[test]
    fn test_tasks_persist_in_data_directory(_ctx: &mut TaskTestContext) {
        let id = {
            let tasks = Tasks::new(Arc::new(LocalStore::new(Db::new().unwrap())));
            tasks.insert(&NewTask::new("Persisted", "", None)).unwrap().id
        };
        assert!(DataStorage::new().get_path(DB_FILE_NAME).unwrap().exists());

        let reopened = Tasks::new(Arc::new(LocalStore::open().unwrap()));
        let task = reopened.get(id).unwrap().unwrap();
        assert_eq!(task.name, "Persisted");
    }

    #[test]
    fn test_new_task_defaults() {
        let tasks = memory_tasks();
        let task = tasks.insert(&NewTask::new("Storyboard", "scene 4", Some("u-1"))).unwrap();

        assert!(task.id > 0);
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.timer.timer_status, TimerStatus::Idle);
        assert_eq!(task.timer.elapsed_time, 0);
        assert_eq!(task.timer.timer_start_time, None);
        assert_eq!(task.comment.as_deref(), Some("scene 4"));
        assert!(task.created_at.is_some());
    }

    #[test]
    fn test_fetch_filters() {
        let tasks = memory_tasks();
        let a = tasks.insert(&NewTask::new("A", "", Some("u-1"))).unwrap();
        let b = tasks.insert(&NewTask::new("B", "", Some("u-2"))).unwrap();
        let c = tasks.insert(&NewTask::new("C", "", None)).unwrap();

        assert_eq!(tasks.fetch(TaskFilter::All).unwrap().len(), 3);

        let mine = tasks.fetch(TaskFilter::ByOwner("u-1".to_string())).unwrap();
        assert_eq!(mine, vec![a.clone()]);

        let picked: Vec<i64> = tasks.fetch(TaskFilter::ByIds(vec![b.id, c.id])).unwrap().iter().map(|t| t.id).collect();
        assert_eq!(picked, vec![b.id, c.id]);
    }

    #[test]
    fn test_delete_returns_removed_task() {
        let tasks = memory_tasks();
        let task = tasks.insert(&NewTask::new("Temp", "", None)).unwrap();

        let deleted = tasks.delete(task.id).unwrap();
        assert_eq!(deleted, task);
        assert!(tasks.get(task.id).unwrap().is_none());
        assert!(tasks.delete(task.id).is_err());
    }
}
