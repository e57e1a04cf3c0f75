use super::local::LocalStore;
use crate::libs::task::{NewTask, Task, TASKS_TABLE};
use anyhow::Result;
use std::sync::Arc;

/// Typed task access over the generic local store.
pub struct Tasks {
    store: Arc<LocalStore>,
}

#[derive(Debug, Clone)]
pub enum TaskFilter {
    All,
    ByOwner(String),
    ByIds(Vec<i64>),
}

impl Tasks {
    pub fn new(store: Arc<LocalStore>) -> Self {
        Tasks { store }
    }

    pub fn insert(&self, task: &NewTask) -> Result<Task> {
        let row = self.store.insert(TASKS_TABLE, &task.to_record()?)?;
        Ok(Task::from_record(row)?)
    }

    pub fn get(&self, id: i64) -> Result<Option<Task>> {
        match self.store.fetch(TASKS_TABLE, id)? {
            Some(row) => Ok(Some(Task::from_record(row)?)),
            None => Ok(None),
        }
    }

    pub fn fetch(&self, filter: TaskFilter) -> Result<Vec<Task>> {
        let tasks = self
            .store
            .list(TASKS_TABLE)?
            .into_iter()
            .map(Task::from_record)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(match filter {
            TaskFilter::All => tasks,
            TaskFilter::ByOwner(owner) => tasks.into_iter().filter(|t| t.owner_id.as_deref() == Some(owner.as_str())).collect(),
            TaskFilter::ByIds(ids) => tasks.into_iter().filter(|t| ids.contains(&t.id)).collect(),
        })
    }

    pub fn delete(&self, id: i64) -> Result<Task> {
        let row = self.store.delete(TASKS_TABLE, id)?;
        Ok(Task::from_record(row)?)
    }
}
