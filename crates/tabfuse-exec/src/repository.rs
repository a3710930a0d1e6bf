//! Task repository: the durable home of `Task` records.
//!
//! Status writes are validated against the task state machine, so a
//! repository never holds a task that moved backwards or skipped a stage.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tabfuse_core::id::TaskId;
use tabfuse_core::task::{DataSourceSpec, Task, TaskStatus};

use crate::error::{ExecError, Result};

pub trait TaskRepository: Send + Sync {
    /// Store a new `Pending` task and return its id.
    fn create(&self, name: &str, data_sources: Vec<DataSourceSpec>) -> Result<TaskId>;

    fn get(&self, id: TaskId) -> Result<Option<Task>>;

    /// Move a task to `status`. The write is complete when this returns.
    fn set_status(&self, id: TaskId, status: TaskStatus) -> Result<Task>;

    /// Move a task to `Failed` and record why.
    fn fail(&self, id: TaskId, reason: &str) -> Result<Task>;

    /// Tasks in creation order, optionally only those in `status`.
    fn list(&self, status: Option<TaskStatus>) -> Result<Vec<Task>>;
}

#[derive(Default)]
struct Inner {
    next_id: u64,
    tasks: BTreeMap<TaskId, Task>,
}

/// In-memory repository. Ids are assigned sequentially.
#[derive(Clone)]
pub struct MemoryTaskRepository {
    inner: Arc<RwLock<Inner>>,
}

impl Default for MemoryTaskRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTaskRepository {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// First id handed out is `first`; useful when results from an earlier
    /// run already occupy lower ids in a file store.
    pub fn starting_at(first: u64) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                next_id: first,
                tasks: BTreeMap::new(),
            })),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn update(&self, id: TaskId, f: impl FnOnce(&mut Task) -> Result<()>) -> Result<Task> {
        let mut inner = self.inner.write();
        let task = inner.tasks.get_mut(&id).ok_or(ExecError::TaskNotFound(id))?;
        f(task)?;
        Ok(task.clone())
    }
}

impl TaskRepository for MemoryTaskRepository {
    fn create(&self, name: &str, data_sources: Vec<DataSourceSpec>) -> Result<TaskId> {
        let mut inner = self.inner.write();
        let id = TaskId::new(inner.next_id);
        inner.next_id += 1;
        inner.tasks.insert(id, Task::new(id, name, data_sources));
        Ok(id)
    }

    fn get(&self, id: TaskId) -> Result<Option<Task>> {
        Ok(self.inner.read().tasks.get(&id).cloned())
    }

    fn set_status(&self, id: TaskId, status: TaskStatus) -> Result<Task> {
        self.update(id, |task| {
            task.status.validate_transition(id, status)?;
            task.status = status;
            Ok(())
        })
    }

    fn fail(&self, id: TaskId, reason: &str) -> Result<Task> {
        self.update(id, |task| {
            task.status.validate_transition(id, TaskStatus::Failed)?;
            task.status = TaskStatus::Failed;
            task.failure_reason = Some(reason.to_string());
            Ok(())
        })
    }

    fn list(&self, status: Option<TaskStatus>) -> Result<Vec<Task>> {
        let inner = self.inner.read();
        Ok(inner
            .tasks
            .values()
            .filter(|t| status.map_or(true, |s| t.status == s))
            .cloned()
            .collect())
    }
}
