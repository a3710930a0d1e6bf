use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tabfuse_core::id::TaskId;
use tabfuse_core::record::MergedRecord;

use super::{wanted, ResultStore};
use crate::error::{Error, Result};

/// In-memory store; one immutable record vector per task.
#[derive(Clone, Default)]
pub struct MemoryResultStore {
    tasks: Arc<RwLock<BTreeMap<TaskId, Arc<Vec<MergedRecord>>>>>,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tasks.read().values().map(|r| r.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResultStore for MemoryResultStore {
    fn write_task(&self, task_id: TaskId, records: Vec<MergedRecord>) -> Result<()> {
        let mut tasks = self.tasks.write();
        if tasks.contains_key(&task_id) {
            return Err(Error::AlreadyPersisted(task_id));
        }
        tasks.insert(task_id, Arc::new(records));
        Ok(())
    }

    fn records(&self, columns: &[String], task: Option<TaskId>) -> Result<Vec<MergedRecord>> {
        // snapshot under the lock, filter outside it
        let snapshot: Vec<Arc<Vec<MergedRecord>>> = {
            let tasks = self.tasks.read();
            match task {
                Some(id) => tasks.get(&id).cloned().into_iter().collect(),
                None => tasks.values().cloned().collect(),
            }
        };
        Ok(snapshot
            .iter()
            .flat_map(|recs| recs.iter())
            .filter(|r| wanted(columns, r))
            .cloned()
            .collect())
    }

    fn contains_task(&self, task_id: TaskId) -> Result<bool> {
        Ok(self.tasks.read().contains_key(&task_id))
    }

    fn max_task_id(&self) -> Result<Option<TaskId>> {
        Ok(self.tasks.read().keys().next_back().copied())
    }
}
