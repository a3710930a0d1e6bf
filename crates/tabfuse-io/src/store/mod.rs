//! Long-format result stores.
//!
//! A task's records are written in one call and become visible to readers
//! all at once; a store never exposes a partial write. Records are never
//! updated after being written, so a second write for the same task is
//! rejected with `AlreadyPersisted`.

mod fs;
mod memory;

pub use fs::FsResultStore;
pub use memory::MemoryResultStore;

use std::collections::BTreeSet;
use std::sync::Arc;

use tabfuse_core::config::ServiceConfig;
use tabfuse_core::id::TaskId;
use tabfuse_core::record::{ColumnInfo, MergedRecord};

use crate::error::Result;

pub trait ResultStore: Send + Sync {
    /// Persist every record of one task atomically.
    fn write_task(&self, task_id: TaskId, records: Vec<MergedRecord>) -> Result<()>;

    /// Records whose column is in `columns` (all columns when empty),
    /// optionally restricted to one task. Ordered by task id, then write order.
    fn records(&self, columns: &[String], task: Option<TaskId>) -> Result<Vec<MergedRecord>>;

    /// Distinct `(column, is_categorical)` pairs across all records, sorted.
    fn columns(&self) -> Result<Vec<ColumnInfo>> {
        let set: BTreeSet<ColumnInfo> = self
            .records(&[], None)?
            .into_iter()
            .map(|r| ColumnInfo {
                name: r.column_name,
                is_categorical: r.is_categorical,
            })
            .collect();
        Ok(set.into_iter().collect())
    }

    fn contains_task(&self, task_id: TaskId) -> Result<bool>;

    /// Largest persisted task id, if any task has been written.
    fn max_task_id(&self) -> Result<Option<TaskId>>;
}

/// File store under `results_dir` when configured, otherwise in memory.
pub fn open_store(cfg: &ServiceConfig) -> Result<Arc<dyn ResultStore>> {
    match &cfg.results_dir {
        Some(dir) => Ok(Arc::new(FsResultStore::open(dir)?)),
        None => Ok(Arc::new(MemoryResultStore::new())),
    }
}

pub(crate) fn wanted(columns: &[String], record: &MergedRecord) -> bool {
    columns.is_empty() || columns.iter().any(|c| *c == record.column_name)
}
