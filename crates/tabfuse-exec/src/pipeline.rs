//! One task, start to finish: load + filter every source, merge, persist.
//!
//! Every status change is written to the repository first and broadcast
//! second, so a subscriber reacting to an event always reads the new status.
//!
//! Per-source problems (missing file, unknown format, unknown column,
//! unparsable content) skip that source. Merge and persist errors fail the
//! task; nothing is persisted for a failed task, with one exception: when
//! the records are written but the `Completed` status is not, the task ends
//! `Failed` with a `CompletionNotRecorded` reason and its records remain.

use std::sync::Arc;

use tabfuse_core::hash::{table_digest, Hash256};
use tabfuse_core::id::TaskId;
use tabfuse_core::task::{Task, TaskStatus};
use tabfuse_core::types::Table;
use tabfuse_io::{ResultStore, SourceCatalog};
use tabfuse_operators::{merge_tables, to_records, Filter};

use crate::error::{ExecError, Result};
use crate::metrics::{timed, StageTimings};
use crate::notifier::{StatusEvent, StatusNotifier};
use crate::repository::TaskRepository;

/// Outcome of one executed task.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub task_id: TaskId,
    pub status: TaskStatus,
    pub failure_reason: Option<String>,
    /// Sources that contributed a table, in declaration order.
    pub loaded_sources: Vec<String>,
    pub rows: usize,
    pub columns: usize,
    pub records: usize,
    pub digest: Option<Hash256>,
    pub timings: StageTimings,
}

impl RunReport {
    fn new(task_id: TaskId) -> Self {
        Self {
            task_id,
            status: TaskStatus::Pending,
            failure_reason: None,
            loaded_sources: Vec::new(),
            rows: 0,
            columns: 0,
            records: 0,
            digest: None,
            timings: StageTimings::default(),
        }
    }
}

pub struct Pipeline {
    pub(crate) catalog: Arc<dyn SourceCatalog>,
    pub(crate) store: Arc<dyn ResultStore>,
    pub(crate) repo: Arc<dyn TaskRepository>,
    pub(crate) notifier: StatusNotifier,
    pub(crate) fuzzy_threshold: u8,
}

impl Pipeline {
    pub fn new(
        catalog: Arc<dyn SourceCatalog>,
        store: Arc<dyn ResultStore>,
        repo: Arc<dyn TaskRepository>,
        notifier: StatusNotifier,
        fuzzy_threshold: u8,
    ) -> Self {
        Self {
            catalog,
            store,
            repo,
            notifier,
            fuzzy_threshold,
        }
    }

    /// Run task `id`. `Ok(None)` when the id is unknown or the task is not
    /// pending; both are logged and skipped.
    pub fn run(&self, id: TaskId) -> Result<Option<RunReport>> {
        let Some(task) = self.repo.get(id)? else {
            tracing::warn!(task_id = %id, "queued task not found; dropped");
            return Ok(None);
        };
        if task.status != TaskStatus::Pending {
            tracing::warn!(task_id = %id, status = %task.status, "queued task is not pending; skipped");
            return Ok(None);
        }

        tracing::info!(task_id = %id, name = %task.name, sources = task.data_sources.len(), "task started");
        let mut report = RunReport::new(id);

        match self.execute(&task, &mut report) {
            Ok(()) => {
                report.timings.emit(id);
                tracing::info!(
                    task_id = %id,
                    rows = report.rows,
                    columns = report.columns,
                    records = report.records,
                    digest = %report.digest.as_ref().map(Hash256::to_hex).unwrap_or_default(),
                    "task completed"
                );
            }
            Err(e) => {
                let reason = e.to_string();
                tracing::error!(task_id = %id, reason = %reason, "task failed");
                self.repo.fail(id, &reason)?;
                self.notifier
                    .publish(StatusEvent::new(id, TaskStatus::Failed).with_reason(reason.clone()));
                report.status = TaskStatus::Failed;
                report.failure_reason = Some(reason);
            }
        }
        Ok(Some(report))
    }

    fn execute(&self, task: &Task, report: &mut RunReport) -> Result<()> {
        let id = task.id;

        self.advance(id, TaskStatus::FetchingData)?;
        report.status = TaskStatus::FetchingData;
        let inputs = timed(&mut report.timings.fetch, || self.fetch(task));
        if inputs.is_empty() {
            return Err(ExecError::NoSources);
        }
        report.loaded_sources = inputs.iter().map(|(name, _)| name.clone()).collect();

        self.advance(id, TaskStatus::MergingData)?;
        report.status = TaskStatus::MergingData;
        let merged = timed(&mut report.timings.merge, || merge_tables(inputs))?;
        report.rows = merged.num_rows();
        report.columns = merged.num_columns();
        report.digest = Some(table_digest(&merged));

        let records = to_records(id, &merged);
        report.records = records.len();
        timed(&mut report.timings.persist, || self.store.write_task(id, records))?;

        // records are immutable once written; this failure cannot be rolled back
        self.advance(id, TaskStatus::Completed).map_err(|e| {
            tracing::error!(
                task_id = %id,
                records = report.records,
                error = %e,
                "results persisted but completion was not recorded"
            );
            ExecError::CompletionNotRecorded(Box::new(e))
        })?;
        report.status = TaskStatus::Completed;
        Ok(())
    }

    /// Load and filter each declared source; failures skip the source.
    fn fetch(&self, task: &Task) -> Vec<(String, Table)> {
        let mut out = Vec::with_capacity(task.data_sources.len());
        for spec in &task.data_sources {
            let table = match self.catalog.load(&spec.source, &spec.selected_fields) {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!(task_id = %task.id, source = %spec.source, error = %e, "source skipped");
                    continue;
                }
            };
            let loaded = table.num_rows();
            let outcome =
                Filter::new(spec.field_filters.clone(), self.fuzzy_threshold).apply(table);
            for field in &outcome.skipped {
                tracing::warn!(
                    task_id = %task.id,
                    source = %spec.source,
                    field = %field,
                    "filter on absent column ignored"
                );
            }
            tracing::debug!(
                task_id = %task.id,
                source = %spec.source,
                loaded,
                kept = outcome.table.num_rows(),
                "source filtered"
            );
            out.push((spec.source.clone(), outcome.table));
        }
        out
    }

    fn advance(&self, id: TaskId, status: TaskStatus) -> Result<()> {
        self.repo.set_status(id, status)?;
        self.notifier.publish(StatusEvent::new(id, status));
        tracing::info!(task_id = %id, status = %status, "status changed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryTaskRepository;
    use tabfuse_core::task::{DataSourceSpec, FieldFilter};
    use tabfuse_core::types::{Column, Scalar};
    use tabfuse_io::{MemoryCatalog, MemoryResultStore};

    struct Fixture {
        pipeline: Pipeline,
        repo: MemoryTaskRepository,
        store: MemoryResultStore,
    }

    fn fixture() -> Fixture {
        let catalog = MemoryCatalog::new(10);
        catalog.insert(
            "a.csv",
            Table::new(vec![
                Column::inferred("id", vec![Scalar::Num(1.0), Scalar::Num(2.0)]),
                Column::inferred("make", vec![Scalar::Str("bmw".into()), Scalar::Str("audi".into())]),
                Column::inferred("price", vec![Scalar::Num(20000.0), Scalar::Num(30000.0)]),
            ])
            .unwrap(),
        );
        catalog.insert(
            "b.csv",
            Table::new(vec![
                Column::inferred("id", vec![Scalar::Num(1.0), Scalar::Num(3.0)]),
                Column::inferred("color", vec![Scalar::Str("black".into()), Scalar::Str("white".into())]),
            ])
            .unwrap(),
        );
        catalog.insert(
            "c.csv",
            Table::new(vec![Column::inferred("shade", vec![Scalar::Str("red".into())])]).unwrap(),
        );
        let repo = MemoryTaskRepository::new();
        let store = MemoryResultStore::new();
        let pipeline = Pipeline::new(
            Arc::new(catalog),
            Arc::new(store.clone()),
            Arc::new(repo.clone()),
            StatusNotifier::new(16),
            80,
        );
        Fixture {
            pipeline,
            repo,
            store,
        }
    }

    #[test]
    fn completes_and_persists_every_cell() {
        let f = fixture();
        let id = f
            .repo
            .create("t", vec![DataSourceSpec::new("a.csv"), DataSourceSpec::new("b.csv")])
            .unwrap();
        let report = f.pipeline.run(id).unwrap().unwrap();
        assert_eq!(report.status, TaskStatus::Completed);
        assert_eq!((report.rows, report.columns), (3, 4));
        assert_eq!(report.records, 12);
        assert_eq!(f.store.len(), 12);
        assert_eq!(f.repo.get(id).unwrap().unwrap().status, TaskStatus::Completed);
    }

    #[test]
    fn filters_run_before_merge() {
        let f = fixture();
        let a = DataSourceSpec::new("a.csv").with_filter("price", FieldFilter::range(Some(25000.0), None));
        let id = f.repo.create("t", vec![a, DataSourceSpec::new("b.csv")]).unwrap();
        let report = f.pipeline.run(id).unwrap().unwrap();
        assert_eq!(report.rows, 3);
        let ids: Vec<_> = f
            .store
            .records(&["id".to_string()], Some(id))
            .unwrap()
            .into_iter()
            .filter_map(|r| r.column_value)
            .collect();
        assert_eq!(ids, vec!["2", "1", "3"]);
    }

    #[test]
    fn missing_sources_are_skipped() {
        let f = fixture();
        let id = f
            .repo
            .create("t", vec![DataSourceSpec::new("gone.csv"), DataSourceSpec::new("a.csv")])
            .unwrap();
        let report = f.pipeline.run(id).unwrap().unwrap();
        assert_eq!(report.status, TaskStatus::Completed);
        assert_eq!(report.loaded_sources, vec!["a.csv"]);
    }

    #[test]
    fn empty_join_key_fails_without_persisting() {
        let f = fixture();
        let id = f
            .repo
            .create("t", vec![DataSourceSpec::new("a.csv"), DataSourceSpec::new("c.csv")])
            .unwrap();
        let report = f.pipeline.run(id).unwrap().unwrap();
        assert_eq!(report.status, TaskStatus::Failed);
        assert!(report.failure_reason.unwrap().contains("no column is shared"));
        assert!(f.store.is_empty());
        let task = f.repo.get(id).unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task.failure_reason.is_some());
    }

    #[test]
    fn no_loadable_source_fails() {
        let f = fixture();
        let id = f.repo.create("t", vec![DataSourceSpec::new("gone.csv")]).unwrap();
        let report = f.pipeline.run(id).unwrap().unwrap();
        assert_eq!(report.status, TaskStatus::Failed);
        assert_eq!(report.failure_reason.as_deref(), Some("no data source could be loaded"));
    }

    /// Accepts every transition except the final one.
    struct NoCompletion(MemoryTaskRepository);

    impl TaskRepository for NoCompletion {
        fn create(&self, name: &str, data_sources: Vec<DataSourceSpec>) -> Result<TaskId> {
            self.0.create(name, data_sources)
        }

        fn get(&self, id: TaskId) -> Result<Option<Task>> {
            self.0.get(id)
        }

        fn set_status(&self, id: TaskId, status: TaskStatus) -> Result<Task> {
            if status == TaskStatus::Completed {
                return Err(ExecError::Worker("status store unavailable".into()));
            }
            self.0.set_status(id, status)
        }

        fn fail(&self, id: TaskId, reason: &str) -> Result<Task> {
            self.0.fail(id, reason)
        }

        fn list(&self, status: Option<TaskStatus>) -> Result<Vec<Task>> {
            self.0.list(status)
        }
    }

    #[test]
    fn unrecorded_completion_is_reported_distinctly() {
        let f = fixture();
        let repo = Arc::new(NoCompletion(f.repo.clone()));
        let pipeline = Pipeline::new(
            Arc::clone(&f.pipeline.catalog),
            Arc::new(f.store.clone()),
            repo.clone(),
            StatusNotifier::new(16),
            80,
        );
        let id = repo.create("t", vec![DataSourceSpec::new("a.csv")]).unwrap();
        let report = pipeline.run(id).unwrap().unwrap();

        assert_eq!(report.status, TaskStatus::Failed);
        let reason = report.failure_reason.unwrap();
        assert!(reason.starts_with("results persisted but completion was not recorded"));
        assert_eq!(f.store.len(), report.records);
        let task = repo.get(id).unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.failure_reason.as_deref(), Some(reason.as_str()));
    }

    #[test]
    fn unknown_and_non_pending_tasks_are_skipped() {
        let f = fixture();
        assert!(f.pipeline.run(TaskId::new(99)).unwrap().is_none());
        let id = f.repo.create("t", vec![DataSourceSpec::new("a.csv")]).unwrap();
        f.pipeline.run(id).unwrap();
        assert!(f.pipeline.run(id).unwrap().is_none());
    }
}
