//! Task Queue & Worker.
//!
//! `TaskService` owns an unbounded FIFO of task ids and exactly one worker
//! that drains it in submission order, one task to completion before the
//! next. Stages run on the blocking pool; the worker awaits each task, so
//! tasks never overlap.
//!
//! `shutdown` enqueues a sentinel behind everything already submitted, waits
//! for the worker to drain up to it, and closes the queue for good.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use tabfuse_core::config::ServiceConfig;
use tabfuse_core::id::TaskId;
use tabfuse_core::record::ColumnInfo;
use tabfuse_core::task::{Task, TaskStatus};
use tabfuse_core::types::Table;
use tabfuse_io::{open_store, FsCatalog, ResultStore, SourceCatalog, SourceInfo};
use tabfuse_operators::read_back;

use crate::error::{ExecError, Result};
use crate::notifier::{StatusEvent, StatusNotifier};
use crate::pipeline::Pipeline;
use crate::repository::{MemoryTaskRepository, TaskRepository};
use crate::submission::{ReadBackQuery, TaskRequest};

#[derive(Debug)]
enum QueueMessage {
    Run(TaskId),
    Shutdown,
}

pub struct TaskService {
    repo: Arc<dyn TaskRepository>,
    store: Arc<dyn ResultStore>,
    catalog: Arc<dyn SourceCatalog>,
    notifier: StatusNotifier,
    fuzzy_threshold: u8,
    // None once shut down
    queue: Mutex<Option<mpsc::UnboundedSender<QueueMessage>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl TaskService {
    /// Build collaborators from `config` and start the worker.
    ///
    /// Must be called inside a tokio runtime.
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        config.validate()?;
        let catalog = Arc::new(FsCatalog::new(config.data_dir.clone(), config.type_sample_rows));
        let store = open_store(config)?;
        let repo = Arc::new(MemoryTaskRepository::starting_at(next_free_id(store.as_ref())?));
        Ok(Self::start(config, catalog, store, repo))
    }

    /// Start the worker over explicit collaborators.
    ///
    /// Must be called inside a tokio runtime.
    pub fn start(
        config: &ServiceConfig,
        catalog: Arc<dyn SourceCatalog>,
        store: Arc<dyn ResultStore>,
        repo: Arc<dyn TaskRepository>,
    ) -> Self {
        let notifier = StatusNotifier::new(config.notify_capacity);
        let pipeline = Arc::new(Pipeline::new(
            Arc::clone(&catalog),
            Arc::clone(&store),
            Arc::clone(&repo),
            notifier.clone(),
            config.fuzzy_threshold,
        ));

        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(worker_loop(rx, pipeline));

        Self {
            repo,
            store,
            catalog,
            notifier,
            fuzzy_threshold: config.fuzzy_threshold,
            queue: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Append `id` to the queue. Never blocks.
    pub fn enqueue(&self, id: TaskId) -> Result<()> {
        let queue = self.queue.lock();
        let tx = queue.as_ref().ok_or(ExecError::QueueClosed)?;
        tx.send(QueueMessage::Run(id))
            .map_err(|_| ExecError::QueueClosed)
    }

    /// Validate, store as `Pending`, enqueue.
    ///
    /// The queue lock is held from the open check through the send, so a
    /// concurrent `shutdown` either sees the task queued or no task at all.
    pub fn submit(&self, request: TaskRequest) -> Result<TaskId> {
        request.validate()?;
        let queue = self.queue.lock();
        let tx = queue.as_ref().ok_or(ExecError::QueueClosed)?;
        let id = self.repo.create(&request.task_name, request.data_sources)?;
        if tx.send(QueueMessage::Run(id)).is_err() {
            // worker is gone; never leave the task pending
            let reason = ExecError::QueueClosed.to_string();
            self.repo.fail(id, &reason)?;
            self.notifier
                .publish(StatusEvent::new(id, TaskStatus::Failed).with_reason(reason));
            tracing::error!(task_id = %id, "worker gone; task failed at submission");
            return Err(ExecError::QueueClosed);
        }
        tracing::info!(task_id = %id, name = %request.task_name, "task submitted");
        Ok(id)
    }

    pub fn is_accepting(&self) -> bool {
        self.queue.lock().is_some()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.notifier.subscribe()
    }

    pub fn task(&self, id: TaskId) -> Result<Option<Task>> {
        self.repo.get(id)
    }

    pub fn list_tasks(&self, status: Option<TaskStatus>) -> Result<Vec<Task>> {
        self.repo.list(status)
    }

    pub fn sources(&self) -> Result<Vec<SourceInfo>> {
        Ok(self.catalog.list_sources()?)
    }

    /// Columns available for read-back.
    pub fn fields(&self) -> Result<Vec<ColumnInfo>> {
        Ok(self.store.columns()?)
    }

    pub fn read_back(&self, query: &ReadBackQuery) -> Result<Table> {
        query_results(self.store.as_ref(), query, self.fuzzy_threshold)
    }

    /// Drain everything enqueued so far, then stop the worker.
    /// Later calls return immediately.
    pub async fn shutdown(&self) -> Result<()> {
        let tx = self.queue.lock().take();
        if let Some(tx) = tx {
            // the worker owns the receiver until it exits
            let _ = tx.send(QueueMessage::Shutdown);
        }
        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            handle
                .await
                .map_err(|e| ExecError::Worker(e.to_string()))?;
            tracing::info!("worker stopped");
        }
        Ok(())
    }
}

/// Pivot read-back over any result store.
pub fn query_results(
    store: &dyn ResultStore,
    query: &ReadBackQuery,
    fuzzy_threshold: u8,
) -> Result<Table> {
    let records = store.records(&query.fields, query.task_id)?;
    Ok(read_back(
        &records,
        &query.fields,
        &query.field_filters,
        fuzzy_threshold,
    ))
}

/// First id not used by results already in `store`.
fn next_free_id(store: &dyn ResultStore) -> Result<u64> {
    Ok(store.max_task_id()?.map_or(1, |m| m.get() + 1))
}

async fn worker_loop(mut rx: mpsc::UnboundedReceiver<QueueMessage>, pipeline: Arc<Pipeline>) {
    tracing::info!(version = tabfuse_core::VERSION, "worker started");
    while let Some(msg) = rx.recv().await {
        let id = match msg {
            QueueMessage::Run(id) => id,
            QueueMessage::Shutdown => break,
        };
        let p = Arc::clone(&pipeline);
        match tokio::task::spawn_blocking(move || p.run(id)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => tracing::error!(task_id = %id, error = %e, "task aborted"),
            Err(e) => tracing::error!(task_id = %id, error = %e, "task panicked"),
        }
    }
}
