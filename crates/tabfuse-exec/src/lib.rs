#![forbid(unsafe_code)]
//! tabfuse-exec: the background task pipeline.
//!
//! - `service`: `TaskService`, the FIFO queue plus its single sequential worker.
//! - `pipeline`: load + filter -> merge -> persist for one task, with status
//!   updates persisted before they are broadcast.
//! - `repository`: the task store the worker mutates.
//! - `notifier`: fire-and-forget status broadcast.
//! - `submission`: task request and read-back query payloads.

pub mod error;
pub mod metrics;
pub mod notifier;
pub mod pipeline;
pub mod repository;
pub mod service;
pub mod submission;

pub use error::{ExecError, Result, ValidationError};
pub use notifier::{StatusEvent, StatusNotifier};
pub use pipeline::{Pipeline, RunReport};
pub use repository::{MemoryTaskRepository, TaskRepository};
pub use service::{query_results, TaskService};
pub use submission::{parse_query, parse_task_request, ReadBackQuery, TaskRequest};
