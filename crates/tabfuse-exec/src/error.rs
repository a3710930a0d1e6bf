use tabfuse_core::id::TaskId;
use tabfuse_operators::OpError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExecError>;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error(transparent)]
    Core(#[from] tabfuse_core::error::Error),

    #[error(transparent)]
    Io(#[from] tabfuse_io::Error),

    #[error(transparent)]
    Operator(#[from] OpError),

    #[error("invalid submission: {0}")]
    Validation(#[from] ValidationError),

    #[error("malformed payload: {0}")]
    Payload(String),

    #[error("task {0} not found")]
    TaskNotFound(TaskId),

    #[error("no data source could be loaded")]
    NoSources,

    /// Records were written but the final status was not; the results stay.
    #[error("results persisted but completion was not recorded: {0}")]
    CompletionNotRecorded(Box<ExecError>),

    #[error("task queue is closed")]
    QueueClosed,

    #[error("worker: {0}")]
    Worker(String),
}

/// Rejections raised before a task is created.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("task name is required")]
    MissingName,

    #[error("at least one data source is required")]
    NoDataSources,

    #[error("data source #{index} has no source name")]
    EmptySourceName { index: usize },
}
