use std::path::PathBuf;

use tabfuse_core::id::TaskId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("source '{source_name}' not found at {}", path.display())]
    SourceMissing { source_name: String, path: PathBuf },

    #[error("source '{source_name}' has unsupported format '{extension}'")]
    UnsupportedFormat {
        source_name: String,
        extension: String,
    },

    #[error("source '{source_name}' has no column '{column}'")]
    ColumnMissing { source_name: String, column: String },

    #[error("results for task {0} are already persisted")]
    AlreadyPersisted(TaskId),

    #[error("malformed input: {0}")]
    Malformed(String),

    #[error("store: {0}")]
    Store(String),

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] tabfuse_core::error::Error),
}

