use thiserror::Error;

#[derive(Debug, Error)]
pub enum OpError {
    #[error("no column is shared by all sources ({})", sources.join(", "))]
    EmptyJoinKey { sources: Vec<String> },

    #[error("nothing to merge: no input tables")]
    NoInputs,

    #[error("schema error: {0}")]
    Schema(String),
}

impl From<tabfuse_core::error::Error> for OpError {
    fn from(e: tabfuse_core::error::Error) -> Self {
        OpError::Schema(e.to_string())
    }
}
