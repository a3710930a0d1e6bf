//! Convenient re-exports for downstream crates.

pub use crate::config::ServiceConfig;
pub use crate::error::{Error, Result};
pub use crate::hash::{table_digest, Hash256};
pub use crate::id::TaskId;
pub use crate::record::{ColumnInfo, MergedRecord};
pub use crate::schema::{ColumnKind, Field};
pub use crate::task::{DataSourceSpec, FieldFilter, Task, TaskStatus};
pub use crate::types::{Column, Scalar, Table};
