//! Long-format ("one cell per record") representation of merged results.
//!
//! Every cell of a merged table becomes one `MergedRecord`, nulls included:
//! a gap introduced by the outer join is stored with `value: None` rather
//! than omitted, so pivoting back always sees the full column set per row.

use serde::{Deserialize, Serialize};

use crate::id::TaskId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedRecord {
    pub task_id: TaskId,
    pub row_id: u64,
    pub column_name: String,
    pub column_value: Option<String>,
    pub is_categorical: bool,
}

/// A column name seen in the store together with its categorical flag.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub is_categorical: bool,
}
