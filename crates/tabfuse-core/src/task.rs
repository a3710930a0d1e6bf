//! Task model: the submitted merge request and its lifecycle status.
//!
//! Field names on the wire follow the submission payload
//! (`selectedSource`, `selectedFields`, `fieldFilters`).
//!
//! # State machine
//!
//! ```text
//! Pending -> FetchingData -> MergingData -> Completed
//!                 |               |
//!                 +---------------+--> Failed
//! ```
//!
//! Transitions only move forward; terminal states accept nothing.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};
use crate::id::TaskId;
use crate::types::parse_number;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    FetchingData,
    MergingData,
    Completed,
    Failed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 5] = [
        TaskStatus::Pending,
        TaskStatus::FetchingData,
        TaskStatus::MergingData,
        TaskStatus::Completed,
        TaskStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::FetchingData => "fetching_data",
            TaskStatus::MergingData => "merging_data",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    /// Forward-only transitions. Self-transitions are rejected.
    pub fn can_transition_to(&self, next: &TaskStatus) -> bool {
        use TaskStatus::*;

        matches!(
            (self, next),
            (Pending, FetchingData)
                | (FetchingData, MergingData)
                | (MergingData, Completed)
                | (Pending | FetchingData | MergingData, Failed)
        )
    }

    pub fn validate_transition(&self, task_id: TaskId, next: TaskStatus) -> Result<()> {
        if self.can_transition_to(&next) {
            Ok(())
        } else {
            Err(Error::InvalidTransition {
                task_id,
                from: *self,
                to: next,
            })
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        TaskStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == s.trim())
            .ok_or_else(|| Error::Config(format!("unknown task status '{s}'")))
    }
}

/// A registered merge task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub data_sources: Vec<DataSourceSpec>,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn new(id: TaskId, name: impl Into<String>, data_sources: Vec<DataSourceSpec>) -> Self {
        Self {
            id,
            name: name.into(),
            data_sources,
            status: TaskStatus::Pending,
            failure_reason: None,
            created_at: Utc::now(),
        }
    }
}

/// One declared source of a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceSpec {
    /// File name under the data directory.
    #[serde(rename = "selectedSource")]
    pub source: String,
    /// Empty means every column.
    #[serde(default)]
    pub selected_fields: Vec<String>,
    #[serde(default)]
    pub field_filters: BTreeMap<String, FieldFilter>,
}

impl DataSourceSpec {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            selected_fields: Vec::new(),
            field_filters: BTreeMap::new(),
        }
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_filter(mut self, field: impl Into<String>, filter: FieldFilter) -> Self {
        self.field_filters.insert(field.into(), filter);
        self
    }
}

/// Per-field predicate.
///
/// On the wire the variant is chosen by key presence: `from`/`to` select the
/// numeric range, `values` selects the categorical match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFieldFilter", into = "RawFieldFilter")]
pub enum FieldFilter {
    NumericRange { from: Option<f64>, to: Option<f64> },
    CategoricalValues { values: BTreeSet<String> },
}

impl FieldFilter {
    pub fn range(from: Option<f64>, to: Option<f64>) -> Self {
        FieldFilter::NumericRange { from, to }
    }

    pub fn values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldFilter::CategoricalValues {
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// A bound as written by clients: a number, a numeric string, `""`, or `null`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawBound {
    Num(f64),
    Text(String),
    Unset,
}

impl RawBound {
    fn resolve(self, key: &str) -> std::result::Result<Option<f64>, String> {
        match self {
            RawBound::Num(v) if v.is_finite() => Ok(Some(v)),
            RawBound::Num(v) => Err(format!("`{key}` bound {v} is not finite")),
            RawBound::Text(s) if s.trim().is_empty() => Ok(None),
            RawBound::Text(s) => parse_number(&s)
                .map(Some)
                .ok_or_else(|| format!("`{key}` bound '{s}' is not a number")),
            RawBound::Unset => Ok(None),
        }
    }
}

// Distinguishes an absent key from an explicit `null`.
fn present<'de, D>(d: D) -> std::result::Result<Option<RawBound>, D::Error>
where
    D: Deserializer<'de>,
{
    RawBound::deserialize(d).map(Some)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawFieldFilter {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    from: Option<RawBound>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    to: Option<RawBound>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    values: Option<Vec<String>>,
}

impl TryFrom<RawFieldFilter> for FieldFilter {
    type Error = String;

    fn try_from(raw: RawFieldFilter) -> std::result::Result<Self, Self::Error> {
        if raw.from.is_some() || raw.to.is_some() {
            let from = raw.from.map(|b| b.resolve("from")).transpose()?.flatten();
            let to = raw.to.map(|b| b.resolve("to")).transpose()?.flatten();
            return Ok(FieldFilter::NumericRange { from, to });
        }
        match raw.values {
            Some(values) => Ok(FieldFilter::CategoricalValues {
                values: values.into_iter().collect(),
            }),
            None => Err("field filter must declare `from`/`to` or `values`".to_string()),
        }
    }
}

impl From<FieldFilter> for RawFieldFilter {
    fn from(filter: FieldFilter) -> Self {
        let bound = |b: Option<f64>| Some(b.map(RawBound::Num).unwrap_or(RawBound::Unset));
        match filter {
            FieldFilter::NumericRange { from, to } => RawFieldFilter {
                from: bound(from),
                to: bound(to),
                values: None,
            },
            FieldFilter::CategoricalValues { values } => RawFieldFilter {
                from: None,
                to: None,
                values: Some(values.into_iter().collect()),
            },
        }
    }
}
