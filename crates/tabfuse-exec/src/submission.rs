//! Submission payloads: new tasks and read-back queries.
//!
//! Field names follow the wire format clients already send, e.g.
//!
//! ```yaml
//! taskName: cars
//! dataSources:
//!   - selectedSource: cars.csv
//!     selectedFields: [id, make, price]
//!     fieldFilters:
//!       price: { from: 25000 }
//!       make: { values: [audi, bmw] }
//! ```

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use tabfuse_core::id::TaskId;
use tabfuse_core::task::{DataSourceSpec, FieldFilter};

use crate::error::{ExecError, Result, ValidationError};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRequest {
    #[serde(default)]
    pub task_name: String,
    #[serde(default)]
    pub data_sources: Vec<DataSourceSpec>,
}

impl TaskRequest {
    pub fn new(task_name: impl Into<String>, data_sources: Vec<DataSourceSpec>) -> Self {
        Self {
            task_name: task_name.into(),
            data_sources,
        }
    }

    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        if self.task_name.trim().is_empty() {
            return Err(ValidationError::MissingName);
        }
        if self.data_sources.is_empty() {
            return Err(ValidationError::NoDataSources);
        }
        if let Some(index) = self
            .data_sources
            .iter()
            .position(|s| s.source.trim().is_empty())
        {
            return Err(ValidationError::EmptySourceName { index });
        }
        Ok(())
    }
}

/// Read-back request over persisted results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadBackQuery {
    pub fields: Vec<String>,
    #[serde(default)]
    pub field_filters: BTreeMap<String, FieldFilter>,
    /// Restrict to one task; all tasks when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
}

impl ReadBackQuery {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn with_filter(mut self, field: impl Into<String>, filter: FieldFilter) -> Self {
        self.field_filters.insert(field.into(), filter);
        self
    }

    pub fn for_task(mut self, task_id: TaskId) -> Self {
        self.task_id = Some(task_id);
        self
    }
}

/// Parse a task request from JSON or YAML text.
pub fn parse_task_request(text: &str) -> Result<TaskRequest> {
    parse_payload(text)
}

/// Parse a read-back query from JSON or YAML text.
pub fn parse_query(text: &str) -> Result<ReadBackQuery> {
    parse_payload(text)
}

fn parse_payload<T: DeserializeOwned>(text: &str) -> Result<T> {
    if text.trim_start().starts_with('{') {
        serde_json::from_str(text).map_err(|e| ExecError::Payload(e.to_string()))
    } else {
        serde_yaml::from_str(text).map_err(|e| ExecError::Payload(e.to_string()))
    }
}
