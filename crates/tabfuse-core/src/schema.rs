//! Logical schema types. Pure data; no IO here.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::Scalar;

/// Declared type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

impl ColumnKind {
    /// Numeric when every non-null value is a number. A column with no
    /// non-null values counts as numeric.
    pub fn infer<'a>(values: impl IntoIterator<Item = &'a Scalar>) -> Self {
        let all_numeric = values
            .into_iter()
            .filter(|v| !v.is_null())
            .all(|v| matches!(v, Scalar::Num(_)));
        if all_numeric {
            ColumnKind::Numeric
        } else {
            ColumnKind::Categorical
        }
    }

    /// Kind of a column built from two sides of a join.
    pub fn unify(self, other: ColumnKind) -> ColumnKind {
        if self == other {
            self
        } else {
            ColumnKind::Categorical
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Numeric => write!(f, "numeric"),
            ColumnKind::Categorical => write!(f, "categorical"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ColumnKind,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}
