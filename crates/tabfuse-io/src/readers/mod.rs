//! Parsers that turn a source file into a `Table`.
//!
//! Readers collect raw cells first and type whole columns afterwards: a
//! column is numeric only when every non-null cell parses as a finite number.
//! Otherwise it is categorical and its cells keep their source text, so
//! `"007"` stays `"007"`.

pub mod csv;
pub mod jsonl;

use tabfuse_core::schema::ColumnKind;
use tabfuse_core::types::{parse_number, Column, Scalar, Table};

use crate::error::Result;

/// A cell as read, before its column's kind is known.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RawCell {
    Null,
    /// Unquoted text; numeric if it parses and so does the rest of its column.
    Text(String),
    /// Always a string, even when it looks like a number.
    Literal(String),
}

impl RawCell {
    /// Blank text is null.
    pub(crate) fn from_text(raw: &str) -> Self {
        if raw.trim().is_empty() {
            RawCell::Null
        } else {
            RawCell::Text(raw.to_string())
        }
    }

    fn number(&self) -> Option<f64> {
        match self {
            RawCell::Text(t) => parse_number(t),
            _ => None,
        }
    }

    fn into_scalar(self, kind: ColumnKind) -> Scalar {
        match self {
            RawCell::Null => Scalar::Null,
            RawCell::Text(t) if kind == ColumnKind::Numeric => {
                parse_number(&t).map(Scalar::Num).unwrap_or(Scalar::Null)
            }
            RawCell::Text(t) | RawCell::Literal(t) => Scalar::Str(t),
        }
    }
}

fn column_kind(cells: &[RawCell]) -> ColumnKind {
    let numeric = cells
        .iter()
        .all(|c| *c == RawCell::Null || c.number().is_some());
    if numeric {
        ColumnKind::Numeric
    } else {
        ColumnKind::Categorical
    }
}

/// Assemble a table from a header and row-major cells. Short rows are padded
/// with nulls, long rows are truncated to the header width.
pub(crate) fn table_from_rows(headers: Vec<String>, rows: Vec<Vec<RawCell>>) -> Result<Table> {
    let mut cells: Vec<Vec<RawCell>> = vec![Vec::with_capacity(rows.len()); headers.len()];
    for mut row in rows {
        row.resize(headers.len(), RawCell::Null);
        for (ci, cell) in row.into_iter().enumerate() {
            cells[ci].push(cell);
        }
    }
    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, col)| {
            let kind = column_kind(&col);
            let values = col.into_iter().map(|c| c.into_scalar(kind)).collect();
            Column::new(name, kind, values)
        })
        .collect();
    Ok(Table::new(columns)?)
}
