//! Newline-delimited JSON objects, one row per line.
//!
//! Columns appear in first-seen order. Keys missing from a line are null.
//! Strings are kept as strings (blank ones become null) and never count as
//! numbers. JSON numbers are numeric unless their column is categorical, in
//! which case they keep their JSON text. Any other value is stored as its
//! JSON text.

use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use serde_json::Value;
use tabfuse_core::types::Table;

use super::{table_from_rows, RawCell};
use crate::error::{Error, Result};

pub struct JsonlReader;

impl JsonlReader {
    pub fn read_path(path: &Path) -> Result<Table> {
        let file = std::fs::File::open(path)?;
        Self::read(file)
    }

    pub fn read<R: Read>(input: R) -> Result<Table> {
        let mut headers: Vec<String> = Vec::new();
        let mut rows: Vec<Vec<RawCell>> = Vec::new();

        for (lineno, line) in BufReader::new(input).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let obj = match serde_json::from_str::<Value>(&line)? {
                Value::Object(map) => map,
                other => {
                    return Err(Error::Malformed(format!(
                        "line {}: expected an object, found {}",
                        lineno + 1,
                        other
                    )))
                }
            };
            let mut row = vec![RawCell::Null; headers.len()];
            for (key, value) in obj {
                let ci = match headers.iter().position(|h| *h == key) {
                    Some(ci) => ci,
                    None => {
                        headers.push(key);
                        row.push(RawCell::Null);
                        headers.len() - 1
                    }
                };
                row[ci] = to_cell(value);
            }
            rows.push(row);
        }
        table_from_rows(headers, rows)
    }
}

fn to_cell(value: Value) -> RawCell {
    match value {
        Value::Null => RawCell::Null,
        Value::Number(n) => RawCell::Text(n.to_string()),
        Value::String(s) if s.trim().is_empty() => RawCell::Null,
        Value::String(s) => RawCell::Literal(s),
        other => RawCell::Literal(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabfuse_core::schema::ColumnKind;
    use tabfuse_core::types::Scalar;

    #[test]
    fn sparse_objects_fill_nulls() {
        let data = "{\"id\": 1, \"make\": \"bmw\"}\n\n{\"id\": 2, \"color\": \"red\"}\n";
        let table = JsonlReader::read(data.as_bytes()).unwrap();
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.column("id").unwrap().kind, ColumnKind::Numeric);
        assert_eq!(table.column("make").unwrap().values[1], Scalar::Null);
        assert_eq!(table.column("color").unwrap().values[0], Scalar::Null);
        assert_eq!(table.column("color").unwrap().values[1], Scalar::Str("red".into()));
    }

    #[test]
    fn numbers_in_categorical_columns_become_text() {
        let data = "{\"code\": 7, \"n\": 1}\n{\"code\": \"007\", \"n\": 2.5}\n";
        let table = JsonlReader::read(data.as_bytes()).unwrap();
        let code = table.column("code").unwrap();
        assert_eq!(code.kind, ColumnKind::Categorical);
        assert_eq!(code.values, vec![Scalar::Str("7".into()), Scalar::Str("007".into())]);
        assert_eq!(table.column("n").unwrap().values, vec![Scalar::Num(1.0), Scalar::Num(2.5)]);
    }

    #[test]
    fn non_object_lines_are_rejected() {
        assert!(JsonlReader::read("[1, 2]\n".as_bytes()).is_err());
    }
}
