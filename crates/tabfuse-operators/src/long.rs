//! Long-format encoding of merged tables and the pivot read-back.
//!
//! Writing emits one `MergedRecord` per cell. Reading pivots records back to
//! a wide table keyed by `(task_id, row_id)`, re-applies the field filters,
//! drops `row_id`, and removes exact duplicate rows.

use std::collections::{BTreeMap, HashSet};

use tabfuse_core::id::TaskId;
use tabfuse_core::record::MergedRecord;
use tabfuse_core::schema::ColumnKind;
use tabfuse_core::task::FieldFilter;
use tabfuse_core::types::{parse_number, Column, Scalar, Table};

use crate::filter::Filter;
use crate::key::row_key;

pub const TASK_ID_COLUMN: &str = "task_id";
pub const ROW_ID_COLUMN: &str = "row_id";

/// One record per `(row, column)` cell, row-major. Nulls are kept as
/// records with no value.
pub fn to_records(task_id: TaskId, table: &Table) -> Vec<MergedRecord> {
    let mut out = Vec::with_capacity(table.num_rows() * table.num_columns());
    for row in 0..table.num_rows() {
        for col in &table.columns {
            out.push(MergedRecord {
                task_id,
                row_id: row as u64,
                column_name: col.name.clone(),
                column_value: col.values[row].canonical(),
                is_categorical: col.is_categorical(),
            });
        }
    }
    out
}

/// Pivot records into a wide table with leading `task_id` and `row_id`
/// columns followed by `columns` (request order, duplicates and unknown
/// names dropped). Rows are ordered by `(task_id, row_id)`.
pub fn pivot<'a>(
    records: impl IntoIterator<Item = &'a MergedRecord>,
    columns: &[String],
) -> Table {
    let mut wanted: Vec<&str> = Vec::new();
    for c in columns {
        if c != TASK_ID_COLUMN && c != ROW_ID_COLUMN && !wanted.contains(&c.as_str()) {
            wanted.push(c);
        }
    }

    let mut rows: BTreeMap<(TaskId, u64), Vec<Scalar>> = BTreeMap::new();
    let mut categorical = vec![false; wanted.len()];
    let mut seen = vec![false; wanted.len()];

    for rec in records {
        let Some(ci) = wanted.iter().position(|w| *w == rec.column_name) else {
            continue;
        };
        seen[ci] = true;
        categorical[ci] |= rec.is_categorical;
        let value = decode(rec);
        let row = rows
            .entry((rec.task_id, rec.row_id))
            .or_insert_with(|| vec![Scalar::Null; wanted.len()]);
        row[ci] = value;
    }

    let present: Vec<usize> = (0..wanted.len()).filter(|&i| seen[i]).collect();
    let mut task_ids = Vec::with_capacity(rows.len());
    let mut row_ids = Vec::with_capacity(rows.len());
    let mut data: Vec<Vec<Scalar>> = vec![Vec::with_capacity(rows.len()); present.len()];
    for ((task, row), values) in rows {
        task_ids.push(Scalar::Num(task.get() as f64));
        row_ids.push(Scalar::Num(row as f64));
        for (slot, &ci) in present.iter().enumerate() {
            data[slot].push(values[ci].clone());
        }
    }

    let mut out = vec![
        Column::new(TASK_ID_COLUMN, ColumnKind::Numeric, task_ids),
        Column::new(ROW_ID_COLUMN, ColumnKind::Numeric, row_ids),
    ];
    for (slot, values) in data.into_iter().enumerate() {
        let ci = present[slot];
        let kind = if categorical[ci] {
            ColumnKind::Categorical
        } else {
            ColumnKind::Numeric
        };
        out.push(Column::new(wanted[ci], kind, values));
    }
    Table { columns: out }
}

/// Pivot, filter, drop `row_id`, deduplicate.
pub fn read_back<'a>(
    records: impl IntoIterator<Item = &'a MergedRecord>,
    columns: &[String],
    filters: &BTreeMap<String, FieldFilter>,
    fuzzy_threshold: u8,
) -> Table {
    let wide = pivot(records, columns);
    let mut table = Filter::new(filters.clone(), fuzzy_threshold).apply(wide).table;
    table.columns.retain(|c| c.name != ROW_ID_COLUMN);
    dedup_rows(&table)
}

/// Drop exact duplicate rows, keeping the first occurrence.
pub fn dedup_rows(table: &Table) -> Table {
    let mut seen = HashSet::new();
    let keep: Vec<bool> = (0..table.num_rows())
        .map(|r| seen.insert(row_key(table.columns.iter().map(|c| &c.values[r]))))
        .collect();
    let mut out = table.clone();
    out.retain_rows(&keep);
    out
}

fn decode(rec: &MergedRecord) -> Scalar {
    match &rec.column_value {
        None => Scalar::Null,
        Some(v) if rec.is_categorical => Scalar::Str(v.clone()),
        Some(v) => parse_number(v).map(Scalar::Num).unwrap_or(Scalar::Null),
    }
}
