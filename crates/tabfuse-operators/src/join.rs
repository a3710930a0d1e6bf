//! Multi-way full outer join.
//!
//! The join key is the set of column names shared by *all* inputs. Inputs are
//! folded left to right, in declaration order, with a full outer join on that
//! one key set at every step. An empty key set is an error; a cross product is
//! never produced.
//!
//! Output layout of one pairwise step:
//! - columns: every left column, then the right non-key columns;
//! - rows: each left row followed by its right matches (in right order), a
//!   left row without matches padded with nulls, then the unmatched right rows
//!   with nulls on the left side.
//!
//! Null key cells match each other. A non-key column present on both sides is
//! renamed with `_x` (left) and `_y` (right) suffixes.

use std::collections::HashMap;

use tabfuse_core::types::{Column, Scalar, Table};

use crate::error::OpError;
use crate::key::{row_key, RowKey};

/// Columns shared by every table, in the first table's column order.
pub fn common_columns<'a>(tables: impl IntoIterator<Item = &'a Table>) -> Vec<String> {
    let mut iter = tables.into_iter();
    let Some(first) = iter.next() else {
        return Vec::new();
    };
    let mut keys = first.column_names();
    for t in iter {
        keys.retain(|k| t.column(k).is_some());
    }
    keys
}

/// Merge `(source, table)` pairs, in order, into one table.
pub fn merge_tables(inputs: Vec<(String, Table)>) -> Result<Table, OpError> {
    if inputs.is_empty() {
        return Err(OpError::NoInputs);
    }
    let keys = common_columns(inputs.iter().map(|(_, t)| t));
    if keys.is_empty() {
        return Err(OpError::EmptyJoinKey {
            sources: inputs.into_iter().map(|(name, _)| name).collect(),
        });
    }

    let mut iter = inputs.into_iter();
    let (_, mut acc) = iter.next().ok_or(OpError::NoInputs)?;
    for (_, right) in iter {
        acc = full_outer_join(&acc, &right, &keys)?;
    }
    Ok(acc)
}

/// Full outer join of two tables on `keys` (which both must contain).
pub fn full_outer_join(left: &Table, right: &Table, keys: &[String]) -> Result<Table, OpError> {
    let left_keys = positions(left, keys)?;
    let right_keys = positions(right, keys)?;

    let right_rest: Vec<usize> = (0..right.num_columns())
        .filter(|i| !right_keys.contains(i))
        .collect();

    let mut columns: Vec<Column> = left
        .columns
        .iter()
        .map(|c| Column::new(c.name.clone(), c.kind, Vec::new()))
        .collect();
    for (lk, rk) in left_keys.iter().zip(&right_keys) {
        columns[*lk].kind = columns[*lk].kind.unify(right.columns[*rk].kind);
    }
    for &ri in &right_rest {
        let rc = &right.columns[ri];
        columns.push(Column::new(rc.name.clone(), rc.kind, Vec::new()));
    }
    disambiguate(&mut columns, left.num_columns(), &left_keys);

    // right key -> right row indices, in row order
    let mut index: HashMap<RowKey, Vec<usize>> = HashMap::new();
    for r in 0..right.num_rows() {
        let key = row_key(right_keys.iter().map(|&k| &right.columns[k].values[r]));
        index.entry(key).or_default().push(r);
    }

    let width_left = left.num_columns();
    let mut matched = vec![false; right.num_rows()];

    for l in 0..left.num_rows() {
        let key = row_key(left_keys.iter().map(|&k| &left.columns[k].values[l]));
        match index.get(&key) {
            Some(rows) => {
                for &r in rows {
                    matched[r] = true;
                    push_left(&mut columns, left, l);
                    push_right(&mut columns, right, &right_rest, width_left, Some(r));
                }
            }
            None => {
                push_left(&mut columns, left, l);
                push_right(&mut columns, right, &right_rest, width_left, None);
            }
        }
    }

    for r in (0..right.num_rows()).filter(|&r| !matched[r]) {
        for (ci, col) in columns.iter_mut().take(width_left).enumerate() {
            let value = match left_keys.iter().position(|&lk| lk == ci) {
                Some(kpos) => right.columns[right_keys[kpos]].values[r].clone(),
                None => Scalar::Null,
            };
            col.values.push(value);
        }
        push_right(&mut columns, right, &right_rest, width_left, Some(r));
    }

    // a key widened to categorical may still hold numbers from one side
    for col in &mut columns {
        col.conform();
    }
    Ok(Table::new(columns)?)
}

fn positions(table: &Table, keys: &[String]) -> Result<Vec<usize>, OpError> {
    keys.iter()
        .map(|k| {
            table
                .position(k)
                .ok_or_else(|| OpError::Schema(format!("join key '{}' not found", k)))
        })
        .collect()
}

fn push_left(columns: &mut [Column], left: &Table, row: usize) {
    for (ci, col) in left.columns.iter().enumerate() {
        columns[ci].values.push(col.values[row].clone());
    }
}

fn push_right(
    columns: &mut [Column],
    right: &Table,
    rest: &[usize],
    offset: usize,
    row: Option<usize>,
) {
    for (j, &ri) in rest.iter().enumerate() {
        let value = row
            .map(|r| right.columns[ri].values[r].clone())
            .unwrap_or(Scalar::Null);
        columns[offset + j].values.push(value);
    }
}

fn disambiguate(columns: &mut [Column], width_left: usize, left_keys: &[usize]) {
    let (left, right) = columns.split_at_mut(width_left);
    for rc in right.iter_mut() {
        if let Some((li, lc)) = left.iter_mut().enumerate().find(|(_, c)| c.name == rc.name) {
            if left_keys.contains(&li) {
                continue;
            }
            lc.name = format!("{}_x", lc.name);
            rc.name = format!("{}_y", rc.name);
        }
    }
}
