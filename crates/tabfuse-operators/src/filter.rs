//! Per-field predicates over a table.
//!
//! - `NumericRange`: the column is coerced to numbers (failures become null),
//!   then rows below `from` or above `to` are dropped. Bounds are inclusive
//!   and independent; a null never satisfies an active bound.
//! - `CategoricalValues`: a row survives when its value, lowercased, reaches
//!   the fuzzy threshold against any lowercased query. An empty set keeps
//!   nothing. Nulls never match.
//!
//! Filters on different fields narrow the table one after another, so the
//! surviving row set does not depend on evaluation order.

use std::collections::{BTreeMap, BTreeSet};

use tabfuse_core::config::DEFAULT_FUZZY_THRESHOLD;
use tabfuse_core::schema::ColumnKind;
use tabfuse_core::task::FieldFilter;
use tabfuse_core::types::{Scalar, Table};

use crate::fuzzy;

#[derive(Debug, Clone)]
pub struct Filter {
    pub filters: BTreeMap<String, FieldFilter>,
    pub fuzzy_threshold: f64,
}

/// Result of applying a `Filter`.
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub table: Table,
    /// Filtered fields that the table does not have; those filters were not applied.
    pub skipped: Vec<String>,
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            filters: BTreeMap::new(),
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD as f64,
        }
    }
}

impl Filter {
    pub fn new(filters: BTreeMap<String, FieldFilter>, fuzzy_threshold: u8) -> Self {
        Self {
            filters,
            fuzzy_threshold: fuzzy_threshold as f64,
        }
    }

    pub fn apply(&self, mut table: Table) -> FilterOutcome {
        let mut skipped = Vec::new();
        for (field, filter) in &self.filters {
            if table.column(field).is_none() {
                skipped.push(field.clone());
                continue;
            }
            match filter {
                FieldFilter::NumericRange { from, to } => {
                    apply_numeric(&mut table, field, *from, *to)
                }
                FieldFilter::CategoricalValues { values } => {
                    apply_categorical(&mut table, field, values, self.fuzzy_threshold)
                }
            }
        }
        FilterOutcome { table, skipped }
    }
}

/// Coerce `field` to numeric and keep rows within `[from, to]`.
pub fn apply_numeric(table: &mut Table, field: &str, from: Option<f64>, to: Option<f64>) {
    let Some(col) = table.column_mut(field) else {
        return;
    };
    col.values = col.values.iter().map(Scalar::to_numeric).collect();
    col.kind = ColumnKind::Numeric;

    if from.is_none() && to.is_none() {
        return;
    }
    let keep: Vec<bool> = col
        .values
        .iter()
        .map(|v| match v.as_f64() {
            Some(x) => from.map_or(true, |lo| x >= lo) && to.map_or(true, |hi| x <= hi),
            None => false,
        })
        .collect();
    table.retain_rows(&keep);
}

/// Keep rows whose `field` fuzzily matches any of `values`.
pub fn apply_categorical(
    table: &mut Table,
    field: &str,
    values: &BTreeSet<String>,
    threshold: f64,
) {
    let Some(col) = table.column(field) else {
        return;
    };
    let queries: Vec<String> = values.iter().map(|q| q.to_lowercase()).collect();
    let keep: Vec<bool> = col
        .values
        .iter()
        .map(|v| {
            v.canonical()
                .map_or(false, |s| fuzzy::matches_any(&s, &queries, threshold))
        })
        .collect();
    table.retain_rows(&keep);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabfuse_core::types::Column;

    fn cars() -> Table {
        Table::new(vec![
            Column::inferred(
                "id",
                vec![Scalar::Num(1.0), Scalar::Num(2.0), Scalar::Num(3.0), Scalar::Num(4.0)],
            ),
            Column::inferred(
                "make",
                vec![
                    Scalar::Str("BMW".into()),
                    Scalar::Str("audi".into()),
                    Scalar::Str("Audii".into()),
                    Scalar::Null,
                ],
            ),
            Column::inferred(
                "price",
                vec![
                    Scalar::Str("20000".into()),
                    Scalar::Str("30000".into()),
                    Scalar::Str("n/a".into()),
                    Scalar::Str("25000".into()),
                ],
            ),
        ])
        .unwrap()
    }

    fn ids(table: &Table) -> Vec<f64> {
        table
            .column("id")
            .unwrap()
            .values
            .iter()
            .filter_map(Scalar::as_f64)
            .collect()
    }

    fn run(filters: Vec<(&str, FieldFilter)>) -> FilterOutcome {
        let filters = filters
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        Filter::new(filters, 80).apply(cars())
    }

    #[test]
    fn numeric_bounds_are_inclusive() {
        let out = run(vec![("price", FieldFilter::range(Some(20000.0), Some(25000.0)))]);
        assert_eq!(ids(&out.table), vec![1.0, 4.0]);
    }

    #[test]
    fn uncoercible_values_fail_any_bound() {
        let out = run(vec![("price", FieldFilter::range(None, Some(1e9)))]);
        assert_eq!(ids(&out.table), vec![1.0, 2.0, 4.0]);
        assert_eq!(out.table.column("price").unwrap().kind, ColumnKind::Numeric);
    }

    #[test]
    fn unbounded_numeric_filter_only_coerces() {
        let out = run(vec![("price", FieldFilter::range(None, None))]);
        assert_eq!(out.table.num_rows(), 4);
        assert_eq!(out.table.column("price").unwrap().values[2], Scalar::Null);
    }

    #[test]
    fn fuzzy_match_is_case_insensitive_and_tolerant() {
        let out = run(vec![("make", FieldFilter::values(["AUDI"]))]);
        assert_eq!(ids(&out.table), vec![2.0, 3.0]);
    }

    #[test]
    fn empty_value_set_matches_nothing() {
        let out = run(vec![("make", FieldFilter::values(Vec::<String>::new()))]);
        assert_eq!(out.table.num_rows(), 0);
        assert_eq!(out.table.num_columns(), 3);
    }

    #[test]
    fn filters_compose_by_intersection() {
        let out = run(vec![
            ("make", FieldFilter::values(["audi"])),
            ("price", FieldFilter::range(Some(25000.0), None)),
        ]);
        assert_eq!(ids(&out.table), vec![2.0]);
    }

    #[test]
    fn filters_on_absent_columns_are_reported() {
        let out = run(vec![("color", FieldFilter::values(["red"]))]);
        assert_eq!(out.skipped, vec!["color".to_string()]);
        assert_eq!(out.table.num_rows(), 4);
    }

    #[test]
    fn numeric_looking_codes_match_themselves() {
        let mut table = Table::new(vec![Column::inferred(
            "code",
            vec![Scalar::Str("007".into()), Scalar::Str("A12".into())],
        )])
        .unwrap();
        let values: BTreeSet<String> = ["007".to_string()].into_iter().collect();
        apply_categorical(&mut table, "code", &values, 80.0);
        assert_eq!(table.column("code").unwrap().values, vec![Scalar::Str("007".into())]);
    }

    #[test]
    fn numeric_values_can_be_matched_fuzzily() {
        let out = run(vec![("id", FieldFilter::values(["2"]))]);
        assert_eq!(ids(&out.table), vec![2.0]);
    }
}
