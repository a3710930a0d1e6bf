//! In-memory tabular values: `Scalar`, `Column`, and `Table`.
//!
//! Tables are column-oriented. Every column carries a declared `ColumnKind`
//! and all columns of one table hold the same number of values. A
//! categorical column holds only strings and nulls.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::schema::ColumnKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    Null,
    Num(f64),
    Str(String),
}

impl Scalar {
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Num(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric coercion. Anything that is not a finite number becomes `Null`.
    pub fn to_numeric(&self) -> Scalar {
        match self {
            Scalar::Num(v) if v.is_finite() => Scalar::Num(*v),
            Scalar::Str(s) => parse_number(s).map(Scalar::Num).unwrap_or(Scalar::Null),
            _ => Scalar::Null,
        }
    }

    /// Canonical text form used for persistence, fuzzy matching, and keys.
    /// `None` for nulls.
    pub fn canonical(&self) -> Option<String> {
        match self {
            Scalar::Null => None,
            Scalar::Num(v) => Some(format_number(*v)),
            Scalar::Str(s) => Some(s.clone()),
        }
    }
}

/// Parse a finite number. `NaN` and infinities are rejected.
pub fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Integral values print without a fractional part so `20000` survives a
/// text round trip as `"20000"` rather than `"20000.0"`.
pub fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
    pub values: Vec<Scalar>,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnKind, values: Vec<Scalar>) -> Self {
        Self {
            name: name.into(),
            kind,
            values,
        }
    }

    /// Build a column and infer its kind from the values.
    pub fn inferred(name: impl Into<String>, values: Vec<Scalar>) -> Self {
        let kind = ColumnKind::infer(values.iter());
        let mut col = Self::new(name, kind, values);
        col.conform();
        col
    }

    /// Rewrite numbers in a categorical column as their canonical text, so
    /// every value has the column's declared kind.
    pub fn conform(&mut self) {
        if self.kind != ColumnKind::Categorical {
            return;
        }
        for v in &mut self.values {
            if let Scalar::Num(x) = v {
                *v = Scalar::Str(format_number(*x));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_categorical(&self) -> bool {
        self.kind == ColumnKind::Categorical
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<Column>,
}

impl Table {
    /// Build a table, rejecting duplicate names and ragged columns.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let table = Self { columns };
        table.validate()?;
        Ok(table)
    }

    pub fn validate(&self) -> Result<()> {
        let rows = self.num_rows();
        for (i, col) in self.columns.iter().enumerate() {
            if col.len() != rows {
                return Err(Error::Schema(format!(
                    "column '{}' has {} rows, expected {}",
                    col.name,
                    col.len(),
                    rows
                )));
            }
            if self.columns[..i].iter().any(|c| c.name == col.name) {
                return Err(Error::Schema(format!("duplicate column '{}'", col.name)));
            }
        }
        Ok(())
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map(|c| c.len()).unwrap_or(0)
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Restrict to `names`, in table order. Unknown names are an error.
    pub fn select(&self, names: &[String]) -> Result<Table> {
        if let Some(missing) = names.iter().find(|n| self.column(n).is_none()) {
            return Err(Error::Schema(format!("column '{}' not found", missing)));
        }
        let columns = self
            .columns
            .iter()
            .filter(|c| names.contains(&c.name))
            .cloned()
            .collect();
        Ok(Table { columns })
    }

    /// Keep the rows whose mask entry is `true`.
    pub fn retain_rows(&mut self, keep: &[bool]) {
        for col in &mut self.columns {
            let mut i = 0;
            col.values.retain(|_| {
                let k = keep.get(i).copied().unwrap_or(false);
                i += 1;
                k
            });
        }
    }

    pub fn row(&self, idx: usize) -> Vec<Scalar> {
        self.columns.iter().map(|c| c.values[idx].clone()).collect()
    }

    pub fn rows(&self) -> Vec<Vec<Scalar>> {
        (0..self.num_rows()).map(|i| self.row(i)).collect()
    }

    /// Rows in a canonical order; lets callers compare row multisets.
    pub fn sorted_rows(&self) -> Vec<Vec<Scalar>> {
        let mut rows = self.rows();
        rows.sort_by(|a, b| scalar_tuple_cmp(a, b));
        rows
    }
}

/// Lexicographic comparison of scalar tuples.
pub fn scalar_tuple_cmp(a: &[Scalar], b: &[Scalar]) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        match scalar_cmp(x, y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    a.len().cmp(&b.len())
}

/// Total order over scalars: nulls first, then numbers, then strings.
pub fn scalar_cmp(a: &Scalar, b: &Scalar) -> Ordering {
    use Scalar::*;

    match (a, b) {
        (Null, Null) => Ordering::Equal,
        (Num(x), Num(y)) => x.total_cmp(y),
        (Str(x), Str(y)) => x.cmp(y),
        _ => scalar_type_order(a).cmp(&scalar_type_order(b)),
    }
}

fn scalar_type_order(s: &Scalar) -> u8 {
    match s {
        Scalar::Null => 0,
        Scalar::Num(_) => 1,
        Scalar::Str(_) => 2,
    }
}
