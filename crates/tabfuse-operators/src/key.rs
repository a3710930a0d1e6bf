//! Hashable row keys for join matching and exact deduplication.

use tabfuse_core::types::Scalar;

/// Hashable image of a `Scalar`. Nulls compare equal to each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyCell {
    Null,
    Num(u64),
    Str(String),
}

impl From<&Scalar> for KeyCell {
    fn from(s: &Scalar) -> Self {
        match s {
            Scalar::Null => KeyCell::Null,
            // -0.0 and 0.0 are the same key
            Scalar::Num(v) if *v == 0.0 => KeyCell::Num(0f64.to_bits()),
            Scalar::Num(v) => KeyCell::Num(v.to_bits()),
            Scalar::Str(s) => KeyCell::Str(s.clone()),
        }
    }
}

pub type RowKey = Vec<KeyCell>;

pub fn row_key(values: impl IntoIterator<Item = impl std::borrow::Borrow<Scalar>>) -> RowKey {
    values
        .into_iter()
        .map(|v| KeyCell::from(v.borrow()))
        .collect()
}
