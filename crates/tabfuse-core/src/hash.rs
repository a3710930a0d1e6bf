//! Stable hashing for tables. Equal tables (same columns, same rows in the
//! same order) always hash to the same digest.

use blake3::Hasher;

use crate::types::{Scalar, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    pub fn to_hex(&self) -> String {
        // blake3 hex(32b) is 64 hex chars
        let mut s = String::with_capacity(64);
        for b in &self.0 {
            use std::fmt::Write as _;
            let _ = write!(&mut s, "{:02x}", b);
        }
        s
    }
}

impl std::fmt::Display for Hash256 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Digest over column names, kinds, and every cell in row-major order.
pub fn table_digest(table: &Table) -> Hash256 {
    let mut h = Hasher::new();
    h.update(&(table.num_columns() as u64).to_le_bytes());
    for col in &table.columns {
        write_str(&mut h, &col.name);
        h.update(&[col.is_categorical() as u8]);
    }
    for r in 0..table.num_rows() {
        for col in &table.columns {
            hash_scalar(&col.values[r], &mut h);
        }
    }
    Hash256(h.finalize().into())
}

fn write_str(h: &mut Hasher, s: &str) {
    h.update(&(s.len() as u64).to_le_bytes());
    h.update(s.as_bytes());
}

fn hash_scalar(scalar: &Scalar, h: &mut Hasher) {
    match scalar {
        Scalar::Null => {
            h.update(&[0]);
        }
        Scalar::Num(v) => {
            h.update(&[1]);
            h.update(&v.to_bits().to_le_bytes());
        }
        Scalar::Str(s) => {
            h.update(&[2]);
            write_str(h, s);
        }
    }
}
