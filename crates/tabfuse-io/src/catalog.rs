//! Source catalog: where source identifiers resolve and how they load.
//!
//! `FsCatalog` resolves a source name against the data directory and picks a
//! reader from the file extension. `MemoryCatalog` serves tables registered
//! in-process (tests, embedding).

use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tabfuse_core::schema::{ColumnKind, Field};
use tabfuse_core::types::Table;

use crate::error::{Error, Result};
use crate::readers::csv::CsvReader;
use crate::readers::jsonl::JsonlReader;

/// A loadable source and its columns with inferred types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub name: String,
    pub columns: Vec<Field>,
}

pub trait SourceCatalog: Send + Sync {
    /// Every loadable source, sorted by name.
    fn list_sources(&self) -> Result<Vec<SourceInfo>>;

    /// Load `name`, restricted to `columns` (in source order) unless empty.
    fn load(&self, name: &str, columns: &[String]) -> Result<Table>;

    fn exists(&self, name: &str) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Tsv,
    Jsonl,
}

impl SourceFormat {
    /// Format from the file extension, case-insensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(SourceFormat::Csv),
            "tsv" => Some(SourceFormat::Tsv),
            "jsonl" | "ndjson" => Some(SourceFormat::Jsonl),
            _ => None,
        }
    }

    pub fn read(self, path: &Path) -> Result<Table> {
        match self {
            SourceFormat::Csv => CsvReader::comma().read_path(path),
            SourceFormat::Tsv => CsvReader::tab().read_path(path),
            SourceFormat::Jsonl => JsonlReader::read_path(path),
        }
    }
}

/// Restrict `table` to `columns`, keeping the source's column order.
pub fn select_columns(source: &str, table: Table, columns: &[String]) -> Result<Table> {
    if columns.is_empty() {
        return Ok(table);
    }
    if let Some(missing) = columns.iter().find(|c| table.column(c).is_none()) {
        return Err(Error::ColumnMissing {
            source_name: source.to_string(),
            column: missing.clone(),
        });
    }
    Ok(table.select(columns)?)
}

/// Column kinds judged from the first `sample` non-null values only: numeric
/// when each of them reads as a number.
pub fn sampled_fields(table: &Table, sample: usize) -> Vec<Field> {
    table
        .columns
        .iter()
        .map(|c| {
            let numeric = c
                .values
                .iter()
                .filter(|v| !v.is_null())
                .take(sample)
                .all(|v| !v.to_numeric().is_null());
            let kind = if numeric {
                ColumnKind::Numeric
            } else {
                ColumnKind::Categorical
            };
            Field::new(c.name.clone(), kind)
        })
        .collect()
}

pub struct FsCatalog {
    data_dir: PathBuf,
    sample_rows: usize,
}

impl FsCatalog {
    pub fn new(data_dir: impl Into<PathBuf>, sample_rows: usize) -> Self {
        Self {
            data_dir: data_dir.into(),
            sample_rows,
        }
    }

    /// Path for `name`, or `None` when the name would escape the data directory.
    fn resolve(&self, name: &str) -> Option<PathBuf> {
        let rel = Path::new(name);
        if name.is_empty() || !rel.components().all(|c| matches!(c, Component::Normal(_))) {
            return None;
        }
        Some(self.data_dir.join(rel))
    }
}

impl SourceCatalog for FsCatalog {
    fn list_sources(&self) -> Result<Vec<SourceInfo>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.data_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if SourceFormat::from_name(name).is_some() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();

        let mut out = Vec::with_capacity(names.len());
        for name in names {
            match self.load(&name, &[]) {
                Ok(table) => out.push(SourceInfo {
                    columns: sampled_fields(&table, self.sample_rows),
                    name,
                }),
                Err(e) => tracing::warn!(source = %name, error = %e, "unreadable source skipped"),
            }
        }
        Ok(out)
    }

    fn load(&self, name: &str, columns: &[String]) -> Result<Table> {
        let path = self.resolve(name).ok_or_else(|| Error::SourceMissing {
            source_name: name.to_string(),
            path: self.data_dir.join(name),
        })?;
        if !path.is_file() {
            return Err(Error::SourceMissing {
                source_name: name.to_string(),
                path,
            });
        }
        let format = SourceFormat::from_name(name).ok_or_else(|| Error::UnsupportedFormat {
            source_name: name.to_string(),
            extension: path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("")
                .to_string(),
        })?;
        let table = format.read(&path)?;
        tracing::debug!(source = %name, rows = table.num_rows(), "source parsed");
        select_columns(name, table, columns)
    }

    fn exists(&self, name: &str) -> bool {
        self.resolve(name).map_or(false, |p| p.is_file())
    }
}

/// Thread-safe in-process catalog.
#[derive(Clone, Default)]
pub struct MemoryCatalog {
    tables: Arc<RwLock<HashMap<String, Table>>>,
    sample_rows: usize,
}

impl MemoryCatalog {
    pub fn new(sample_rows: usize) -> Self {
        Self {
            tables: Arc::default(),
            sample_rows,
        }
    }

    pub fn insert(&self, name: impl Into<String>, table: Table) {
        self.tables.write().insert(name.into(), table);
    }

    pub fn len(&self) -> usize {
        self.tables.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.read().is_empty()
    }
}

impl SourceCatalog for MemoryCatalog {
    fn list_sources(&self) -> Result<Vec<SourceInfo>> {
        let tables = self.tables.read();
        let mut out: Vec<SourceInfo> = tables
            .iter()
            .map(|(name, table)| SourceInfo {
                name: name.clone(),
                columns: sampled_fields(table, self.sample_rows),
            })
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    fn load(&self, name: &str, columns: &[String]) -> Result<Table> {
        let table = self
            .tables
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::SourceMissing {
                source_name: name.to_string(),
                path: PathBuf::from(name),
            })?;
        select_columns(name, table, columns)
    }

    fn exists(&self, name: &str) -> bool {
        self.tables.read().contains_key(name)
    }
}
