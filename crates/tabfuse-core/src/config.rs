//! Service configuration that downstream crates can serialize/deserialize.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_FUZZY_THRESHOLD: u8 = 80;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Directory that source identifiers resolve against.
    pub data_dir: PathBuf,

    /// Where merged records are persisted. `None` keeps them in memory.
    pub results_dir: Option<PathBuf>,

    /// Minimum similarity ratio (0..=100) for a categorical match.
    pub fuzzy_threshold: u8,

    /// Buffered status events per subscriber before old ones are dropped.
    pub notify_capacity: usize,

    /// Non-null values sampled per column when the catalog infers types.
    pub type_sample_rows: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("sample_data"),
            results_dir: None,
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            notify_capacity: 256,
            type_sample_rows: 10,
        }
    }
}

/// Optional overrides, e.g. from a YAML file. Unset fields keep the current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigOverlay {
    pub data_dir: Option<PathBuf>,
    pub results_dir: Option<PathBuf>,
    pub fuzzy_threshold: Option<u8>,
    pub notify_capacity: Option<usize>,
    pub type_sample_rows: Option<usize>,
}

impl ServiceConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `TABFUSE_DATA_DIR`: source data directory
    /// - `TABFUSE_RESULTS_DIR`: directory for persisted merged records
    /// - `TABFUSE_FUZZY_THRESHOLD`: categorical match threshold (0-100)
    /// - `TABFUSE_NOTIFY_CAPACITY`: per-subscriber event buffer
    /// - `TABFUSE_TYPE_SAMPLE_ROWS`: catalog type-inference sample size
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("TABFUSE_DATA_DIR") {
            if !s.trim().is_empty() {
                cfg.data_dir = PathBuf::from(s);
            }
        }

        if let Ok(s) = std::env::var("TABFUSE_RESULTS_DIR") {
            if !s.trim().is_empty() {
                cfg.results_dir = Some(PathBuf::from(s));
            }
        }

        if let Ok(s) = std::env::var("TABFUSE_FUZZY_THRESHOLD") {
            if let Ok(v) = s.parse::<u8>() {
                cfg.fuzzy_threshold = v.min(100);
            }
        }

        if let Ok(s) = std::env::var("TABFUSE_NOTIFY_CAPACITY") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.notify_capacity = v;
            }
        }

        if let Ok(s) = std::env::var("TABFUSE_TYPE_SAMPLE_ROWS") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.type_sample_rows = v;
            }
        }

        cfg
    }

    pub fn apply(&mut self, overlay: &ConfigOverlay) {
        if let Some(dir) = &overlay.data_dir {
            self.data_dir = dir.clone();
        }
        if let Some(dir) = &overlay.results_dir {
            self.results_dir = Some(dir.clone());
        }
        if let Some(t) = overlay.fuzzy_threshold {
            self.fuzzy_threshold = t;
        }
        if let Some(c) = overlay.notify_capacity {
            self.notify_capacity = c;
        }
        if let Some(n) = overlay.type_sample_rows {
            self.type_sample_rows = n;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.fuzzy_threshold > 100 {
            return Err(Error::Config(format!(
                "fuzzy_threshold must be within 0..=100, got {}",
                self.fuzzy_threshold
            )));
        }
        if self.notify_capacity == 0 {
            return Err(Error::Config("notify_capacity must be positive".into()));
        }
        if self.type_sample_rows == 0 {
            return Err(Error::Config("type_sample_rows must be positive".into()));
        }
        Ok(())
    }
}
