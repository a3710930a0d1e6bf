#![forbid(unsafe_code)]
//! tabfuse-io: everything that touches files.
//!
//! - `catalog`: resolves source identifiers under the data directory, loads
//!   them into `Table`s, and lists what is available.
//! - `readers`: CSV/TSV and JSONL parsers.
//! - `store`: long-format result stores (in-memory and JSONL files).
//! - `writers`: NDJSON writer used by the file store.

pub mod catalog;
pub mod error;
pub mod readers;
pub mod store;
pub mod writers;

pub use catalog::{FsCatalog, MemoryCatalog, SourceCatalog, SourceFormat, SourceInfo};
pub use error::{Error, Result};
pub use store::{open_store, FsResultStore, MemoryResultStore, ResultStore};
