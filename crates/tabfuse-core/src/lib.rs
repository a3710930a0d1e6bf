#![forbid(unsafe_code)]
//! tabfuse-core: shared types for the merge-task pipeline.
//!
//! - `types`/`schema`: column-oriented tables with numeric/categorical columns.
//! - `task`: the submitted task, its sources and filters, and the status machine.
//! - `record`: long-format merged records as persisted by the result store.
//! - `config`: service configuration (defaults, env, YAML overlay).
//! - `hash`: stable table digests.
//!
//! No async and no IO in this crate.

pub mod config;
pub mod error;
pub mod hash;
pub mod id;
pub mod prelude;
pub mod record;
pub mod schema;
pub mod task;
pub mod types;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
