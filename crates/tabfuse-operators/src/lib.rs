#![forbid(unsafe_code)]
//! tabfuse-operators: the pure table transformations of the merge pipeline.
//!
//! - `filter`: numeric-range and fuzzy-categorical predicates per column.
//! - `join`: multi-way full outer join on the global column intersection.
//! - `long`: merged table <-> long-format records, pivot read-back, dedup.
//!
//! Everything here is synchronous and deterministic: same inputs, same
//! output rows in the same order.

pub mod error;
pub mod filter;
pub mod fuzzy;
pub mod join;
pub mod key;
pub mod long;

pub use error::OpError;
pub use filter::{Filter, FilterOutcome};
pub use join::merge_tables;
pub use long::{pivot, read_back, to_records};
