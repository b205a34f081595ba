//! Building the sparse character and line indexes.
//!
//! ## Modules
//!
//! - [`config`] - Tunable options, JSON loading and validation
//! - [`types`] - Index entries, sparse indexes and per-run work descriptions
//! - [`budget`] - Distribution of the entry maxima over partitions
//! - [`worker`] - Scan of one sub-partition
//! - [`leader`] - Partitioning, dispatch and merge
//! - [`stats`] - Human-readable and JSON summaries

pub mod budget;
pub mod config;
pub mod leader;
pub mod stats;
pub mod types;
pub mod worker;

pub use budget::{EntryBudget, EntryGrid};
pub use config::IndexConfig;
pub use leader::Leader;
pub use stats::IndexSummary;
pub use types::*;
pub use worker::Worker;
