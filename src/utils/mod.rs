//! Utility modules shared by the indexer and the accessor.
//!
//! ## Modules
//!
//! - [`encoding`] - Supported encodings, byte-length table, incremental decoder
//! - [`source`] - Raw byte sources opened at arbitrary offsets (file, mmap)
//! - [`progress`] - Optional progress bar for the indexing pass

pub mod encoding;
pub mod progress;
pub mod source;

pub use encoding::*;
pub use progress::*;
pub use source::*;
