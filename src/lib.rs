//! # textdex - Sparse character and line index for large text files
//!
//! textdex reads a text file once, in parallel, and records a bounded number
//! of `(ordinal, byte offset)` checkpoints for characters and for lines.
//! Afterwards the byte offset of any character or line is found by jumping
//! to the nearest checkpoint and decoding forward a short distance.
//!
//! ## Architecture
//!
//! The crate is organized into these main modules:
//!
//! - [`index`] - Indexing run: configuration, entry budget, leader and workers
//! - [`access`] - Position lookups and positioned readers over a built index
//! - [`utils`] - Encodings, byte sources, progress reporting
//! - [`error`] - Error taxonomy
//!
//! ## Quick Start
//!
//! ```ignore
//! use textdex::{Encoding, TextFileAccessor};
//! use std::io::Read;
//!
//! let accessor = TextFileAccessor::open("/var/log/big.log", Encoding::Utf8)?;
//! println!("{} lines", accessor.number_of_lines());
//!
//! let offset = accessor.file_position_at_line(1_000_000)?;
//! let mut reader = accessor.reader_at_line(1_000_000)?;
//! let mut line = String::new();
//! reader.read_line(&mut line)?;
//! ```
//!
//! ## Positions
//!
//! Character ordinals count UTF-16 code units, so a supplementary character
//! occupies two ordinals and the second one has no byte position of its own.
//! Lines are terminated by LF, CR or CRLF; a final line without terminator
//! still counts.

pub mod access;
pub mod error;
pub mod index;
pub mod utils;

pub use access::{Cursor, TextFileAccessor, TextReader};
pub use error::{OrdinalKind, TextIndexError};
pub use index::{IndexConfig, IndexSummary};
pub use utils::{Encoding, IndexProgress, ReadStrategy};

pub type Result<T> = std::result::Result<T, TextIndexError>;
