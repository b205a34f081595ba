//! Read-side API over a finished index.
//!
//! ## Modules
//!
//! - [`accessor`] - Opens and indexes a file, answers position lookups
//! - [`cursor`] - Per-caller context remembering the last resolved position
//! - [`reader`] - Positioned reader returned by the lookups

pub mod accessor;
pub mod cursor;
pub mod reader;

pub use accessor::TextFileAccessor;
pub use cursor::Cursor;
pub use reader::TextReader;
