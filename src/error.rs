//! Error taxonomy for index building and positioned access.

use crate::utils::Encoding;
use std::fmt;
use std::io;
use thiserror::Error;

/// Which of the two ordinal spaces an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrdinalKind {
    Char,
    Line,
    Byte,
}

impl fmt::Display for OrdinalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrdinalKind::Char => f.write_str("character"),
            OrdinalKind::Line => f.write_str("line"),
            OrdinalKind::Byte => f.write_str("byte"),
        }
    }
}

/// Errors produced while indexing a file or resolving positions in it.
#[derive(Debug, Error)]
pub enum TextIndexError {
    /// Invalid entry maxima, buffer sizes or an encoding outside the allow-list.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A requested ordinal is not below the indexed total.
    #[error("{kind} {ordinal} is out of range (file has {count})")]
    OutOfRange {
        kind: OrdinalKind,
        ordinal: u64,
        count: u64,
    },

    /// The file ended before a positioned skip reached its target; it changed
    /// after indexing and has to be re-indexed.
    #[error("file truncated: {kind} {ordinal} not reachable (stopped at byte {position})")]
    Truncated {
        kind: OrdinalKind,
        ordinal: u64,
        position: u64,
    },

    /// A worker failed while scanning its sub-partition; the run was aborted.
    #[error("index worker {worker} failed: {message}")]
    Worker { worker: usize, message: String },

    /// Bytes that do not decode under the active encoding.
    #[error("malformed {encoding} input at byte {position}")]
    Malformed { encoding: Encoding, position: u64 },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl TextIndexError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        TextIndexError::Configuration(msg.into())
    }

    /// True for every error that reflects a failed read of the underlying
    /// file rather than a caller mistake.
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            TextIndexError::Io(_)
                | TextIndexError::Truncated { .. }
                | TextIndexError::Worker { .. }
                | TextIndexError::Malformed { .. }
        )
    }
}

impl From<TextIndexError> for io::Error {
    fn from(err: TextIndexError) -> Self {
        match err {
            TextIndexError::Io(e) => e,
            TextIndexError::OutOfRange { .. } | TextIndexError::Configuration(_) => {
                io::Error::new(io::ErrorKind::InvalidInput, err)
            }
            TextIndexError::Truncated { .. } => io::Error::new(io::ErrorKind::UnexpectedEof, err),
            TextIndexError::Malformed { .. } => io::Error::new(io::ErrorKind::InvalidData, err),
            TextIndexError::Worker { .. } => io::Error::other(err),
        }
    }
}
