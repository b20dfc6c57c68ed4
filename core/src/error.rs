//! Error types for bm25-core

use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    /// Rejected before any work starts: bad thread count or hyperparameters
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A query token has no vocabulary entry
    #[error("unknown term: {0:?}")]
    UnknownTerm(String),

    /// Document or term index outside the built tables
    #[error("{what} index {index} out of range (len {len})")]
    OutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    /// Statistics or scores requested before `build` completed
    #[error("index has not been built")]
    NotBuilt,

    /// `build` called before any documents were loaded
    #[error("no documents loaded")]
    NotLoaded,

    /// `load` or `build` called on an index that is already built
    #[error("index is already built")]
    AlreadyBuilt,

    /// I/O error while reading a corpus
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid configuration error
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Error::InvalidConfiguration(msg.into())
    }

    pub(crate) fn doc_out_of_range(index: usize, len: usize) -> Self {
        Error::OutOfRange {
            what: "document",
            index,
            len,
        }
    }

    pub(crate) fn term_out_of_range(index: usize, len: usize) -> Self {
        Error::OutOfRange {
            what: "term",
            index,
            len,
        }
    }
}
