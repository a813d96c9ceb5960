//! Error types for the waygraph library

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// I/O failure with the file it happened on.
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The store's on-disk state is internally inconsistent: framing, checksum
    /// or length-alignment failures, missing graph nodes, access-restriction
    /// presence bits without a matching association. Not recoverable.
    #[error("store corrupt: {what}")]
    Corrupt { what: String },

    /// A mutating operation was attempted on a store opened read-only.
    #[error("store is opened read-only")]
    ReadOnly,
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub fn corrupt(what: impl Into<String>) -> Self {
        Error::Corrupt { what: what.into() }
    }
}
