//! Crate-wide error type and result alias.
//!
//! `MalformedHistory`, `NotFound`, and `InternalInvariantViolation` are the
//! only variants the core itself ever raises; `Io`/`Codec` exist for the
//! (de)serialization boundary in [`crate::codec`].

use std::fmt;

/// Crate-wide result alias.
pub type CResult<T> = Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// Empty history, non-contiguous txn ids, or malformed result rows.
    MalformedHistory(String),

    /// `who_wrote`/`final_version` found no matching history element.
    NotFound(String),

    /// A cycle classified under no known anomaly, or under more than one
    /// minimal anomaly. Indicates a bug in the taxonomy or the DSG, not bad
    /// input.
    InternalInvariantViolation(String),

    /// (De)serialization of a history failed.
    Codec(String),

    /// Underlying I/O failure while reading/writing a history file.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MalformedHistory(msg) => write!(f, "malformed history: {msg}"),
            Error::NotFound(msg) => write!(f, "not found: {msg}"),
            Error::InternalInvariantViolation(msg) => {
                write!(f, "internal invariant violation: {msg}")
            }
            Error::Codec(msg) => write!(f, "codec error: {msg}"),
            Error::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::Codec(err.to_string())
    }
}
