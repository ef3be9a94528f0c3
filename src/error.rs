//! Error types for pagesmith.

use std::fmt;
use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for pagesmith operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the engine.
///
/// Every variant maps onto exactly one [`ErrorKind`], so callers can branch on
/// [`Error::kind`] without matching message text.
#[derive(Error, Debug)]
pub enum Error {
    /// Unsupported format hint or corrupt input bytes.
    #[error("Invalid input: {0}")]
    Input(String),

    /// Page index out of bounds, or an empty / inverted range.
    #[error("Invalid page range: {0}")]
    Range(String),

    /// A provider explicitly rejected the supplied password.
    #[error("Password rejected: {0}")]
    Password(String),

    /// No available provider supports the requested feature.
    #[error("Not supported by any available provider: {0}")]
    LibraryLimitation(String),

    /// A target-format writer failed.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Propagated verbatim from the storage gateway.
    #[error("Storage error: {0}")]
    Storage(String),

    /// I/O error when reading or writing local files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// The taxonomy bucket of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Input(_) => ErrorKind::InputError,
            Error::Range(_) => ErrorKind::RangeError,
            Error::Password(_) => ErrorKind::PasswordError,
            Error::LibraryLimitation(_) => ErrorKind::LibraryLimitation,
            Error::Serialization(_) => ErrorKind::SerializationError,
            Error::Storage(_) | Error::Io(_) => ErrorKind::StorageError,
        }
    }

    /// Human-readable message without the kind prefix.
    pub fn message(&self) -> String {
        match self {
            Error::Input(m)
            | Error::Range(m)
            | Error::Password(m)
            | Error::LibraryLimitation(m)
            | Error::Serialization(m)
            | Error::Storage(m) => m.clone(),
            Error::Io(e) => e.to_string(),
        }
    }

    /// Structured `{kind, message}` form for callers and the CLI.
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind(),
            message: self.message(),
        }
    }
}

/// Error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InputError,
    RangeError,
    PasswordError,
    LibraryLimitation,
    SerializationError,
    StorageError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::InputError => "InputError",
            ErrorKind::RangeError => "RangeError",
            ErrorKind::PasswordError => "PasswordError",
            ErrorKind::LibraryLimitation => "LibraryLimitation",
            ErrorKind::SerializationError => "SerializationError",
            ErrorKind::StorageError => "StorageError",
        };
        f.write_str(name)
    }
}

/// Serializable error payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            _ => Error::Input(format!("PDF structure: {}", err)),
        }
    }
}

impl From<pdf_extract::OutputError> for Error {
    fn from(err: pdf_extract::OutputError) -> Self {
        Error::Input(format!("text extraction: {}", err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(format!("JSON: {}", err))
    }
}
