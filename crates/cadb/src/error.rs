//! Certificate database error types.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for certificate database operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Which secondary index reported a key collision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    /// Canonical serial number index.
    Serial,
    /// Subject name index over valid records.
    Subject,
}

impl std::fmt::Display for IndexKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Serial => f.write_str("serial"),
            Self::Subject => f.write_str("subject"),
        }
    }
}

/// Certificate database error variants.
#[derive(Debug, Error)]
pub enum Error {
    /// A file required for loading does not exist.
    #[error("file not found: {}", path.display())]
    NotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// A record line or field could not be parsed.
    #[error("malformed record at {}:{line}: {reason}", path.display())]
    MalformedRecord {
        /// File the record came from (empty for in-memory records).
        path: PathBuf,
        /// 1-based line number, 0 when not read from a file.
        line: usize,
        /// What was wrong.
        reason: String,
    },

    /// Two records collide on a unique index.
    #[error("duplicate {index} key {key:?} (records {existing} and {conflicting})")]
    DuplicateKey {
        /// The index that rejected the key.
        index: IndexKind,
        /// The canonical key value.
        key: String,
        /// Position of the record already holding the key.
        existing: usize,
        /// Position of the record that collided.
        conflicting: usize,
    },

    /// An underlying read, write or rename failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Path the operation targeted.
        path: PathBuf,
        /// The OS error.
        #[source]
        source: std::io::Error,
    },

    /// A derived file name exceeds the filesystem name limit.
    #[error("file name too long: {}", path.display())]
    NameTooLong {
        /// The offending path.
        path: PathBuf,
    },

    /// A multi-step rename sequence failed after an earlier step succeeded.
    #[error(
        "partial rotation of {}: {reason} ({})",
        path.display(),
        if *rolled_back { "rolled back" } else { "rollback incomplete" }
    )]
    PartialRotation {
        /// Base path being rotated.
        path: PathBuf,
        /// Which step failed and why, and any rollback step that also failed.
        reason: String,
        /// Whether every completed step was undone, leaving the previous
        /// files live.
        rolled_back: bool,
    },

    /// A caller-supplied timestamp could not be interpreted.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// The serial file does not hold a canonical hex integer.
    #[error("malformed serial in {}: {reason}", path.display())]
    MalformedSerial {
        /// Serial file path.
        path: PathBuf,
        /// What was wrong.
        reason: String,
    },

    /// No record carries the requested serial.
    #[error("record not found: {0}")]
    RecordNotFound(String),

    /// A status change that the record lifecycle does not allow.
    #[error("invalid transition for serial {serial}: {from} -> {to}")]
    InvalidTransition {
        /// Serial of the record.
        serial: String,
        /// Current status code.
        from: char,
        /// Requested status code.
        to: char,
    },

    /// Options failed validation.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Wraps an I/O error, mapping a missing file to [`Error::NotFound`].
    pub(crate) fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound { path }
        } else {
            Self::Io { path, source }
        }
    }
}
