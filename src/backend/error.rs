use std::fmt;

use crate::codec::CodecError;

/// Storage-layer failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Primary-key violation on insert. Recovered internally by the upsert
    /// path; only surfaced when a collaborator reports it outside one.
    DuplicateKey { table: String, id: String },
    /// Collaborator I/O failure (store unreachable, driver error). Surfaced
    /// to the caller as-is; retry policy belongs to the caller.
    Storage(String),
    /// Serialization failure while preparing a write.
    Serde(String),
    /// An in-memory store's lock was poisoned.
    LockPoisoned(&'static str),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::DuplicateKey { table, id } => {
                write!(f, "duplicate key {} in {}", id, table)
            }
            BackendError::Storage(message) => write!(f, "storage error: {}", message),
            BackendError::Serde(message) => write!(f, "serialization error: {}", message),
            BackendError::LockPoisoned(operation) => {
                write!(f, "store lock poisoned during {}", operation)
            }
        }
    }
}

impl std::error::Error for BackendError {}

impl From<CodecError> for BackendError {
    fn from(err: CodecError) -> Self {
        BackendError::Serde(err.to_string())
    }
}
