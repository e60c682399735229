use std::fmt;

use crate::backend::BackendError;
use crate::codec::CodecError;
use crate::config::ConfigError;

/// Umbrella error for orchestrator calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Wiring mistake; fatal, never retried.
    Config(ConfigError),
    /// Storage-layer failure, surfaced without retry.
    Backend(BackendError),
    /// Encode failure while preparing a write.
    Codec(CodecError),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Config(err) => err.fmt(f),
            StoreError::Backend(err) => err.fmt(f),
            StoreError::Codec(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<ConfigError> for StoreError {
    fn from(err: ConfigError) -> Self {
        StoreError::Config(err)
    }
}

impl From<BackendError> for StoreError {
    fn from(err: BackendError) -> Self {
        StoreError::Backend(err)
    }
}

impl From<CodecError> for StoreError {
    fn from(err: CodecError) -> Self {
        StoreError::Codec(err)
    }
}
