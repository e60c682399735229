use std::fmt;

use super::Category;

/// Configuration mistakes: wrong wiring, not runtime conditions.
///
/// These are raised at construction or first use and are never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Storage selector did not parse to a known backend.
    UnknownStorage(String),
    /// Category selector did not parse.
    UnknownCategory(String),
    /// The selected backend has no collaborator wired into the context.
    StorageNotConfigured(&'static str),
    /// A grid identity was built without a widget id.
    MissingWidgetId,
    /// User-specific storage was requested without a resolved user id.
    MissingUserId,
    /// A detail operation needs a non-empty preset name.
    MissingName(Category),
    /// An operation valid only for one record kind was called on the other.
    CategoryMismatch {
        expected: &'static str,
        actual: Category,
    },
    /// A visible column key is not part of the widget's column set.
    UnknownVisibleKey(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnknownStorage(value) => write!(f, "unknown storage type: {}", value),
            ConfigError::UnknownCategory(value) => write!(f, "unknown category: {}", value),
            ConfigError::StorageNotConfigured(storage) => {
                write!(f, "no {} collaborator configured in the storage context", storage)
            }
            ConfigError::MissingWidgetId => write!(f, "the grid widget id must be entered"),
            ConfigError::MissingUserId => {
                write!(f, "user-specific storage requires a resolved user id")
            }
            ConfigError::MissingName(category) => {
                write!(f, "a {} preset requires a non-empty name", category)
            }
            ConfigError::CategoryMismatch { expected, actual } => {
                write!(f, "expected a {} store, got category {}", expected, actual)
            }
            ConfigError::UnknownVisibleKey(key) => {
                write!(f, "visible key {} is not in the widget column set", key)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
