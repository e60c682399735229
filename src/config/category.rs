use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// The kind of record being stored: the grid master config, or one of the
/// two detail preset kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Grid,
    Filter,
    Sort,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Grid => "grid",
            Category::Filter => "filter",
            Category::Sort => "sort",
        }
    }

    /// Whether this category identifies the master record.
    pub fn is_master(&self) -> bool {
        matches!(self, Category::Grid)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "grid" => Ok(Category::Grid),
            "filter" => Ok(Category::Filter),
            "sort" => Ok(Category::Sort),
            other => Err(ConfigError::UnknownCategory(other.to_string())),
        }
    }
}

/// Where personalization state is persisted.
///
/// Selected once per store construction; an unrecognized selector is a fatal
/// configuration error, never a silent default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    Session,
    Cookie,
    Db,
}

impl StorageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageType::Session => "session",
            StorageType::Cookie => "cookie",
            StorageType::Db => "db",
        }
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "session" => Ok(StorageType::Session),
            "cookie" => Ok(StorageType::Cookie),
            "db" => Ok(StorageType::Db),
            other => Err(ConfigError::UnknownStorage(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_round_trip() {
        for cat in [Category::Grid, Category::Filter, Category::Sort] {
            assert_eq!(cat.as_str().parse::<Category>().unwrap(), cat);
        }
    }

    #[test]
    fn unknown_category_rejected() {
        let err = "theme".parse::<Category>().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownCategory(_)));
    }

    #[test]
    fn only_grid_is_master() {
        assert!(Category::Grid.is_master());
        assert!(!Category::Filter.is_master());
        assert!(!Category::Sort.is_master());
    }

    #[test]
    fn storage_round_trip() {
        for storage in [StorageType::Session, StorageType::Cookie, StorageType::Db] {
            assert_eq!(storage.as_str().parse::<StorageType>().unwrap(), storage);
        }
    }

    #[test]
    fn unknown_storage_rejected() {
        let err = "redis".parse::<StorageType>().unwrap_err();
        assert_eq!(err, ConfigError::UnknownStorage("redis".to_string()));
    }
}
