//! Typed value objects for grid personalization state.
//!
//! A grid's personalization splits into one **master** record (page size,
//! theme, visible columns, default filter/sort references) and any number of
//! named **detail** records (saved filter or sort presets). Both are plain
//! serde structs validated at construction; storage concerns live elsewhere.

mod category;
mod detail;
mod error;
mod identity;
mod master;

use serde_json::Map;

/// Opaque key-value payload carried by detail records and decoded blobs.
pub type ConfigMap = Map<String, serde_json::Value>;

pub use category::{Category, StorageType};
pub use detail::DetailRecord;
pub use error::ConfigError;
pub use identity::GridIdentity;
pub use master::{MasterConfig, DEFAULT_PAGE_SIZE, DEFAULT_THEME};
