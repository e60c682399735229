//! Personalization-state storage for tabular data grids.
//!
//! A grid's personalization is one **master** record (page size, theme,
//! visible columns, default filter/sort references) plus named **detail**
//! presets (saved filters and sorts). This crate decides where those records
//! live — in-memory session, client cookie, or relational table — behind one
//! backend contract, derives deterministic per-user/per-widget storage keys,
//! and merges partial updates without clobbering unrelated state.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use gridprefs::{
//!     ConfigStore, GridIdentity, InMemorySessionStore, MasterConfig,
//!     StorageContext, StorageType, StoreSettings,
//! };
//!
//! let context = StorageContext::new("gridprefs", "a-process-scoped-salt")
//!     .with_session(Arc::new(InMemorySessionStore::new()));
//!
//! let store = ConfigStore::new(
//!     StoreSettings::master(GridIdentity::shared("orders-grid"), StorageType::Session),
//!     &context,
//! )?;
//!
//! let mut config = MasterConfig::new(20, "panel-primary");
//! config.visible_keys = vec!["id".into(), "total".into()];
//! store.save_master(&config)?;
//! assert_eq!(store.fetch_master()?, Some(config));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod backend;
mod codec;
mod config;
mod key;
mod settings;
mod signature;
mod store;

pub use backend::{
    BackendError, ConfigDb, CookieBackend, CookieJar, CookieSettings, DbBackend,
    DbDetailSettings, DbSettings, Field, InMemoryConfigDb, InMemoryCookieJar,
    InMemorySessionStore, SessionBackend, SessionStore, StorageBackend, WriteRecord,
};
pub use codec::{decode, decode_as, encode, CodecError, Envelope};
pub use config::{
    Category, ConfigError, ConfigMap, DetailRecord, GridIdentity, MasterConfig, StorageType,
    DEFAULT_PAGE_SIZE, DEFAULT_THEME,
};
pub use key::{derive_key, KeyScope};
pub use settings::{SettingsEntity, SettingsRequest};
pub use signature::{sign, verify, SignatureError};
pub use store::{ConfigStore, StorageContext, StoreError, StoreSettings};
