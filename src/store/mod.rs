//! The orchestrator tying identity, keys, codec, and backend together.
//!
//! A [`ConfigStore`] is built per request for one (widget, category, user)
//! scope: it resolves storage keys, selects the backend from the
//! [`StorageContext`] once at construction, and implements the
//! merge-on-save / fetch / delete semantics. Every call runs
//! resolve-key → read-existing (when the upsert decision needs it) →
//! write-or-delete; no intermediate state is observable to callers.

mod context;
mod error;

use std::collections::BTreeMap;
use std::sync::Arc;

use log::{debug, warn};

use crate::backend::{Field, StorageBackend, WriteRecord};
use crate::codec;
use crate::config::{Category, ConfigError, ConfigMap, GridIdentity, MasterConfig, StorageType};
use crate::key::KeyScope;

pub use context::StorageContext;
pub use error::StoreError;

/// Construction parameters for one store instance.
#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub identity: GridIdentity,
    pub category: Category,
    pub storage: StorageType,
    /// Detail preset name; required for detail categories unless an
    /// explicit `detail_key` addresses an existing record.
    pub name: Option<String>,
    /// Explicit detail key, used when an existing preset is addressed by
    /// its stored id instead of by name.
    pub detail_key: Option<String>,
    /// Relational rename-without-payload mode for detail saves.
    pub update_name_only: bool,
}

impl StoreSettings {
    /// Settings for the grid master record.
    pub fn master(identity: GridIdentity, storage: StorageType) -> Self {
        StoreSettings {
            identity,
            category: Category::Grid,
            storage,
            name: None,
            detail_key: None,
            update_name_only: false,
        }
    }

    /// Settings for a named detail preset.
    pub fn detail(
        identity: GridIdentity,
        storage: StorageType,
        category: Category,
        name: impl Into<String>,
    ) -> Self {
        StoreSettings {
            identity,
            category,
            storage,
            name: Some(name.into()),
            detail_key: None,
            update_name_only: false,
        }
    }

    pub fn with_detail_key(mut self, detail_key: impl Into<String>) -> Self {
        self.detail_key = Some(detail_key.into());
        self
    }

    pub fn with_update_name_only(mut self, update_name_only: bool) -> Self {
        self.update_name_only = update_name_only;
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.identity.validate()?;
        if !self.category.is_master()
            && self.name.as_deref().map_or(true, |n| n.trim().is_empty())
            && self.detail_key.as_deref().map_or(true, str::is_empty)
        {
            return Err(ConfigError::MissingName(self.category));
        }
        Ok(())
    }
}

/// Per-request storage orchestrator for one record.
pub struct ConfigStore {
    settings: StoreSettings,
    scope: KeyScope,
    backend: Arc<dyn StorageBackend>,
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("settings", &self.settings)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl ConfigStore {
    /// Resolve keys and select the backend. Identity problems and an
    /// unconfigured backend fail here, before any storage I/O.
    pub fn new(settings: StoreSettings, context: &StorageContext) -> Result<Self, ConfigError> {
        settings.validate()?;
        let backend = context.backend(settings.storage)?;
        let scope = KeyScope::derive(
            &settings.identity,
            settings.category,
            settings.name.as_deref(),
            settings.detail_key.clone(),
        );
        Ok(ConfigStore {
            settings,
            scope,
            backend,
        })
    }

    pub fn category(&self) -> Category {
        self.settings.category
    }

    /// The key this store's record lives under.
    pub fn record_key(&self) -> &str {
        self.scope.record_key()
    }

    pub fn master_key(&self) -> &str {
        &self.scope.master_key
    }

    fn expect_master(&self) -> Result<(), ConfigError> {
        if !self.settings.category.is_master() {
            return Err(ConfigError::CategoryMismatch {
                expected: "grid",
                actual: self.settings.category,
            });
        }
        Ok(())
    }

    fn expect_detail(&self) -> Result<(), ConfigError> {
        if self.settings.category.is_master() {
            return Err(ConfigError::CategoryMismatch {
                expected: "detail",
                actual: self.settings.category,
            });
        }
        Ok(())
    }

    /// The decoded master config, or `None` when nothing was saved yet.
    ///
    /// An unparseable stored payload reads as absent: personalization
    /// silently resets to defaults rather than failing the request. The
    /// filter/sort references are read through [`Field::FilterRef`] /
    /// [`Field::SortRef`] so the relational column split stays invisible.
    pub fn fetch_master(&self) -> Result<Option<MasterConfig>, StoreError> {
        self.expect_master()?;
        let Some(raw) = self.backend.read(&self.scope, Field::Data)? else {
            return Ok(None);
        };
        let Some(mut config) = codec::decode_as::<MasterConfig>(&raw) else {
            warn!("unparseable master config for {}, treating as absent", self.record_key());
            return Ok(None);
        };
        config.filter_id = self.backend.read(&self.scope, Field::FilterRef)?;
        config.sort_id = self.backend.read(&self.scope, Field::SortRef)?;
        Ok(Some(config))
    }

    /// The decoded payload of the current detail preset, or `None`.
    pub fn fetch_detail(&self) -> Result<Option<ConfigMap>, StoreError> {
        self.expect_detail()?;
        let raw = self.backend.read(&self.scope, Field::Data)?;
        Ok(raw.map(|raw| codec::decode(&raw)))
    }

    /// Raw column access for one field of the current record.
    pub fn fetch_field(&self, field: Field) -> Result<Option<String>, StoreError> {
        Ok(self.backend.read(&self.scope, field)?)
    }

    /// Write the master config. Re-saving an identical config is a no-op in
    /// effect: the stored state is equivalent after every repetition.
    pub fn save_master(&self, config: &MasterConfig) -> Result<(), StoreError> {
        self.expect_master()?;
        debug!("saving master config for {}", self.record_key());
        self.backend.write(&self.scope, WriteRecord::Master(config))?;
        Ok(())
    }

    /// Write this store's detail preset with the given payload.
    pub fn save_detail(&self, data: &ConfigMap) -> Result<(), StoreError> {
        self.expect_detail()?;
        let name = self
            .settings
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or(ConfigError::MissingName(self.settings.category))?;
        debug!(
            "saving {} preset {:?} under {}",
            self.settings.category,
            name,
            self.record_key()
        );
        self.backend.write(
            &self.scope,
            WriteRecord::Detail {
                name,
                data,
                update_name_only: self.settings.update_name_only,
            },
        )?;
        Ok(())
    }

    /// Remove the current record. A master delete removes only the master
    /// record; details are deleted independently.
    pub fn delete(&self) -> Result<(), StoreError> {
        debug!("deleting {} record {}", self.settings.category, self.record_key());
        self.backend.delete(&self.scope)?;
        Ok(())
    }

    /// Scrub the master's default filter/sort reference for `category`.
    ///
    /// The relational backend nulls the column in place; the blob backends
    /// rewrite the reference out of the stored master config.
    pub fn clear_reference(&self, category: Category) -> Result<(), StoreError> {
        self.expect_master()?;
        if category.is_master() {
            return Err(ConfigError::CategoryMismatch {
                expected: "detail",
                actual: category,
            }
            .into());
        }
        debug!("scrubbing {} reference from master {}", category, self.master_key());
        self.backend.clear_reference(&self.scope, category)?;
        Ok(())
    }

    /// Saved presets of one category for this grid, id → display name.
    pub fn detail_list(&self, category: Category) -> Result<BTreeMap<String, String>, StoreError> {
        Ok(self.backend.list_details(&self.scope, category)?)
    }
}
