//! The per-request binding between a submitted detail form and storage.
//!
//! A [`SettingsEntity`] wraps one filter/sort preset's identity and payload,
//! owns the [`ConfigStore`] for it, and carries the signature contract that
//! authorizes save and delete requests: the form embeds the signature this
//! entity generates, and the submitted copy must verify before any mutation
//! is applied.

mod render;

use std::collections::BTreeMap;
use std::sync::Arc;

use log::warn;

use crate::config::{Category, ConfigError, ConfigMap, DetailRecord, GridIdentity, StorageType};
use crate::signature::{sign, verify, SignatureError};
use crate::store::{ConfigStore, StorageContext, StoreError, StoreSettings};

/// The submitted form payload a detail save/delete request carries.
#[derive(Debug, Clone)]
pub struct SettingsRequest {
    pub widget_id: String,
    pub category: Category,
    pub storage: StorageType,
    pub user_specific: bool,
    pub user_id: Option<String>,
    /// Preset display name from the form.
    pub name: String,
    /// Id of an existing preset selected for editing, if any.
    pub edit_id: Option<String>,
    /// The preset payload.
    pub data: ConfigMap,
    pub update_name_only: bool,
}

/// One detail record bound to its store for the duration of a request.
pub struct SettingsEntity {
    context: Arc<StorageContext>,
    identity: GridIdentity,
    storage: StorageType,
    record: DetailRecord,
    update_name_only: bool,
    store: ConfigStore,
}

impl std::fmt::Debug for SettingsEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsEntity")
            .field("identity", &self.identity)
            .field("storage", &self.storage)
            .field("record", &self.record)
            .field("update_name_only", &self.update_name_only)
            .finish_non_exhaustive()
    }
}

impl SettingsEntity {
    pub fn new(
        request: SettingsRequest,
        context: Arc<StorageContext>,
    ) -> Result<Self, ConfigError> {
        let identity = GridIdentity {
            widget_id: request.widget_id,
            user_specific: request.user_specific,
            user_id: request.user_id,
        };
        let mut settings = StoreSettings::detail(
            identity.clone(),
            request.storage,
            request.category,
            request.name.clone(),
        )
        .with_update_name_only(request.update_name_only);
        if let Some(edit_id) = &request.edit_id {
            settings = settings.with_detail_key(edit_id.clone());
        }
        let store = ConfigStore::new(settings, &context)?;
        let record = DetailRecord::new(
            request.name,
            request.category,
            request.data,
            store.master_key(),
        );
        record.validate()?;
        Ok(SettingsEntity {
            context,
            identity,
            storage: request.storage,
            record,
            update_name_only: request.update_name_only,
            store,
        })
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn category(&self) -> Category {
        self.record.category
    }

    /// The key this preset is stored under.
    pub fn record_key(&self) -> &str {
        self.store.record_key()
    }

    /// The ordered attribute values the signature covers. Payload contents
    /// are deliberately outside this set.
    fn signed_attributes(&self) -> [String; 6] {
        [
            self.context.module_id().to_string(),
            self.identity.widget_id.clone(),
            self.record.category.as_str().to_string(),
            self.storage.as_str().to_string(),
            flag(self.identity.user_specific),
            flag(self.update_name_only),
        ]
    }

    /// The signature the rendered form embeds for later verification.
    pub fn signature(&self) -> String {
        let attributes = self.signed_attributes();
        let values: Vec<&str> = attributes.iter().map(String::as_str).collect();
        sign(&values, self.context.salt())
    }

    /// Verify a submitted signature against this entity's attributes.
    ///
    /// Fails closed with a human-readable reason; never panics on malformed
    /// input. Callers surface the reason and reject the request.
    pub fn validate_signature(&self, submitted: &str) -> Result<(), SignatureError> {
        let attributes = self.signed_attributes();
        let values: Vec<&str> = attributes.iter().map(String::as_str).collect();
        let outcome = verify(submitted, &values, self.context.salt());
        if let Err(reason) = &outcome {
            warn!(
                "rejecting {} settings request for {}: {}",
                self.record.category,
                self.identity.widget_id,
                reason
            );
        }
        outcome
    }

    /// Persist the preset under its derived key.
    pub fn save(&self) -> Result<(), StoreError> {
        self.store.save_detail(&self.record.data)
    }

    /// Delete the preset, scrubbing the master's reference to it first so a
    /// concurrent master read never observes a dangling id.
    pub fn delete(&self) -> Result<(), StoreError> {
        let master = ConfigStore::new(
            StoreSettings::master(self.identity.clone(), self.storage),
            &self.context,
        )?;
        master.clear_reference(self.record.category)?;
        self.store.delete()
    }

    /// Saved presets of this entity's category, id → display name.
    pub fn detail_list(&self) -> Result<BTreeMap<String, String>, StoreError> {
        self.store.detail_list(self.record.category)
    }

    /// The stored payload rendered for display: `Label = value` lines for
    /// filters, `Label ascending|descending` lines for sorts. Empty string
    /// when nothing is stored.
    pub fn data_config(&self) -> Result<String, StoreError> {
        let Some(data) = self.store.fetch_detail()? else {
            return Ok(String::new());
        };
        if data.is_empty() {
            return Ok(String::new());
        }
        Ok(match self.record.category {
            Category::Filter => render::render_filter(&data),
            _ => render::render_sort(&data),
        })
    }
}

fn flag(value: bool) -> String {
    if value { "1" } else { "0" }.to_string()
}
