//! Deterministic storage-key derivation.
//!
//! Keys are pure functions of the grid identity, the record category, and
//! (for detail records) the preset name. The same logical identity always
//! yields the same key; preset names are compared case-insensitively by
//! hashing their lowercased form.
//!
//! The name token is a 32-bit CRC rendered as 8 hex chars. Collisions are
//! rare but possible and are not resolved per instance: two presets whose
//! lowercased names collide share a key, and the later save wins. The width
//! is kept as-is because the keys are observable in stored state.

use crate::config::{Category, GridIdentity};

/// Fixed-width, URL-safe token for a detail preset name.
fn name_token(name: &str) -> String {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(name.to_lowercase().as_bytes());
    format!("{:08x}", hasher.finalize())
}

/// Derive the storage key for one record.
///
/// - `Category::Grid`: `widgetId` (+ `_userId` when user-specific).
/// - detail categories: `widgetId_category_token(name)` (+ `_userId`).
pub fn derive_key(identity: &GridIdentity, category: Category, detail_name: Option<&str>) -> String {
    let mut key = identity.widget_id.clone();
    if !category.is_master() {
        let name = detail_name.unwrap_or_default();
        key.push('_');
        key.push_str(category.as_str());
        key.push('_');
        key.push_str(&name_token(name));
    }
    if identity.user_specific {
        if let Some(user_id) = &identity.user_id {
            key.push('_');
            key.push_str(user_id);
        }
    }
    key
}

/// The resolved keys for one store instance: the master key is always
/// present (detail records are grouped under it), the detail key only for
/// detail categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyScope {
    pub master_key: String,
    pub detail_key: Option<String>,
    pub category: Category,
}

impl KeyScope {
    /// Resolve keys for the given identity and category.
    ///
    /// `detail_key_override` short-circuits name derivation when an existing
    /// preset is addressed by its stored id (editing from the saved list).
    pub fn derive(
        identity: &GridIdentity,
        category: Category,
        detail_name: Option<&str>,
        detail_key_override: Option<String>,
    ) -> Self {
        let master_key = derive_key(identity, Category::Grid, None);
        let detail_key = if category.is_master() {
            None
        } else {
            Some(detail_key_override.filter(|key| !key.is_empty()).unwrap_or_else(|| {
                derive_key(identity, category, detail_name)
            }))
        };
        KeyScope {
            master_key,
            detail_key,
            category,
        }
    }

    /// The key the record itself lives under.
    pub fn record_key(&self) -> &str {
        self.detail_key.as_deref().unwrap_or(&self.master_key)
    }
}
