use std::collections::BTreeMap;

use serde_json::Value;

use crate::config::{Category, ConfigMap};

use super::{decode, encode, CodecError};

const NAME: &str = "name";
const DATA: &str = "data";

/// The single blob the session and cookie backends keep per master key:
///
/// ```json
/// {
///   "grid": "<encoded master config>",
///   "filter": { "<detailKey>": {"name": "...", "data": "<encoded payload>"} },
///   "sort":   { "<detailKey>": {"name": "...", "data": "<encoded payload>"} }
/// }
/// ```
///
/// Category payloads stay encoded strings inside the blob, so writing one
/// category never re-interprets another's contents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Envelope {
    entries: ConfigMap,
}

impl Envelope {
    /// Decode a stored blob. Corrupt input yields an empty envelope.
    pub fn from_raw(raw: &str) -> Self {
        Envelope { entries: decode(raw) }
    }

    pub fn encode(&self) -> Result<String, CodecError> {
        encode(&self.entries)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The encoded master config, if one was saved.
    pub fn master(&self) -> Option<&str> {
        self.entries.get(Category::Grid.as_str()).and_then(Value::as_str)
    }

    pub fn set_master(&mut self, encoded: String) {
        self.entries
            .insert(Category::Grid.as_str().to_string(), Value::String(encoded));
    }

    pub fn remove_master(&mut self) {
        self.entries.remove(Category::Grid.as_str());
    }

    fn category_map(&self, category: Category) -> Option<&ConfigMap> {
        self.entries.get(category.as_str()).and_then(Value::as_object)
    }

    /// The encoded payload stored for one detail key.
    pub fn detail_data(&self, category: Category, key: &str) -> Option<&str> {
        self.category_map(category)?
            .get(key)?
            .get(DATA)
            .and_then(Value::as_str)
    }

    /// The display name stored for one detail key.
    pub fn detail_name(&self, category: Category, key: &str) -> Option<&str> {
        self.category_map(category)?
            .get(key)?
            .get(NAME)
            .and_then(Value::as_str)
    }

    /// Insert or replace a detail entry.
    pub fn set_detail(&mut self, category: Category, key: &str, name: &str, encoded: String) {
        let mut entry = ConfigMap::new();
        entry.insert(NAME.to_string(), Value::String(name.to_string()));
        entry.insert(DATA.to_string(), Value::String(encoded));

        let slot = self
            .entries
            .entry(category.as_str().to_string())
            .or_insert_with(|| Value::Object(ConfigMap::new()));
        if !slot.is_object() {
            // stored category slot was corrupted into a non-map; reset it
            *slot = Value::Object(ConfigMap::new());
        }
        if let Some(map) = slot.as_object_mut() {
            map.insert(key.to_string(), Value::Object(entry));
        }
    }

    /// Remove a detail entry. Returns whether it existed.
    pub fn remove_detail(&mut self, category: Category, key: &str) -> bool {
        match self
            .entries
            .get_mut(category.as_str())
            .and_then(Value::as_object_mut)
        {
            Some(map) => map.remove(key).is_some(),
            None => false,
        }
    }

    /// Project one category to a detail-key → display-name listing.
    pub fn details(&self, category: Category) -> BTreeMap<String, String> {
        let mut listing = BTreeMap::new();
        if let Some(map) = self.category_map(category) {
            for (key, entry) in map {
                if let Some(name) = entry.get(NAME).and_then(Value::as_str) {
                    listing.insert(key.clone(), name.to_string());
                }
            }
        }
        listing
    }
}
