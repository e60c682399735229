use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Fallbacks applied when a grid has no stored personalization yet.
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const DEFAULT_THEME: &str = "panel-primary";

/// The grid-level personalization record.
///
/// Stored under the master key. `filter_id`/`sort_id` reference detail
/// records by their derived keys; either may dangle-free be `None`.
/// Wire field names are the short forms the stored blobs use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasterConfig {
    #[serde(rename = "page", default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_theme")]
    pub theme: String,
    /// Ordered visible column keys. Empty means "all eligible columns
    /// visible" to the consuming layer; it is not an error.
    #[serde(rename = "keys", default)]
    pub visible_keys: Vec<String>,
    #[serde(rename = "filter", default)]
    pub filter_id: Option<String>,
    #[serde(rename = "sort", default)]
    pub sort_id: Option<String>,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_theme() -> String {
    DEFAULT_THEME.to_string()
}

impl Default for MasterConfig {
    fn default() -> Self {
        MasterConfig {
            page_size: DEFAULT_PAGE_SIZE,
            theme: DEFAULT_THEME.to_string(),
            visible_keys: Vec::new(),
            filter_id: None,
            sort_id: None,
        }
    }
}

impl MasterConfig {
    pub fn new(page_size: u32, theme: impl Into<String>) -> Self {
        MasterConfig {
            page_size,
            theme: theme.into(),
            ..MasterConfig::default()
        }
    }

    /// Check the visible keys against the widget's column set.
    pub fn validate(&self, columns: &[String]) -> Result<(), ConfigError> {
        for key in &self.visible_keys {
            if !columns.iter().any(|c| c == key) {
                return Err(ConfigError::UnknownVisibleKey(key.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> Vec<String> {
        vec!["id".into(), "name".into(), "total".into()]
    }

    #[test]
    fn defaults() {
        let config = MasterConfig::default();
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.theme, DEFAULT_THEME);
        assert!(config.visible_keys.is_empty());
        assert_eq!(config.filter_id, None);
        assert_eq!(config.sort_id, None);
    }

    #[test]
    fn empty_visible_keys_is_valid() {
        assert!(MasterConfig::default().validate(&columns()).is_ok());
    }

    #[test]
    fn known_visible_keys_are_valid() {
        let mut config = MasterConfig::new(20, "panel-info");
        config.visible_keys = vec!["id".into(), "total".into()];
        assert!(config.validate(&columns()).is_ok());
    }

    #[test]
    fn unknown_visible_key_rejected() {
        let mut config = MasterConfig::default();
        config.visible_keys = vec!["id".into(), "ghost".into()];
        let err = config.validate(&columns()).unwrap_err();
        assert_eq!(err, ConfigError::UnknownVisibleKey("ghost".into()));
    }

    #[test]
    fn wire_names() {
        let mut config = MasterConfig::new(20, "panel-info");
        config.visible_keys = vec!["id".into()];
        config.filter_id = Some("f1".into());

        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["page"], 20);
        assert_eq!(value["theme"], "panel-info");
        assert_eq!(value["keys"][0], "id");
        assert_eq!(value["filter"], "f1");
        assert_eq!(value["sort"], serde_json::Value::Null);
    }

    #[test]
    fn decode_fills_missing_fields_with_defaults() {
        let config: MasterConfig = serde_json::from_str(r#"{"theme":"panel-danger"}"#).unwrap();
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.theme, "panel-danger");
        assert!(config.visible_keys.is_empty());
    }
}
