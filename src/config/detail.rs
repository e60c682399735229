use serde::{Deserialize, Serialize};

use super::{Category, ConfigError, ConfigMap};

/// A named, reusable filter or sort preset.
///
/// Stored separately from the master record under its own derived key and
/// referenced from the master by id. `data` is opaque to the storage layer:
/// attribute filters for `Category::Filter`, attribute → direction pairs
/// (`"asc"`/`"desc"`) for `Category::Sort`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailRecord {
    pub name: String,
    pub category: Category,
    #[serde(default)]
    pub data: ConfigMap,
    /// Back-reference to the owning grid's master key.
    #[serde(rename = "dynagrid_id")]
    pub grid_id: String,
}

impl DetailRecord {
    pub fn new(
        name: impl Into<String>,
        category: Category,
        data: ConfigMap,
        grid_id: impl Into<String>,
    ) -> Self {
        DetailRecord {
            name: name.into(),
            category,
            data,
            grid_id: grid_id.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.category.is_master() {
            return Err(ConfigError::CategoryMismatch {
                expected: "detail",
                actual: self.category,
            });
        }
        if self.name.trim().is_empty() {
            return Err(ConfigError::MissingName(self.category));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload() -> ConfigMap {
        match json!({"total": ">100"}) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn valid_detail() {
        let record = DetailRecord::new("Big Orders", Category::Filter, payload(), "orders-grid");
        assert!(record.validate().is_ok());
    }

    #[test]
    fn master_category_rejected() {
        let record = DetailRecord::new("Big Orders", Category::Grid, payload(), "orders-grid");
        assert!(matches!(
            record.validate().unwrap_err(),
            ConfigError::CategoryMismatch { .. }
        ));
    }

    #[test]
    fn blank_name_rejected() {
        let record = DetailRecord::new("   ", Category::Sort, ConfigMap::new(), "orders-grid");
        assert_eq!(
            record.validate().unwrap_err(),
            ConfigError::MissingName(Category::Sort)
        );
    }
}
