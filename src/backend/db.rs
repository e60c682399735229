use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use log::{debug, warn};
use serde_json::Value;

use crate::codec::encode;
use crate::config::{Category, MasterConfig};
use crate::key::KeyScope;

use super::{BackendError, Field, StorageBackend, WriteRecord};

/// Column mapping for the master table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbSettings {
    pub table_name: String,
    pub id_attr: String,
    pub filter_attr: String,
    pub sort_attr: String,
    pub data_attr: String,
}

impl Default for DbSettings {
    fn default() -> Self {
        DbSettings {
            table_name: "tbl_dynagrid".to_string(),
            id_attr: "id".to_string(),
            filter_attr: "filter_id".to_string(),
            sort_attr: "sort_id".to_string(),
            data_attr: "data".to_string(),
        }
    }
}

/// Column mapping for the detail table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbDetailSettings {
    pub table_name: String,
    pub id_attr: String,
    pub category_attr: String,
    pub name_attr: String,
    pub data_attr: String,
    pub grid_id_attr: String,
}

impl Default for DbDetailSettings {
    fn default() -> Self {
        DbDetailSettings {
            table_name: "tbl_dynagrid_dtl".to_string(),
            id_attr: "id".to_string(),
            category_attr: "category".to_string(),
            name_attr: "name".to_string(),
            data_attr: "data".to_string(),
            grid_id_attr: "dynagrid_id".to_string(),
        }
    }
}

/// The relational collaborator: a minimal keyed-row surface the host
/// application implements over its database driver.
///
/// `insert` must report a primary-key violation as
/// [`BackendError::DuplicateKey`]; `update` on a missing row is a no-op, the
/// way an UPDATE affecting zero rows is.
pub trait ConfigDb: Send + Sync {
    fn exists(&self, table: &str, key_column: &str, key: &str) -> Result<bool, BackendError>;

    /// One column of the row with the given key; `None` when the row is
    /// missing or the column is NULL.
    fn select_value(
        &self,
        table: &str,
        key_column: &str,
        key: &str,
        column: &str,
    ) -> Result<Option<String>, BackendError>;

    fn insert(
        &self,
        table: &str,
        key_column: &str,
        key: &str,
        values: &[(&str, Option<&str>)],
    ) -> Result<(), BackendError>;

    fn update(
        &self,
        table: &str,
        key_column: &str,
        key: &str,
        values: &[(&str, Option<&str>)],
    ) -> Result<(), BackendError>;

    fn delete(&self, table: &str, key_column: &str, key: &str) -> Result<(), BackendError>;

    /// Project `(key_column, value_column)` from rows matching every
    /// criteria pair.
    fn select_pairs(
        &self,
        table: &str,
        criteria: &[(&str, &str)],
        key_column: &str,
        value_column: &str,
    ) -> Result<Vec<(String, String)>, BackendError>;
}

type Row = HashMap<String, Option<String>>;

/// In-memory table store for tests and development. Clone shares storage.
///
/// Enforces primary-key uniqueness so the duplicate-insert recovery path is
/// exercised the same way a real database exercises it.
#[derive(Clone, Default)]
pub struct InMemoryConfigDb {
    tables: Arc<RwLock<HashMap<String, HashMap<String, Row>>>>,
}

impl InMemoryConfigDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently in a table.
    pub fn row_count(&self, table: &str) -> usize {
        self.tables
            .read()
            .map(|tables| tables.get(table).map_or(0, HashMap::len))
            .unwrap_or(0)
    }
}

impl ConfigDb for InMemoryConfigDb {
    fn exists(&self, table: &str, _key_column: &str, key: &str) -> Result<bool, BackendError> {
        let tables = self
            .tables
            .read()
            .map_err(|_| BackendError::LockPoisoned("db read"))?;
        Ok(tables.get(table).is_some_and(|rows| rows.contains_key(key)))
    }

    fn select_value(
        &self,
        table: &str,
        _key_column: &str,
        key: &str,
        column: &str,
    ) -> Result<Option<String>, BackendError> {
        let tables = self
            .tables
            .read()
            .map_err(|_| BackendError::LockPoisoned("db read"))?;
        Ok(tables
            .get(table)
            .and_then(|rows| rows.get(key))
            .and_then(|row| row.get(column).cloned())
            .flatten())
    }

    fn insert(
        &self,
        table: &str,
        key_column: &str,
        key: &str,
        values: &[(&str, Option<&str>)],
    ) -> Result<(), BackendError> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| BackendError::LockPoisoned("db write"))?;
        let rows = tables.entry(table.to_string()).or_default();
        if rows.contains_key(key) {
            return Err(BackendError::DuplicateKey {
                table: table.to_string(),
                id: key.to_string(),
            });
        }
        let mut row = Row::new();
        row.insert(key_column.to_string(), Some(key.to_string()));
        for (column, value) in values {
            row.insert(column.to_string(), value.map(str::to_string));
        }
        rows.insert(key.to_string(), row);
        Ok(())
    }

    fn update(
        &self,
        table: &str,
        _key_column: &str,
        key: &str,
        values: &[(&str, Option<&str>)],
    ) -> Result<(), BackendError> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| BackendError::LockPoisoned("db write"))?;
        if let Some(row) = tables.get_mut(table).and_then(|rows| rows.get_mut(key)) {
            for (column, value) in values {
                row.insert(column.to_string(), value.map(str::to_string));
            }
        }
        Ok(())
    }

    fn delete(&self, table: &str, _key_column: &str, key: &str) -> Result<(), BackendError> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| BackendError::LockPoisoned("db write"))?;
        if let Some(rows) = tables.get_mut(table) {
            rows.remove(key);
        }
        Ok(())
    }

    fn select_pairs(
        &self,
        table: &str,
        criteria: &[(&str, &str)],
        key_column: &str,
        value_column: &str,
    ) -> Result<Vec<(String, String)>, BackendError> {
        let tables = self
            .tables
            .read()
            .map_err(|_| BackendError::LockPoisoned("db read"))?;
        let mut pairs = Vec::new();
        if let Some(rows) = tables.get(table) {
            for row in rows.values() {
                let matches = criteria.iter().all(|(column, expected)| {
                    row.get(*column)
                        .and_then(Option::as_deref)
                        .is_some_and(|value| value == *expected)
                });
                if !matches {
                    continue;
                }
                let key = row.get(key_column).and_then(Option::as_deref);
                let value = row.get(value_column).and_then(Option::as_deref);
                if let (Some(key), Some(value)) = (key, value) {
                    pairs.push((key.to_string(), value.to_string()));
                }
            }
        }
        Ok(pairs)
    }
}

/// Relational persistence: one master row plus one detail row per preset.
///
/// Writes are upserts. The existence check and the insert are two separate
/// statements, so a concurrent first save can make both requests observe
/// "absent"; the losing insert's duplicate-key violation is converted to an
/// update instead of surfacing.
pub struct DbBackend {
    db: Arc<dyn ConfigDb>,
    master: DbSettings,
    detail: DbDetailSettings,
}

impl std::fmt::Debug for DbBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbBackend")
            .field("master", &self.master)
            .field("detail", &self.detail)
            .finish_non_exhaustive()
    }
}

impl DbBackend {
    pub fn new(db: Arc<dyn ConfigDb>, master: DbSettings, detail: DbDetailSettings) -> Self {
        DbBackend { db, master, detail }
    }

    /// The master payload column holds the config minus the filter/sort
    /// references, which live in their own columns.
    fn master_data(config: &MasterConfig) -> Result<String, BackendError> {
        let mut value = serde_json::to_value(config)
            .map_err(|e| BackendError::Serde(e.to_string()))?;
        if let Value::Object(map) = &mut value {
            map.remove(Category::Filter.as_str());
            map.remove(Category::Sort.as_str());
        }
        Ok(encode(&value)?)
    }

    fn write_master(&self, scope: &KeyScope, config: &MasterConfig) -> Result<(), BackendError> {
        let data = Self::master_data(config)?;
        let values: Vec<(&str, Option<&str>)> = vec![
            (self.master.filter_attr.as_str(), config.filter_id.as_deref()),
            (self.master.sort_attr.as_str(), config.sort_id.as_deref()),
            (self.master.data_attr.as_str(), Some(data.as_str())),
        ];
        let table = self.master.table_name.as_str();
        let id_attr = self.master.id_attr.as_str();
        let key = scope.master_key.as_str();

        if self.db.exists(table, id_attr, key)? {
            return self.db.update(table, id_attr, key, &values);
        }
        match self.db.insert(table, id_attr, key, &values) {
            Err(BackendError::DuplicateKey { .. }) => {
                // lost a concurrent first-save race; the row is there now
                warn!("concurrent insert for master {}, retrying as update", key);
                self.db.update(table, id_attr, key, &values)
            }
            result => result,
        }
    }

    fn write_detail(
        &self,
        scope: &KeyScope,
        name: &str,
        encoded: &str,
        update_name_only: bool,
    ) -> Result<(), BackendError> {
        let table = self.detail.table_name.as_str();
        let id_attr = self.detail.id_attr.as_str();
        let key = scope.record_key();

        let update_values: Vec<(&str, Option<&str>)> = if update_name_only {
            vec![(self.detail.name_attr.as_str(), Some(name))]
        } else {
            vec![
                (self.detail.name_attr.as_str(), Some(name)),
                (self.detail.data_attr.as_str(), Some(encoded)),
            ]
        };

        if self.db.exists(table, id_attr, key)? {
            return self.db.update(table, id_attr, key, &update_values);
        }

        let category = scope.category.as_str();
        let insert_values: Vec<(&str, Option<&str>)> = vec![
            (self.detail.category_attr.as_str(), Some(category)),
            (self.detail.name_attr.as_str(), Some(name)),
            (self.detail.data_attr.as_str(), Some(encoded)),
            (self.detail.grid_id_attr.as_str(), Some(scope.master_key.as_str())),
        ];
        match self.db.insert(table, id_attr, key, &insert_values) {
            Err(BackendError::DuplicateKey { .. }) => {
                warn!("concurrent insert for detail {}, retrying as update", key);
                self.db.update(table, id_attr, key, &update_values)
            }
            result => result,
        }
    }
}

impl StorageBackend for DbBackend {
    fn read(&self, scope: &KeyScope, field: Field) -> Result<Option<String>, BackendError> {
        if scope.category.is_master() {
            let table = self.master.table_name.as_str();
            let id_attr = self.master.id_attr.as_str();
            let key = scope.master_key.as_str();
            let column = match field {
                Field::Data => self.master.data_attr.as_str(),
                Field::FilterRef => self.master.filter_attr.as_str(),
                Field::SortRef => self.master.sort_attr.as_str(),
                Field::Id => {
                    return Ok(self
                        .db
                        .exists(table, id_attr, key)?
                        .then(|| key.to_string()));
                }
            };
            self.db.select_value(table, id_attr, key, column)
        } else {
            let table = self.detail.table_name.as_str();
            let id_attr = self.detail.id_attr.as_str();
            let key = scope.record_key();
            match field {
                Field::Data => {
                    self.db
                        .select_value(table, id_attr, key, self.detail.data_attr.as_str())
                }
                Field::Id => Ok(self
                    .db
                    .exists(table, id_attr, key)?
                    .then(|| key.to_string())),
                Field::FilterRef | Field::SortRef => Ok(None),
            }
        }
    }

    fn write(&self, scope: &KeyScope, record: WriteRecord<'_>) -> Result<(), BackendError> {
        debug!("db write for {} ({})", scope.record_key(), scope.category);
        match record {
            WriteRecord::Master(config) => self.write_master(scope, config),
            WriteRecord::Detail {
                name,
                data,
                update_name_only,
            } => {
                let encoded = encode(data)?;
                self.write_detail(scope, name, &encoded, update_name_only)
            }
        }
    }

    fn delete(&self, scope: &KeyScope) -> Result<(), BackendError> {
        debug!("db delete for {} ({})", scope.record_key(), scope.category);
        if scope.category.is_master() {
            self.db.delete(
                &self.master.table_name,
                &self.master.id_attr,
                &scope.master_key,
            )
        } else {
            self.db
                .delete(&self.detail.table_name, &self.detail.id_attr, scope.record_key())
        }
    }

    fn clear_reference(&self, scope: &KeyScope, category: Category) -> Result<(), BackendError> {
        let column = match category {
            Category::Filter => self.master.filter_attr.as_str(),
            _ => self.master.sort_attr.as_str(),
        };
        self.db.update(
            &self.master.table_name,
            &self.master.id_attr,
            &scope.master_key,
            &[(column, None)],
        )
    }

    fn list_details(
        &self,
        scope: &KeyScope,
        category: Category,
    ) -> Result<BTreeMap<String, String>, BackendError> {
        let criteria: Vec<(&str, &str)> = vec![
            (self.detail.grid_id_attr.as_str(), scope.master_key.as_str()),
            (self.detail.category_attr.as_str(), category.as_str()),
        ];
        let pairs = self.db.select_pairs(
            &self.detail.table_name,
            &criteria,
            &self.detail.id_attr,
            &self.detail.name_attr,
        )?;
        Ok(pairs.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigMap, GridIdentity};

    fn backend() -> (DbBackend, Arc<InMemoryConfigDb>) {
        let db = Arc::new(InMemoryConfigDb::new());
        (
            DbBackend::new(db.clone(), DbSettings::default(), DbDetailSettings::default()),
            db,
        )
    }

    fn master_scope() -> KeyScope {
        KeyScope::derive(&GridIdentity::shared("g1"), Category::Grid, None, None)
    }

    fn filter_scope(name: &str) -> KeyScope {
        KeyScope::derive(&GridIdentity::shared("g1"), Category::Filter, Some(name), None)
    }

    fn payload(key: &str, value: &str) -> ConfigMap {
        let mut map = ConfigMap::new();
        map.insert(key.into(), serde_json::Value::String(value.into()));
        map
    }

    #[test]
    fn master_splits_references_into_columns() {
        let (backend, db) = backend();
        let mut config = MasterConfig::new(20, "panel-info");
        config.filter_id = Some("f1".into());
        backend
            .write(&master_scope(), WriteRecord::Master(&config))
            .unwrap();

        assert_eq!(
            backend.read(&master_scope(), Field::FilterRef).unwrap(),
            Some("f1".to_string())
        );
        assert_eq!(backend.read(&master_scope(), Field::SortRef).unwrap(), None);

        // the payload column carries no reference keys
        let data = backend.read(&master_scope(), Field::Data).unwrap().unwrap();
        let map = crate::codec::decode(&data);
        assert!(map.get("filter").is_none());
        assert!(map.get("sort").is_none());
        assert_eq!(map["page"], 20);
        assert_eq!(db.row_count("tbl_dynagrid"), 1);
    }

    #[test]
    fn upsert_converges_to_one_row() {
        let (backend, db) = backend();
        let scope = filter_scope("Big Orders");
        let first = payload("total", ">100");
        let second = payload("total", ">500");

        backend
            .write(
                &scope,
                WriteRecord::Detail {
                    name: "Big Orders",
                    data: &first,
                    update_name_only: false,
                },
            )
            .unwrap();
        backend
            .write(
                &scope,
                WriteRecord::Detail {
                    name: "Big Orders v2",
                    data: &second,
                    update_name_only: false,
                },
            )
            .unwrap();

        assert_eq!(db.row_count("tbl_dynagrid_dtl"), 1);
        let data = backend.read(&scope, Field::Data).unwrap().unwrap();
        assert_eq!(crate::codec::decode(&data), second);

        let listing = backend.list_details(&master_scope(), Category::Filter).unwrap();
        assert_eq!(listing.values().collect::<Vec<_>>(), ["Big Orders v2"]);
    }

    #[test]
    fn update_name_only_keeps_stored_payload() {
        let (backend, _) = backend();
        let scope = filter_scope("Big Orders");
        let first = payload("total", ">100");
        let second = payload("total", ">500");

        backend
            .write(
                &scope,
                WriteRecord::Detail {
                    name: "Big Orders",
                    data: &first,
                    update_name_only: true,
                },
            )
            .unwrap();
        backend
            .write(
                &scope,
                WriteRecord::Detail {
                    name: "Renamed",
                    data: &second,
                    update_name_only: true,
                },
            )
            .unwrap();

        let data = backend.read(&scope, Field::Data).unwrap().unwrap();
        assert_eq!(crate::codec::decode(&data), first);
        let listing = backend.list_details(&master_scope(), Category::Filter).unwrap();
        assert_eq!(listing.values().collect::<Vec<_>>(), ["Renamed"]);
    }

    #[test]
    fn duplicate_insert_recovers_as_update() {
        let (backend, db) = backend();
        let scope = filter_scope("Big Orders");
        // a concurrent request inserted the row between our existence check
        // and our insert
        db.insert(
            "tbl_dynagrid_dtl",
            "id",
            scope.record_key(),
            &[
                ("category", Some("filter")),
                ("name", Some("Big Orders")),
                ("data", Some("{}")),
                ("dynagrid_id", Some("g1")),
            ],
        )
        .unwrap();

        let err = db
            .insert("tbl_dynagrid_dtl", "id", scope.record_key(), &[])
            .unwrap_err();
        assert!(matches!(err, BackendError::DuplicateKey { .. }));

        let data = payload("total", ">100");
        backend
            .write(
                &scope,
                WriteRecord::Detail {
                    name: "Big Orders",
                    data: &data,
                    update_name_only: false,
                },
            )
            .unwrap();
        assert_eq!(db.row_count("tbl_dynagrid_dtl"), 1);
    }

    #[test]
    fn clear_reference_nulls_the_column_directly() {
        let (backend, _) = backend();
        let mut config = MasterConfig::default();
        config.filter_id = Some("f1".into());
        config.sort_id = Some("s1".into());
        backend
            .write(&master_scope(), WriteRecord::Master(&config))
            .unwrap();

        backend
            .clear_reference(&master_scope(), Category::Filter)
            .unwrap();
        assert_eq!(backend.read(&master_scope(), Field::FilterRef).unwrap(), None);
        assert_eq!(
            backend.read(&master_scope(), Field::SortRef).unwrap(),
            Some("s1".to_string())
        );
    }

    #[test]
    fn clear_reference_on_missing_master_is_a_noop() {
        let (backend, _) = backend();
        assert!(backend
            .clear_reference(&master_scope(), Category::Sort)
            .is_ok());
    }

    #[test]
    fn delete_detail_leaves_master_row() {
        let (backend, db) = backend();
        backend
            .write(&master_scope(), WriteRecord::Master(&MasterConfig::default()))
            .unwrap();
        let scope = filter_scope("Big Orders");
        let data = payload("total", ">100");
        backend
            .write(
                &scope,
                WriteRecord::Detail {
                    name: "Big Orders",
                    data: &data,
                    update_name_only: false,
                },
            )
            .unwrap();

        backend.delete(&scope).unwrap();
        assert_eq!(db.row_count("tbl_dynagrid_dtl"), 0);
        assert_eq!(db.row_count("tbl_dynagrid"), 1);
    }
}
