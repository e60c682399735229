use std::sync::Arc;

use gridprefs::{
    Category, ConfigMap, ConfigStore, CookieSettings, GridIdentity, InMemoryConfigDb,
    InMemoryCookieJar, InMemorySessionStore, MasterConfig, StorageContext, StorageType,
    StoreSettings,
};
use serde_json::{json, Value};

fn full_context() -> StorageContext {
    StorageContext::new("gridprefs", "integration-salt")
        .with_session(Arc::new(InMemorySessionStore::new()))
        .with_cookies(Arc::new(InMemoryCookieJar::new()), CookieSettings::default())
        .with_db(Arc::new(InMemoryConfigDb::new()))
}

fn all_storages() -> [StorageType; 3] {
    [StorageType::Session, StorageType::Cookie, StorageType::Db]
}

fn payload(value: Value) -> ConfigMap {
    match value {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

fn master_store(context: &StorageContext, storage: StorageType) -> ConfigStore {
    ConfigStore::new(
        StoreSettings::master(GridIdentity::shared("orders-grid"), storage),
        context,
    )
    .unwrap()
}

fn filter_store(context: &StorageContext, storage: StorageType, name: &str) -> ConfigStore {
    ConfigStore::new(
        StoreSettings::detail(
            GridIdentity::shared("orders-grid"),
            storage,
            Category::Filter,
            name,
        ),
        context,
    )
    .unwrap()
}

// The end-to-end scenario: personalize a grid in session storage, save a
// named filter, list it, delete it.
#[test]
fn personalization_scenario_in_session_storage() {
    let context = full_context();
    let master = master_store(&context, StorageType::Session);

    let mut config = MasterConfig::new(20, "panel-primary");
    config.visible_keys = vec!["id".into(), "total".into()];
    master.save_master(&config).unwrap();
    assert_eq!(master.fetch_master().unwrap(), Some(config));

    let filter = filter_store(&context, StorageType::Session, "Big Orders");
    filter.save_detail(&payload(json!({"total": ">100"}))).unwrap();

    let listing = master.detail_list(Category::Filter).unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[filter.record_key()], "Big Orders");

    filter.delete().unwrap();
    assert!(master.detail_list(Category::Filter).unwrap().is_empty());
    assert_eq!(filter.fetch_detail().unwrap(), None);
}

#[test]
fn master_save_fetch_is_idempotent_on_every_backend() {
    for storage in all_storages() {
        let context = full_context();
        let store = master_store(&context, storage);

        let mut config = MasterConfig::new(50, "panel-info");
        config.visible_keys = vec!["id".into(), "name".into(), "total".into()];
        config.filter_id = Some("orders-grid_filter_0a1b2c3d".into());

        store.save_master(&config).unwrap();
        store.save_master(&config).unwrap();
        assert_eq!(
            store.fetch_master().unwrap(),
            Some(config),
            "storage {}",
            storage
        );
    }
}

#[test]
fn detail_save_fetch_is_idempotent_on_every_backend() {
    for storage in all_storages() {
        let context = full_context();
        let store = filter_store(&context, storage, "Big Orders");
        let data = payload(json!({"total": ">100", "status": "open"}));

        store.save_detail(&data).unwrap();
        store.save_detail(&data).unwrap();
        assert_eq!(store.fetch_detail().unwrap(), Some(data), "storage {}", storage);
    }
}

#[test]
fn resaving_a_preset_replaces_its_payload() {
    for storage in all_storages() {
        let context = full_context();
        let store = filter_store(&context, storage, "Big Orders");

        store.save_detail(&payload(json!({"total": ">100"}))).unwrap();
        store.save_detail(&payload(json!({"total": ">500"}))).unwrap();

        assert_eq!(
            store.fetch_detail().unwrap(),
            Some(payload(json!({"total": ">500"}))),
            "storage {}",
            storage
        );
        let listing = store.detail_list(Category::Filter).unwrap();
        assert_eq!(listing.len(), 1, "storage {}", storage);
    }
}

#[test]
fn deleting_the_master_keeps_details_on_every_backend() {
    for storage in all_storages() {
        let context = full_context();
        let master = master_store(&context, storage);
        let filter = filter_store(&context, storage, "Big Orders");

        master.save_master(&MasterConfig::default()).unwrap();
        filter.save_detail(&payload(json!({"total": ">100"}))).unwrap();

        master.delete().unwrap();

        assert_eq!(master.fetch_master().unwrap(), None, "storage {}", storage);
        assert_eq!(
            master.detail_list(Category::Filter).unwrap().len(),
            1,
            "storage {}",
            storage
        );
    }
}

#[test]
fn filter_and_sort_presets_do_not_collide() {
    for storage in all_storages() {
        let context = full_context();
        let identity = GridIdentity::shared("orders-grid");
        let filter = ConfigStore::new(
            StoreSettings::detail(identity.clone(), storage, Category::Filter, "Recent"),
            &context,
        )
        .unwrap();
        let sort = ConfigStore::new(
            StoreSettings::detail(identity, storage, Category::Sort, "Recent"),
            &context,
        )
        .unwrap();

        filter.save_detail(&payload(json!({"created": "today"}))).unwrap();
        sort.save_detail(&payload(json!({"created": "desc"}))).unwrap();

        assert_eq!(
            filter.fetch_detail().unwrap(),
            Some(payload(json!({"created": "today"}))),
            "storage {}",
            storage
        );
        assert_eq!(
            sort.fetch_detail().unwrap(),
            Some(payload(json!({"created": "desc"}))),
            "storage {}",
            storage
        );
        assert_eq!(filter.detail_list(Category::Filter).unwrap().len(), 1);
        assert_eq!(filter.detail_list(Category::Sort).unwrap().len(), 1);
    }
}

#[test]
fn user_specific_state_is_isolated_per_user() {
    for storage in all_storages() {
        let context = full_context();
        let alice = ConfigStore::new(
            StoreSettings::master(GridIdentity::for_user("orders-grid", "alice"), storage),
            &context,
        )
        .unwrap();
        let bob = ConfigStore::new(
            StoreSettings::master(GridIdentity::for_user("orders-grid", "bob"), storage),
            &context,
        )
        .unwrap();

        alice.save_master(&MasterConfig::new(20, "panel-info")).unwrap();

        assert_eq!(bob.fetch_master().unwrap(), None, "storage {}", storage);
        bob.save_master(&MasterConfig::new(100, "panel-dark")).unwrap();
        assert_eq!(
            alice.fetch_master().unwrap().unwrap().page_size,
            20,
            "storage {}",
            storage
        );
    }
}

#[test]
fn db_master_fetch_merges_reference_columns() {
    let context = full_context();
    let master = master_store(&context, StorageType::Db);

    let mut config = MasterConfig::new(20, "panel-primary");
    config.filter_id = Some("orders-grid_filter_0a1b2c3d".into());
    config.sort_id = Some("orders-grid_sort_4e5f6071".into());
    master.save_master(&config).unwrap();

    // the payload column itself carries no reference keys, but the fetch
    // reassembles them from the dedicated columns
    let raw = master.fetch_field(gridprefs::Field::Data).unwrap().unwrap();
    let stored = gridprefs::decode(&raw);
    assert!(stored.get("filter").is_none());
    assert!(stored.get("sort").is_none());
    assert_eq!(master.fetch_master().unwrap(), Some(config));
}

#[test]
fn corrupt_blob_resets_personalization_to_defaults() {
    let session = Arc::new(InMemorySessionStore::new());
    let context = StorageContext::new("gridprefs", "integration-salt")
        .with_session(session.clone());
    let master = master_store(&context, StorageType::Session);

    master.save_master(&MasterConfig::new(20, "panel-info")).unwrap();

    use gridprefs::SessionStore;
    session.set("orders-grid", "{\"grid\": 17".to_string()).unwrap();

    assert_eq!(master.fetch_master().unwrap(), None);

    // a fresh save works again after the reset
    master.save_master(&MasterConfig::new(30, "panel-dark")).unwrap();
    assert_eq!(master.fetch_master().unwrap().unwrap().page_size, 30);
}

#[test]
fn clear_reference_scrubs_only_the_named_category() {
    for storage in all_storages() {
        let context = full_context();
        let master = master_store(&context, storage);

        let mut config = MasterConfig::default();
        config.filter_id = Some("f-key".into());
        config.sort_id = Some("s-key".into());
        master.save_master(&config).unwrap();

        master.clear_reference(Category::Filter).unwrap();

        let fetched = master.fetch_master().unwrap().unwrap();
        assert_eq!(fetched.filter_id, None, "storage {}", storage);
        assert_eq!(fetched.sort_id.as_deref(), Some("s-key"), "storage {}", storage);
    }
}
