use std::sync::Arc;

use crate::backend::{
    ConfigDb, CookieBackend, CookieJar, CookieSettings, DbBackend, DbDetailSettings, DbSettings,
    SessionBackend, SessionStore, StorageBackend,
};
use crate::config::{ConfigError, MasterConfig, StorageType, DEFAULT_PAGE_SIZE, DEFAULT_THEME};

/// The injected collaborator bundle: session store, cookie jar, database
/// handle, their settings, and module-level defaults.
///
/// Everything the storage layer needs travels in here — nothing reaches
/// into ambient application state. Backends for unwired storage types fail
/// at store construction with a configuration error.
pub struct StorageContext {
    module_id: String,
    salt: String,
    session: Option<Arc<dyn SessionStore>>,
    cookies: Option<Arc<dyn CookieJar>>,
    cookie_settings: CookieSettings,
    db: Option<Arc<dyn ConfigDb>>,
    db_settings: DbSettings,
    db_detail_settings: DbDetailSettings,
    default_page_size: u32,
    default_theme: String,
}

impl StorageContext {
    /// A context with no collaborators wired. `module_id` scopes signatures
    /// across module instances; `salt` feeds signature generation.
    pub fn new(module_id: impl Into<String>, salt: impl Into<String>) -> Self {
        StorageContext {
            module_id: module_id.into(),
            salt: salt.into(),
            session: None,
            cookies: None,
            cookie_settings: CookieSettings::default(),
            db: None,
            db_settings: DbSettings::default(),
            db_detail_settings: DbDetailSettings::default(),
            default_page_size: DEFAULT_PAGE_SIZE,
            default_theme: DEFAULT_THEME.to_string(),
        }
    }

    pub fn with_session(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.session = Some(store);
        self
    }

    pub fn with_cookies(mut self, jar: Arc<dyn CookieJar>, settings: CookieSettings) -> Self {
        self.cookies = Some(jar);
        self.cookie_settings = settings;
        self
    }

    pub fn with_db(mut self, db: Arc<dyn ConfigDb>) -> Self {
        self.db = Some(db);
        self
    }

    pub fn with_db_settings(mut self, master: DbSettings, detail: DbDetailSettings) -> Self {
        self.db_settings = master;
        self.db_detail_settings = detail;
        self
    }

    pub fn with_defaults(mut self, page_size: u32, theme: impl Into<String>) -> Self {
        self.default_page_size = page_size;
        self.default_theme = theme.into();
        self
    }

    pub fn module_id(&self) -> &str {
        &self.module_id
    }

    pub fn salt(&self) -> &str {
        &self.salt
    }

    /// The master config a grid starts from before any personalization.
    pub fn default_master(&self) -> MasterConfig {
        MasterConfig::new(self.default_page_size, self.default_theme.clone())
    }

    /// Build the backend for the selected storage type.
    pub fn backend(&self, storage: StorageType) -> Result<Arc<dyn StorageBackend>, ConfigError> {
        match storage {
            StorageType::Session => {
                let store = self
                    .session
                    .clone()
                    .ok_or(ConfigError::StorageNotConfigured("session"))?;
                Ok(Arc::new(SessionBackend::new(store)))
            }
            StorageType::Cookie => {
                let jar = self
                    .cookies
                    .clone()
                    .ok_or(ConfigError::StorageNotConfigured("cookie"))?;
                Ok(Arc::new(CookieBackend::new(jar, self.cookie_settings.clone())))
            }
            StorageType::Db => {
                let db = self
                    .db
                    .clone()
                    .ok_or(ConfigError::StorageNotConfigured("db"))?;
                Ok(Arc::new(DbBackend::new(
                    db,
                    self.db_settings.clone(),
                    self.db_detail_settings.clone(),
                )))
            }
        }
    }
}
