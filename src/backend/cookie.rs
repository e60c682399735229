use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use log::{debug, warn};

use crate::codec::Envelope;
use crate::config::Category;
use crate::key::KeyScope;

use super::{blob, BackendError, Field, StorageBackend, WriteRecord};

/// Cookie attributes applied on every write, supplied by the embedding
/// application and passed through verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieSettings {
    pub http_only: bool,
    pub max_age_secs: u64,
}

impl Default for CookieSettings {
    fn default() -> Self {
        CookieSettings {
            http_only: true,
            // 100 days
            max_age_secs: 8_640_000,
        }
    }
}

/// The request/response cookie collaborator.
///
/// Cookies are immutable once sent, so every mutation issues a fresh cookie:
/// real implementations read the incoming request's jar in [`CookieJar::get`]
/// and queue a `Set-Cookie` header in [`CookieJar::set`].
pub trait CookieJar: Send + Sync {
    fn get(&self, name: &str) -> Result<Option<String>, BackendError>;
    fn set(&self, name: &str, value: String, settings: &CookieSettings)
        -> Result<(), BackendError>;
}

/// In-memory jar that applies writes immediately, the way a client applies a
/// `Set-Cookie` before its next request. Clone shares storage.
#[derive(Clone, Default)]
pub struct InMemoryCookieJar {
    cookies: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryCookieJar {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CookieJar for InMemoryCookieJar {
    fn get(&self, name: &str) -> Result<Option<String>, BackendError> {
        let cookies = self
            .cookies
            .read()
            .map_err(|_| BackendError::LockPoisoned("cookie read"))?;
        Ok(cookies.get(name).cloned())
    }

    fn set(
        &self,
        name: &str,
        value: String,
        _settings: &CookieSettings,
    ) -> Result<(), BackendError> {
        let mut cookies = self
            .cookies
            .write()
            .map_err(|_| BackendError::LockPoisoned("cookie write"))?;
        cookies.insert(name.to_string(), value);
        Ok(())
    }
}

/// Cookie persistence: the same blob envelope as the session backend, base64
/// encoded for cookie transport, re-issued with the configured settings on
/// every write.
pub struct CookieBackend {
    jar: Arc<dyn CookieJar>,
    settings: CookieSettings,
}

impl std::fmt::Debug for CookieBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieBackend")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl CookieBackend {
    pub fn new(jar: Arc<dyn CookieJar>, settings: CookieSettings) -> Self {
        CookieBackend { jar, settings }
    }

    fn load(&self, master_key: &str) -> Result<Envelope, BackendError> {
        let Some(value) = self.jar.get(master_key)? else {
            return Ok(Envelope::default());
        };
        let raw = match URL_SAFE_NO_PAD.decode(&value) {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(raw) => raw,
                Err(_) => {
                    warn!("cookie {} holds non-utf8 data, resetting", master_key);
                    return Ok(Envelope::default());
                }
            },
            Err(_) => {
                warn!("cookie {} is not valid base64, resetting", master_key);
                return Ok(Envelope::default());
            }
        };
        Ok(Envelope::from_raw(&raw))
    }

    fn persist(&self, master_key: &str, envelope: &Envelope) -> Result<(), BackendError> {
        let encoded = URL_SAFE_NO_PAD.encode(envelope.encode()?);
        self.jar.set(master_key, encoded, &self.settings)
    }
}

impl StorageBackend for CookieBackend {
    fn read(&self, scope: &KeyScope, field: Field) -> Result<Option<String>, BackendError> {
        let envelope = self.load(&scope.master_key)?;
        Ok(blob::read_field(&envelope, scope, field))
    }

    fn write(&self, scope: &KeyScope, record: WriteRecord<'_>) -> Result<(), BackendError> {
        let mut envelope = self.load(&scope.master_key)?;
        blob::apply_write(&mut envelope, scope, record)?;
        debug!("cookie write for {} ({})", scope.record_key(), scope.category);
        self.persist(&scope.master_key, &envelope)
    }

    fn delete(&self, scope: &KeyScope) -> Result<(), BackendError> {
        let mut envelope = self.load(&scope.master_key)?;
        if blob::apply_delete(&mut envelope, scope) {
            debug!("cookie delete for {} ({})", scope.record_key(), scope.category);
            self.persist(&scope.master_key, &envelope)?;
        }
        Ok(())
    }

    fn clear_reference(&self, scope: &KeyScope, category: Category) -> Result<(), BackendError> {
        let mut envelope = self.load(&scope.master_key)?;
        if blob::apply_clear_reference(&mut envelope, category)? {
            self.persist(&scope.master_key, &envelope)?;
        }
        Ok(())
    }

    fn list_details(
        &self,
        scope: &KeyScope,
        category: Category,
    ) -> Result<BTreeMap<String, String>, BackendError> {
        Ok(self.load(&scope.master_key)?.details(category))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigMap, GridIdentity, MasterConfig};

    fn backend() -> (CookieBackend, Arc<InMemoryCookieJar>) {
        let jar = Arc::new(InMemoryCookieJar::new());
        (CookieBackend::new(jar.clone(), CookieSettings::default()), jar)
    }

    fn master_scope() -> KeyScope {
        KeyScope::derive(&GridIdentity::shared("g1"), Category::Grid, None, None)
    }

    fn sort_scope(name: &str) -> KeyScope {
        KeyScope::derive(&GridIdentity::shared("g1"), Category::Sort, Some(name), None)
    }

    #[test]
    fn stored_value_is_transport_safe() {
        let (backend, jar) = backend();
        backend
            .write(&master_scope(), WriteRecord::Master(&MasterConfig::default()))
            .unwrap();

        let value = jar.get("g1").unwrap().unwrap();
        assert!(!value.contains(['"', ';', ',', ' ', '=']));
        assert!(backend.read(&master_scope(), Field::Data).unwrap().is_some());
    }

    #[test]
    fn malformed_cookie_resets_to_defaults() {
        let (backend, jar) = backend();
        jar.set("g1", "!!not base64!!".into(), &CookieSettings::default())
            .unwrap();
        assert_eq!(backend.read(&master_scope(), Field::Data).unwrap(), None);
    }

    #[test]
    fn detail_round_trip() {
        let (backend, _) = backend();
        let mut data = ConfigMap::new();
        data.insert("created".into(), serde_json::Value::String("desc".into()));

        backend
            .write(
                &sort_scope("Newest"),
                WriteRecord::Detail {
                    name: "Newest",
                    data: &data,
                    update_name_only: false,
                },
            )
            .unwrap();

        let raw = backend.read(&sort_scope("Newest"), Field::Data).unwrap().unwrap();
        assert_eq!(crate::codec::decode(&raw), data);

        let listing = backend.list_details(&master_scope(), Category::Sort).unwrap();
        assert_eq!(listing.values().collect::<Vec<_>>(), ["Newest"]);

        backend.delete(&sort_scope("Newest")).unwrap();
        assert_eq!(backend.read(&sort_scope("Newest"), Field::Data).unwrap(), None);
    }
}
