use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use log::debug;

use crate::codec::Envelope;
use crate::config::Category;
use crate::key::KeyScope;

use super::{blob, BackendError, Field, StorageBackend, WriteRecord};

/// The server-side session key-value store this backend writes through.
///
/// Implemented over the host framework's session primitive; the in-memory
/// implementation below serves tests and development.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, BackendError>;
    fn set(&self, key: &str, value: String) -> Result<(), BackendError>;
}

/// In-memory session store backed by a HashMap. Clone shares storage.
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| BackendError::LockPoisoned("session read"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<(), BackendError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| BackendError::LockPoisoned("session write"))?;
        entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// Session-variable persistence: the whole personalization state for one
/// master key lives in a single session value, merged on every write.
pub struct SessionBackend {
    store: Arc<dyn SessionStore>,
}

impl std::fmt::Debug for SessionBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionBackend").finish_non_exhaustive()
    }
}

impl SessionBackend {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        SessionBackend { store }
    }

    fn load(&self, master_key: &str) -> Result<Envelope, BackendError> {
        let raw = self.store.get(master_key)?.unwrap_or_default();
        Ok(Envelope::from_raw(&raw))
    }

    fn persist(&self, master_key: &str, envelope: &Envelope) -> Result<(), BackendError> {
        self.store.set(master_key, envelope.encode()?)
    }
}

impl StorageBackend for SessionBackend {
    fn read(&self, scope: &KeyScope, field: Field) -> Result<Option<String>, BackendError> {
        let envelope = self.load(&scope.master_key)?;
        Ok(blob::read_field(&envelope, scope, field))
    }

    fn write(&self, scope: &KeyScope, record: WriteRecord<'_>) -> Result<(), BackendError> {
        let mut envelope = self.load(&scope.master_key)?;
        blob::apply_write(&mut envelope, scope, record)?;
        debug!("session write for {} ({})", scope.record_key(), scope.category);
        self.persist(&scope.master_key, &envelope)
    }

    fn delete(&self, scope: &KeyScope) -> Result<(), BackendError> {
        let mut envelope = self.load(&scope.master_key)?;
        if blob::apply_delete(&mut envelope, scope) {
            debug!("session delete for {} ({})", scope.record_key(), scope.category);
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
