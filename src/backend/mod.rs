//! Persistence strategies behind one capability contract.
//!
//! Three backends implement [`StorageBackend`]: session and cookie keep a
//! single JSON blob per master key (read-modify-write on every change), the
//! relational backend keeps one master row and one detail row per key. The
//! implementation is selected once at construction; callers never branch on
//! the storage kind again.
//!
//! Each backend wraps an injected collaborator trait ([`SessionStore`],
//! [`CookieJar`], [`ConfigDb`]) so the web framework's primitives stay
//! outside this crate. In-memory reference implementations back the traits
//! for tests and development.
//!
//! Concurrency: concurrent requests doing read-modify-write on the same
//! session/cookie blob are last-write-wins at blob granularity. Session and
//! cookie stores are not safely lockable across processes, so no in-process
//! locking is attempted. The relational upsert race (two first-saves both
//! observing "absent") is handled by converting the losing INSERT's
//! duplicate-key violation into an UPDATE.

mod blob;
mod cookie;
mod db;
mod error;
mod session;

use std::collections::BTreeMap;

use crate::config::{Category, ConfigMap, MasterConfig};
use crate::key::KeyScope;

pub use cookie::{CookieBackend, CookieJar, CookieSettings, InMemoryCookieJar};
pub use db::{ConfigDb, DbBackend, DbDetailSettings, DbSettings, InMemoryConfigDb};
pub use error::BackendError;
pub use session::{InMemorySessionStore, SessionBackend, SessionStore};

/// Master-record column selector for [`StorageBackend::read`].
///
/// The blob backends answer `FilterRef`/`SortRef` out of the decoded master
/// blob; the relational backend reads the corresponding row column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// The record's payload (master config or detail data).
    Data,
    /// The record's own key, returned only when the record exists.
    Id,
    /// The master's default-filter reference.
    FilterRef,
    /// The master's default-sort reference.
    SortRef,
}

/// One write, tagged by record kind.
#[derive(Debug, Clone, Copy)]
pub enum WriteRecord<'a> {
    Master(&'a MasterConfig),
    Detail {
        name: &'a str,
        data: &'a ConfigMap,
        /// Relational rename-without-payload mode: an update touches only
        /// the name column, leaving the stored payload as-is. Ignored by the
        /// blob backends, which always rewrite the whole entry.
        update_name_only: bool,
    },
}

/// The uniform read/write/delete/list contract all backends implement.
pub trait StorageBackend: Send + Sync + std::fmt::Debug {
    /// Read one field of the record identified by `scope`.
    fn read(&self, scope: &KeyScope, field: Field) -> Result<Option<String>, BackendError>;

    /// Create or replace the record identified by `scope`.
    fn write(&self, scope: &KeyScope, record: WriteRecord<'_>) -> Result<(), BackendError>;

    /// Remove the record identified by `scope`. Master deletion never
    /// cascades to details.
    fn delete(&self, scope: &KeyScope) -> Result<(), BackendError>;

    /// Scrub the master's default filter/sort reference for `category`.
    fn clear_reference(&self, scope: &KeyScope, category: Category) -> Result<(), BackendError>;

    /// List detail records under the scope's master key for one category,
    /// as a detail-key → display-name mapping.
    fn list_details(
        &self,
        scope: &KeyScope,
        category: Category,
    ) -> Result<BTreeMap<String, String>, BackendError>;
}
