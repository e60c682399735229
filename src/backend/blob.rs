//! Envelope operations shared by the session and cookie backends.
//!
//! Both keep the whole personalization state for one master key in a single
//! blob; every mutation is load → apply → store. The helpers here implement
//! the apply step so the two backends differ only in how the blob travels.

use serde_json::Value;

use crate::codec::{decode, encode, Envelope};
use crate::config::Category;
use crate::key::KeyScope;

use super::{BackendError, Field, WriteRecord};

fn detail_key<'a>(scope: &'a KeyScope) -> &'a str {
    scope.detail_key.as_deref().unwrap_or_default()
}

/// Answer a field read out of the decoded blob.
pub(super) fn read_field(envelope: &Envelope, scope: &KeyScope, field: Field) -> Option<String> {
    if scope.category.is_master() {
        match field {
            Field::Data => envelope.master().map(str::to_string),
            Field::Id => envelope.master().map(|_| scope.master_key.clone()),
            Field::FilterRef => master_reference(envelope, Category::Filter),
            Field::SortRef => master_reference(envelope, Category::Sort),
        }
    } else {
        let key = detail_key(scope);
        match field {
            Field::Data => envelope
                .detail_data(scope.category, key)
                .map(str::to_string),
            Field::Id => envelope
                .detail_data(scope.category, key)
                .map(|_| key.to_string()),
            Field::FilterRef | Field::SortRef => None,
        }
    }
}

/// The filter/sort reference held inside the encoded master config.
fn master_reference(envelope: &Envelope, category: Category) -> Option<String> {
    let master = decode(envelope.master()?);
    match master.get(category.as_str()) {
        Some(Value::String(id)) if !id.is_empty() => Some(id.clone()),
        _ => None,
    }
}

/// Merge one write into the blob.
pub(super) fn apply_write(
    envelope: &mut Envelope,
    scope: &KeyScope,
    record: WriteRecord<'_>,
) -> Result<(), BackendError> {
    match record {
        WriteRecord::Master(config) => {
            envelope.set_master(encode(config)?);
        }
        WriteRecord::Detail { name, data, .. } => {
            envelope.set_detail(scope.category, detail_key(scope), name, encode(data)?);
        }
    }
    Ok(())
}

/// Remove the scoped record from the blob. Returns whether it changed.
pub(super) fn apply_delete(envelope: &mut Envelope, scope: &KeyScope) -> bool {
    if scope.category.is_master() {
        let existed = envelope.master().is_some();
        envelope.remove_master();
        existed
    } else {
        envelope.remove_detail(scope.category, detail_key(scope))
    }
}

/// Drop the filter/sort reference from the encoded master config.
/// Returns whether the blob changed.
pub(super) fn apply_clear_reference(
    envelope: &mut Envelope,
    category: Category,
) -> Result<bool, BackendError> {
    let Some(raw) = envelope.master() else {
        return Ok(false);
    };
    let mut master = decode(raw);
    if master.remove(category.as_str()).is_none() {
        return Ok(false);
    }
    envelope.set_master(encode(&master)?);
    Ok(true)
}
