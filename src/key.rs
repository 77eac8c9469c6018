use crate::domain::{GroupKey, MetadataRecord};
use crate::error::PlatebindError;

/// Derive the grouping key for a record. Every configured key must be
/// present; `file` only labels the error.
pub fn derive_group_key(
    record: &MetadataRecord,
    file: &str,
    key_names: &[String],
) -> Result<GroupKey, PlatebindError> {
    let mut parts = Vec::with_capacity(key_names.len());
    for name in key_names {
        let value = record.get(name).ok_or_else(|| PlatebindError::MissingKey {
            key: name.clone(),
            file: file.to_string(),
        })?;
        parts.push((name.clone(), value.to_string()));
    }
    Ok(GroupKey::new(parts))
}

/// Derive the join key for a record: the configured keys restricted to the
/// ones actually present, in configured order. `None` when no configured key
/// is present at all.
pub fn derive_join_key(record: &MetadataRecord, key_names: &[String]) -> Option<GroupKey> {
    let parts: Vec<(String, String)> = key_names
        .iter()
        .filter_map(|name| {
            record
                .get(name)
                .map(|value| (name.clone(), value.to_string()))
        })
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(GroupKey::new(parts))
    }
}

/// Strict variant of [`derive_join_key`] for aggregating the correction
/// stream: a record with none of the join keys can never be associated with
/// an image group, so it fails instead of forming a keyless group.
pub fn derive_subset_key(
    record: &MetadataRecord,
    file: &str,
    key_names: &[String],
) -> Result<GroupKey, PlatebindError> {
    derive_join_key(record, key_names).ok_or_else(|| PlatebindError::MissingJoinKeys {
        keys: key_names.join(","),
        file: file.to_string(),
    })
}
