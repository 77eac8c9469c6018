use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Immutable string-to-string metadata map attached to every image and
/// correction record. Values are scalars; comma-joined channel lists are
/// kept as plain strings and split where they are consumed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord(BTreeMap<String, String>);

impl MetadataRecord {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    pub metadata: MetadataRecord,
    pub file: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectionArtifact {
    pub metadata: MetadataRecord,
    pub file: String,
}

/// Ordered (key, value) pairs plus the derived identifier: values joined
/// with `_` in key order. Two records belong to the same group iff their
/// identifiers are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    parts: Vec<(String, String)>,
    id: String,
}

impl GroupKey {
    pub fn new(parts: Vec<(String, String)>) -> Self {
        let id = parts
            .iter()
            .map(|(_, value)| value.as_str())
            .collect::<Vec<_>>()
            .join("_");
        Self { parts, id }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn parts(&self) -> &[(String, String)] {
        &self.parts
    }

    pub fn value_of(&self, key: &str) -> Option<&str> {
        self.parts
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}
