use std::collections::HashMap;

use crate::domain::GroupKey;
use crate::error::PlatebindError;

#[derive(Debug, Clone)]
pub struct Group<T> {
    pub key: GroupKey,
    pub members: Vec<T>,
}

/// Groups in first-seen order, with members in arrival order. Membership is
/// only complete once the whole input has been consumed, so aggregation runs
/// over a fully materialized vector.
#[derive(Debug, Clone)]
pub struct Groups<T> {
    groups: Vec<Group<T>>,
    index: HashMap<String, usize>,
}

impl<T> Groups<T> {
    pub fn iter(&self) -> std::slice::Iter<'_, Group<T>> {
        self.groups.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Group<T>> {
        self.index.get(id).map(|slot| &self.groups[*slot])
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl<'a, T> IntoIterator for &'a Groups<T> {
    type Item = &'a Group<T>;
    type IntoIter = std::slice::Iter<'a, Group<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

/// Aggregate records into groups keyed by the derived identifier. A record
/// whose key cannot be derived aborts the aggregation with that error; it is
/// never silently dropped. Empty input yields an empty mapping.
pub fn aggregate<T, F>(items: Vec<T>, derive: F) -> Result<Groups<T>, PlatebindError>
where
    F: Fn(&T) -> Result<GroupKey, PlatebindError>,
{
    let mut groups: Vec<Group<T>> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for item in items {
        let key = derive(&item)?;
        match index.get(key.id()) {
            Some(&slot) => groups[slot].members.push(item),
            None => {
                index.insert(key.id().to_string(), groups.len());
                groups.push(Group {
                    key,
                    members: vec![item],
                });
            }
        }
    }

    Ok(Groups { groups, index })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::domain::{ImageRecord, MetadataRecord};
    use crate::key;

    fn image(pairs: &[(&str, &str)], file: &str) -> ImageRecord {
        ImageRecord {
            metadata: MetadataRecord::from_pairs(pairs.iter().copied()),
            file: file.to_string(),
        }
    }

    fn derive_by(names: &[&str]) -> impl Fn(&ImageRecord) -> Result<GroupKey, PlatebindError> {
        let names: Vec<String> = names.iter().map(|name| name.to_string()).collect();
        move |record| key::derive_group_key(&record.metadata, &record.file, &names)
    }

    #[test]
    fn aggregate_preserves_first_seen_group_and_member_order() {
        let records = vec![
            image(&[("plate", "P2")], "b.tiff"),
            image(&[("plate", "P1")], "a.tiff"),
            image(&[("plate", "P2")], "c.tiff"),
        ];
        let groups = aggregate(records, derive_by(&["plate"])).unwrap();
        assert_eq!(groups.len(), 2);

        let ids: Vec<&str> = groups.iter().map(|group| group.key.id()).collect();
        assert_eq!(ids, vec!["P2", "P1"]);

        let files: Vec<&str> = groups.get("P2").unwrap().members.iter().map(|r| r.file.as_str()).collect();
        assert_eq!(files, vec!["b.tiff", "c.tiff"]);
    }

    #[test]
    fn aggregate_empty_input_yields_empty_mapping() {
        let groups = aggregate(Vec::new(), derive_by(&["plate"])).unwrap();
        assert!(groups.is_empty());
    }

    #[test]
    fn aggregate_fails_on_missing_key() {
        let records = vec![
            image(&[("plate", "P1")], "a.tiff"),
            image(&[("batch", "B1")], "b.tiff"),
        ];
        let err = aggregate(records, derive_by(&["plate"])).unwrap_err();
        assert_matches!(err, PlatebindError::MissingKey { key, file } => {
            assert_eq!(key, "plate");
            assert_eq!(file, "b.tiff");
        });
    }
}
