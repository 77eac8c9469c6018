use serde::Serialize;

use crate::domain::{CorrectionArtifact, ImageRecord};
use crate::group::{Group, Groups};
use crate::key;

/// An image group the join dropped: either no correction group shared its
/// join key, or no configured join key was present on its records at all
/// (`join_id: None`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnmatchedGroup {
    pub group_id: String,
    pub join_id: Option<String>,
}

/// An image group whose join key matched more than one correction group.
/// All matches are still emitted; the caller decides what to do about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AmbiguousJoin {
    pub group_id: String,
    pub join_id: String,
    pub matches: Vec<String>,
}

#[derive(Debug)]
pub struct JoinOutcome<'a> {
    pub pairs: Vec<(&'a Group<ImageRecord>, &'a Group<CorrectionArtifact>)>,
    pub unmatched: Vec<UnmatchedGroup>,
    pub ambiguous: Vec<AmbiguousJoin>,
}

/// Equality join on the join-key subset. Both sides derive their key from
/// their first member, restricted to whichever configured keys that record
/// actually carries, so streams with different key schemas still associate.
pub fn join<'a>(
    images: &'a Groups<ImageRecord>,
    corrections: &'a Groups<CorrectionArtifact>,
    join_keys: &[String],
) -> JoinOutcome<'a> {
    let correction_keys: Vec<(Option<String>, &Group<CorrectionArtifact>)> = corrections
        .iter()
        .map(|group| {
            let id = group
                .members
                .first()
                .and_then(|artifact| key::derive_join_key(&artifact.metadata, join_keys))
                .map(|key| key.id().to_string());
            (id, group)
        })
        .collect();

    let mut pairs = Vec::new();
    let mut unmatched = Vec::new();
    let mut ambiguous = Vec::new();

    for image_group in images {
        let join_key = image_group
            .members
            .first()
            .and_then(|record| key::derive_join_key(&record.metadata, join_keys));
        let Some(join_key) = join_key else {
            unmatched.push(UnmatchedGroup {
                group_id: image_group.key.id().to_string(),
                join_id: None,
            });
            continue;
        };

        let matches: Vec<&Group<CorrectionArtifact>> = correction_keys
            .iter()
            .filter(|(id, _)| id.as_deref() == Some(join_key.id()))
            .map(|(_, group)| *group)
            .collect();

        match matches.len() {
            0 => unmatched.push(UnmatchedGroup {
                group_id: image_group.key.id().to_string(),
                join_id: Some(join_key.id().to_string()),
            }),
            1 => pairs.push((image_group, matches[0])),
            _ => {
                ambiguous.push(AmbiguousJoin {
                    group_id: image_group.key.id().to_string(),
                    join_id: join_key.id().to_string(),
                    matches: matches
                        .iter()
                        .map(|group| group.key.id().to_string())
                        .collect(),
                });
                for matched in matches {
                    pairs.push((image_group, matched));
                }
            }
        }
    }

    JoinOutcome {
        pairs,
        unmatched,
        ambiguous,
    }
}
