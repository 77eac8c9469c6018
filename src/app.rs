use std::time::Duration;

use rayon::prelude::*;
use serde::Serialize;

use crate::config::ResolvedConfig;
use crate::domain::{CorrectionArtifact, ImageRecord};
use crate::error::PlatebindError;
use crate::group::{self, Groups};
use crate::join::{self, AmbiguousJoin, UnmatchedGroup};
use crate::key;
use crate::manifest;
use crate::writer::ManifestWriter;

#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateResult {
    pub generated_at: String,
    pub output_dir: String,
    pub groups: Vec<GroupManifest>,
    pub unmatched: Vec<UnmatchedGroup>,
    pub ambiguous: Vec<AmbiguousJoin>,
    pub failures: Vec<GroupFailure>,
}

/// The per-group unit handed to the next pipeline stage: group identity and
/// metadata, the deduplicated image list, the correction list, and the
/// manifest location (absent on dry runs).
#[derive(Debug, Clone, Serialize)]
pub struct GroupManifest {
    pub group_id: String,
    pub metadata: Vec<(String, String)>,
    pub images: Vec<String>,
    pub corrections: Vec<String>,
    pub manifest_path: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupFailure {
    pub group_id: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub image_groups: Vec<CheckGroup>,
    pub correction_groups: Vec<CheckGroup>,
    pub unmatched: Vec<UnmatchedGroup>,
    pub ambiguous: Vec<AmbiguousJoin>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckGroup {
    pub group_id: String,
    pub members: usize,
    pub join_id: Option<String>,
    pub matches: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink: Send + Sync {
    fn event(&self, event: ProgressEvent);
}

pub struct App {
    config: ResolvedConfig,
}

impl App {
    pub fn new(config: ResolvedConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// Full pipeline: aggregate both streams, join, synthesize and write one
    /// manifest per joined group. Per-group failures land in the result;
    /// only stream-level problems (empty image stream, underivable grouping
    /// keys) abort the run.
    pub fn generate(
        &self,
        images: Vec<ImageRecord>,
        corrections: Vec<CorrectionArtifact>,
        options: GenerateOptions,
        sink: &dyn ProgressSink,
    ) -> Result<GenerateResult, PlatebindError> {
        if images.is_empty() {
            return Err(PlatebindError::EmptyImageStream);
        }

        sink.event(ProgressEvent {
            message: format!(
                "phase=Group; aggregating {} image record(s), {} correction artifact(s)",
                images.len(),
                corrections.len()
            ),
            elapsed: None,
        });
        let (image_groups, correction_groups) = self.aggregate(images, corrections)?;

        sink.event(ProgressEvent {
            message: format!(
                "phase=Join; {} image group(s) against {} correction group(s)",
                image_groups.len(),
                correction_groups.len()
            ),
            elapsed: None,
        });
        let outcome = join::join(&image_groups, &correction_groups, &self.config.join_keys);
        for dropped in &outcome.unmatched {
            tracing::warn!(
                group = %dropped.group_id,
                join_id = dropped.join_id.as_deref().unwrap_or("<none>"),
                "image group has no matching correction group; dropped from output"
            );
            sink.event(ProgressEvent {
                message: format!("phase=Join; unmatched image group {}", dropped.group_id),
                elapsed: None,
            });
        }
        for ambiguity in &outcome.ambiguous {
            tracing::warn!(
                group = %ambiguity.group_id,
                matches = ambiguity.matches.join(","),
                "image group matched more than one correction group"
            );
        }

        sink.event(ProgressEvent {
            message: format!(
                "phase=Synthesize; building {} manifest(s)",
                outcome.pairs.len()
            ),
            elapsed: None,
        });
        let writer = ManifestWriter::new(self.config.output_dir.clone());
        let synthesized: Vec<Result<GroupManifest, GroupFailure>> = outcome
            .pairs
            .par_iter()
            .map(|(image_group, correction_group)| {
                let group_id = image_group.key.id().to_string();
                let fail = |err: PlatebindError| GroupFailure {
                    group_id: group_id.clone(),
                    error: err.to_string(),
                };
                let built = manifest::synthesize(
                    image_group,
                    correction_group,
                    &self.config.grouping_keys,
                    self.config.site_stride,
                )
                .map_err(fail)?;
                let manifest_path = if options.dry_run {
                    None
                } else {
                    Some(
                        writer
                            .write(&group_id, &built.csv)
                            .map_err(|err| GroupFailure {
                                group_id: group_id.clone(),
                                error: err.to_string(),
                            })?
                            .to_string(),
                    )
                };
                Ok(GroupManifest {
                    group_id,
                    metadata: image_group.key.parts().to_vec(),
                    images: built.images,
                    corrections: built.corrections,
                    manifest_path,
                })
            })
            .collect();

        let mut groups = Vec::new();
        let mut failures = Vec::new();
        for item in synthesized {
            match item {
                Ok(group) => groups.push(group),
                Err(failure) => failures.push(failure),
            }
        }

        Ok(GenerateResult {
            generated_at: iso_timestamp(),
            output_dir: self.config.output_dir.to_string(),
            groups,
            unmatched: outcome.unmatched,
            ambiguous: outcome.ambiguous,
            failures,
        })
    }

    /// Grouping and join diagnostics without synthesizing or writing
    /// anything.
    pub fn check(
        &self,
        images: Vec<ImageRecord>,
        corrections: Vec<CorrectionArtifact>,
        sink: &dyn ProgressSink,
    ) -> Result<CheckResult, PlatebindError> {
        if images.is_empty() {
            return Err(PlatebindError::EmptyImageStream);
        }

        sink.event(ProgressEvent {
            message: "phase=Group; aggregating streams".to_string(),
            elapsed: None,
        });
        let (image_groups, correction_groups) = self.aggregate(images, corrections)?;
        let outcome = join::join(&image_groups, &correction_groups, &self.config.join_keys);

        let image_summaries = image_groups
            .iter()
            .map(|group| {
                let join_id = group
                    .members
                    .first()
                    .and_then(|record| key::derive_join_key(&record.metadata, &self.config.join_keys))
                    .map(|key| key.id().to_string());
                let matches = outcome
                    .pairs
                    .iter()
                    .filter(|(image_group, _)| image_group.key.id() == group.key.id())
                    .map(|(_, correction_group)| correction_group.key.id().to_string())
                    .collect();
                CheckGroup {
                    group_id: group.key.id().to_string(),
                    members: group.members.len(),
                    join_id,
                    matches,
                }
            })
            .collect();
        let correction_summaries = correction_groups
            .iter()
            .map(|group| CheckGroup {
                group_id: group.key.id().to_string(),
                members: group.members.len(),
                join_id: Some(group.key.id().to_string()),
                matches: Vec::new(),
            })
            .collect();

        Ok(CheckResult {
            image_groups: image_summaries,
            correction_groups: correction_summaries,
            unmatched: outcome.unmatched,
            ambiguous: outcome.ambiguous,
        })
    }

    fn aggregate(
        &self,
        images: Vec<ImageRecord>,
        corrections: Vec<CorrectionArtifact>,
    ) -> Result<(Groups<ImageRecord>, Groups<CorrectionArtifact>), PlatebindError> {
        let image_groups = group::aggregate(images, |record: &ImageRecord| {
            key::derive_group_key(&record.metadata, &record.file, &self.config.grouping_keys)
        })?;
        // Corrections carry a key subset, so they group by whichever join
        // keys they have rather than by the full grouping-key list.
        let correction_groups = group::aggregate(corrections, |artifact: &CorrectionArtifact| {
            key::derive_subset_key(&artifact.metadata, &artifact.file, &self.config.join_keys)
        })?;
        Ok((image_groups, correction_groups))
    }
}

fn iso_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}
