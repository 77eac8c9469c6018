use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use csv::{QuoteStyle, WriterBuilder};

use crate::channel::{self, CHANNELS_KEY};
use crate::domain::{CorrectionArtifact, ImageRecord};
use crate::error::PlatebindError;
use crate::group::Group;
use crate::illum;

pub const WELL_KEY: &str = "well";
pub const SITE_KEY: &str = "site";
pub const DEFAULT_SITE: &str = "1";

/// Everything the downstream tool consumes for one joined group: the CSV
/// text, the image list deduplicated by physical file name, and the
/// correction file list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedManifest {
    pub images: Vec<String>,
    pub corrections: Vec<String>,
    pub csv: String,
}

struct Bucket<'a> {
    well: String,
    site: String,
    // (raw channels value, file) in arrival order.
    files: Vec<(&'a str, &'a str)>,
}

/// Build the manifest for one joined (image group, correction group) pair.
///
/// One row per distinct (well, site) pair in first-seen order; one original
/// and one correction column per channel in ascending channel order. Cells
/// that cannot be resolved stay empty rather than failing the group. A
/// `site_stride` above 1 keeps every n-th distinct site.
pub fn synthesize(
    image_group: &Group<ImageRecord>,
    correction_group: &Group<CorrectionArtifact>,
    grouping_keys: &[String],
    site_stride: usize,
) -> Result<SynthesizedManifest, PlatebindError> {
    let layout = channel::resolve(image_group.members.iter().map(|record| &record.metadata));

    let mut correction_by_channel: HashMap<String, &str> = HashMap::new();
    for artifact in &correction_group.members {
        match illum::parse_file_name(&artifact.file) {
            Some(parsed) => {
                correction_by_channel.insert(parsed.channel, artifact.file.as_str());
            }
            None => {
                tracing::debug!(file = %artifact.file, "correction file name carries no channel");
            }
        }
    }

    let mut buckets: Vec<Bucket<'_>> = Vec::new();
    let mut bucket_index: HashMap<(String, String), usize> = HashMap::new();
    for record in &image_group.members {
        let well = record.metadata.get(WELL_KEY).unwrap_or("").to_string();
        let site = record
            .metadata
            .get(SITE_KEY)
            .unwrap_or(DEFAULT_SITE)
            .to_string();
        let raw_channels = record.metadata.get(CHANNELS_KEY).unwrap_or("");
        let slot = *bucket_index
            .entry((well.clone(), site.clone()))
            .or_insert_with(|| {
                buckets.push(Bucket {
                    well,
                    site,
                    files: Vec::new(),
                });
                buckets.len() - 1
            });
        buckets[slot].files.push((raw_channels, &record.file));
    }

    let selected_sites = select_sites(&buckets, site_stride);

    let group_columns: Vec<&str> = grouping_keys
        .iter()
        .map(String::as_str)
        .filter(|key| *key != WELL_KEY && *key != SITE_KEY)
        .collect();

    let mut header: Vec<String> = group_columns
        .iter()
        .map(|key| format!("Metadata_{}", capitalize(key)))
        .collect();
    header.push("Metadata_Well".to_string());
    header.push("Metadata_Site".to_string());
    for name in &layout.channels {
        header.push(format!("FileName_Orig{name}"));
    }
    for name in &layout.channels {
        header.push(format!("FileName_Illum{name}"));
    }

    let mut rows: Vec<Vec<String>> = Vec::new();
    for bucket in &buckets {
        if !selected_sites.contains(bucket.site.as_str()) {
            continue;
        }
        let mut row: Vec<String> = group_columns
            .iter()
            .map(|key| {
                image_group
                    .key
                    .value_of(key)
                    .unwrap_or_default()
                    .to_string()
            })
            .collect();
        row.push(bucket.well.clone());
        row.push(bucket.site.clone());
        for name in &layout.channels {
            row.push(original_file(bucket, name, layout.pre_split));
        }
        for name in &layout.channels {
            row.push(
                correction_by_channel
                    .get(name.as_str())
                    .map(|file| file.to_string())
                    .unwrap_or_default(),
            );
        }
        rows.push(row);
    }

    let csv = encode_csv(&header, &rows)?;

    let mut seen = HashSet::new();
    let mut images = Vec::new();
    for record in &image_group.members {
        if seen.insert(record.file.as_str()) {
            images.push(record.file.clone());
        }
    }
    let corrections = correction_group
        .members
        .iter()
        .map(|artifact| artifact.file.clone())
        .collect();

    Ok(SynthesizedManifest {
        images,
        corrections,
        csv,
    })
}

fn original_file(bucket: &Bucket<'_>, channel: &str, pre_split: bool) -> String {
    let found = if pre_split {
        bucket.files.iter().find(|(raw, _)| *raw == channel)
    } else {
        bucket
            .files
            .iter()
            .find(|(raw, _)| channel::split_channels(raw).iter().any(|name| name == channel))
    };
    found.map(|(_, file)| file.to_string()).unwrap_or_default()
}

fn select_sites<'a>(buckets: &'a [Bucket<'_>], stride: usize) -> HashSet<&'a str> {
    let mut sites: Vec<&str> = Vec::new();
    for bucket in buckets {
        if !sites.contains(&bucket.site.as_str()) {
            sites.push(bucket.site.as_str());
        }
    }
    sites.sort_by(|a, b| site_order(a, b));
    sites
        .into_iter()
        .step_by(stride.max(1))
        .collect()
}

fn site_order(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(left), Ok(right)) => left.cmp(&right),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// The wire format the consuming tool expects: an unquoted header line, then
/// every data cell double-quoted so commas inside file names survive.
fn encode_csv(header: &[String], rows: &[Vec<String>]) -> Result<String, PlatebindError> {
    let mut buffer = Vec::new();
    {
        let mut writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Never)
            .from_writer(&mut buffer);
        writer
            .write_record(header)
            .map_err(|err| PlatebindError::ManifestEncode(err.to_string()))?;
        writer
            .flush()
            .map_err(|err| PlatebindError::ManifestEncode(err.to_string()))?;
    }
    {
        let mut writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Always)
            .from_writer(&mut buffer);
        for row in rows {
            writer
                .write_record(row)
                .map_err(|err| PlatebindError::ManifestEncode(err.to_string()))?;
        }
        writer
            .flush()
            .map_err(|err| PlatebindError::ManifestEncode(err.to_string()))?;
    }
    String::from_utf8(buffer).map_err(|err| PlatebindError::ManifestEncode(err.to_string()))
}

fn capitalize(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
