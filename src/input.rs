use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::domain::{CorrectionArtifact, ImageRecord, MetadataRecord};
use crate::error::PlatebindError;

#[derive(Debug, Deserialize)]
struct IndexEntry {
    metadata: serde_json::Map<String, Value>,
    file: String,
}

pub fn load_images(path: &Path) -> Result<Vec<ImageRecord>, PlatebindError> {
    Ok(load_entries(path)?
        .into_iter()
        .map(|(metadata, file)| ImageRecord { metadata, file })
        .collect())
}

pub fn load_corrections(path: &Path) -> Result<Vec<CorrectionArtifact>, PlatebindError> {
    Ok(load_entries(path)?
        .into_iter()
        .map(|(metadata, file)| CorrectionArtifact { metadata, file })
        .collect())
}

fn load_entries(path: &Path) -> Result<Vec<(MetadataRecord, String)>, PlatebindError> {
    let content =
        fs::read_to_string(path).map_err(|_| PlatebindError::InputRead(path.to_path_buf()))?;
    let entries: Vec<IndexEntry> =
        serde_json::from_str(&content).map_err(|err| PlatebindError::InputParse(err.to_string()))?;
    entries.into_iter().map(coerce_entry).collect()
}

// JSON scalars coerce to strings; null means absent; nested values have no
// scalar form and are rejected.
fn coerce_entry(entry: IndexEntry) -> Result<(MetadataRecord, String), PlatebindError> {
    let IndexEntry { metadata, file } = entry;
    let mut record = MetadataRecord::new();
    for (key, value) in metadata {
        match value {
            Value::Null => {}
            Value::String(text) => record.insert(key, text),
            Value::Number(number) => record.insert(key, number.to_string()),
            Value::Bool(flag) => record.insert(key, flag.to_string()),
            Value::Array(_) | Value::Object(_) => {
                return Err(PlatebindError::InvalidMetadataValue { key, file });
            }
        }
    }
    Ok((record, file))
}
