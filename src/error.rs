use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum PlatebindError {
    #[error("record {file} is missing grouping key: {key}")]
    MissingKey { key: String, file: String },

    #[error("record {file} carries none of the join keys: {keys}")]
    MissingJoinKeys { keys: String, file: String },

    #[error("image stream is empty")]
    EmptyImageStream,

    #[error("metadata key {key} in record {file} has a non-scalar value")]
    InvalidMetadataValue { key: String, file: String },

    #[error("failed to read input index at {0}")]
    InputRead(PathBuf),

    #[error("failed to parse input index: {0}")]
    InputParse(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("invalid key list: {0}")]
    InvalidKeyList(String),

    #[error("site stride must be at least 1, got {0}")]
    InvalidStride(usize),

    #[error("failed to encode manifest rows: {0}")]
    ManifestEncode(String),

    #[error("failed to write manifest {path}: {message}")]
    ManifestWrite { path: String, message: String },
}
