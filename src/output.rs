use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;

use crate::app::{CheckResult, GenerateResult};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_generate(result: &GenerateResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_check(result: &CheckResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl crate::app::ProgressSink for JsonOutput {
    fn event(&self, _event: crate::app::ProgressEvent) {}
}

#[derive(Debug, Serialize)]
struct FileList<'a> {
    groups: Vec<FileListGroup<'a>>,
}

#[derive(Debug, Serialize)]
struct FileListGroup<'a> {
    group_id: &'a str,
    images: &'a [String],
    corrections: &'a [String],
}

/// Staging export: per group the deduplicated image files and the
/// correction files the downstream tool must have on hand.
pub fn write_file_list(result: &GenerateResult, path: &Path) -> io::Result<()> {
    let list = FileList {
        groups: result
            .groups
            .iter()
            .map(|group| FileListGroup {
                group_id: &group.group_id,
                images: &group.images,
                corrections: &group.corrections,
            })
            .collect(),
    };
    let json = serde_json::to_vec_pretty(&list).map_err(io::Error::other)?;
    fs::write(path, json)
}
