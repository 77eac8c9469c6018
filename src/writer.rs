use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};

use crate::error::PlatebindError;

/// Writes one manifest per group into the destination directory. Each write
/// goes to a temp file in the destination first and is renamed into place,
/// so a crash never leaves a half-written `<GroupId>.csv` behind; reruns
/// overwrite.
#[derive(Debug, Clone)]
pub struct ManifestWriter {
    destination: Utf8PathBuf,
}

impl ManifestWriter {
    pub fn new(destination: Utf8PathBuf) -> Self {
        Self { destination }
    }

    pub fn destination(&self) -> &Utf8Path {
        &self.destination
    }

    pub fn manifest_path(&self, group_id: &str) -> Utf8PathBuf {
        self.destination.join(format!("{group_id}.csv"))
    }

    pub fn write(&self, group_id: &str, csv_text: &str) -> Result<Utf8PathBuf, PlatebindError> {
        let path = self.manifest_path(group_id);
        let write_err = |message: String| PlatebindError::ManifestWrite {
            path: path.to_string(),
            message,
        };

        fs::create_dir_all(self.destination.as_std_path())
            .map_err(|err| write_err(err.to_string()))?;
        let mut temp = tempfile::Builder::new()
            .prefix(".platebind-manifest")
            .tempfile_in(self.destination.as_std_path())
            .map_err(|err| write_err(err.to_string()))?;
        temp.write_all(csv_text.as_bytes())
            .map_err(|err| write_err(err.to_string()))?;
        if path.as_std_path().exists() {
            fs::remove_file(path.as_std_path()).map_err(|err| write_err(err.to_string()))?;
        }
        temp.persist(path.as_std_path())
            .map_err(|err| write_err(err.to_string()))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_creates_destination_and_file() {
        let temp = tempfile::tempdir().unwrap();
        let destination =
            Utf8PathBuf::from_path_buf(temp.path().join("manifests")).unwrap();
        let writer = ManifestWriter::new(destination);

        let path = writer.write("B1_P1", "header\n").unwrap();
        assert!(path.ends_with("B1_P1.csv"));
        assert_eq!(fs::read_to_string(path.as_std_path()).unwrap(), "header\n");
    }

    #[test]
    fn write_overwrites_existing_manifest() {
        let temp = tempfile::tempdir().unwrap();
        let destination = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        let writer = ManifestWriter::new(destination);

        writer.write("B1_P1", "first\n").unwrap();
        let path = writer.write("B1_P1", "second\n").unwrap();
        assert_eq!(fs::read_to_string(path.as_std_path()).unwrap(), "second\n");

        let leftovers: Vec<_> = fs::read_dir(temp.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry
                    .file_name()
                    .to_string_lossy()
                    .starts_with(".platebind-manifest")
            })
            .collect();
        assert!(leftovers.is_empty());
    }
}
