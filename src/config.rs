use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::error::PlatebindError;

pub const DEFAULT_CONFIG_FILE: &str = "platebind.json";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub grouping_keys: Option<Vec<String>>,
    #[serde(default)]
    pub join_keys: Option<Vec<String>>,
    #[serde(default)]
    pub output_dir: Option<String>,
    #[serde(default)]
    pub site_stride: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub grouping_keys: Vec<String>,
    pub join_keys: Vec<String>,
    pub output_dir: Utf8PathBuf,
    pub site_stride: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub grouping_keys: Option<Vec<String>>,
    pub join_keys: Option<Vec<String>>,
    pub output_dir: Option<String>,
    pub site_stride: Option<usize>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load the config file if present and fold in CLI overrides. Unlike a
    /// manifest-driven tool there is no mandatory config here: with no
    /// explicit path and no `platebind.json` in the working directory the
    /// defaults apply.
    pub fn resolve(
        path: Option<&str>,
        overrides: ConfigOverrides,
    ) -> Result<ResolvedConfig, PlatebindError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        let config = if path.is_none() && !config_path.exists() {
            Config::default()
        } else {
            let content = fs::read_to_string(&config_path)
                .map_err(|_| PlatebindError::ConfigRead(config_path.clone()))?;
            serde_json::from_str(&content)
                .map_err(|err| PlatebindError::ConfigParse(err.to_string()))?
        };

        Self::resolve_config(config, overrides)
    }

    pub fn resolve_config(
        config: Config,
        overrides: ConfigOverrides,
    ) -> Result<ResolvedConfig, PlatebindError> {
        let schema_version = config.schema_version.unwrap_or(1);

        let grouping_keys = overrides
            .grouping_keys
            .or(config.grouping_keys)
            .unwrap_or_else(default_grouping_keys);
        validate_key_list("grouping_keys", &grouping_keys)?;

        let join_keys = overrides
            .join_keys
            .or(config.join_keys)
            .unwrap_or_else(default_join_keys);
        validate_key_list("join_keys", &join_keys)?;

        let output_dir = overrides
            .output_dir
            .or(config.output_dir)
            .unwrap_or_else(|| "manifests".to_string());

        let site_stride = overrides.site_stride.or(config.site_stride).unwrap_or(1);
        if site_stride == 0 {
            return Err(PlatebindError::InvalidStride(site_stride));
        }

        Ok(ResolvedConfig {
            schema_version,
            grouping_keys,
            join_keys,
            output_dir: Utf8PathBuf::from(output_dir),
            site_stride,
        })
    }
}

pub fn default_grouping_keys() -> Vec<String> {
    vec!["batch".to_string(), "plate".to_string()]
}

pub fn default_join_keys() -> Vec<String> {
    vec!["batch".to_string(), "plate".to_string()]
}

/// Parse a CLI-style `a,b,c` key list.
pub fn parse_key_list(raw: &str) -> Result<Vec<String>, PlatebindError> {
    let keys: Vec<String> = raw
        .split(',')
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .collect();
    if keys.is_empty() {
        return Err(PlatebindError::InvalidKeyList(raw.to_string()));
    }
    Ok(keys)
}

fn validate_key_list(name: &str, keys: &[String]) -> Result<(), PlatebindError> {
    if keys.is_empty() || keys.iter().any(|key| key.trim().is_empty()) {
        return Err(PlatebindError::InvalidKeyList(format!(
            "{name} must name at least one non-empty key"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn resolve_config_defaults() {
        let resolved =
            ConfigLoader::resolve_config(Config::default(), ConfigOverrides::default()).unwrap();
        assert_eq!(resolved.schema_version, 1);
        assert_eq!(resolved.grouping_keys, default_grouping_keys());
        assert_eq!(resolved.join_keys, default_join_keys());
        assert_eq!(resolved.output_dir, Utf8PathBuf::from("manifests"));
        assert_eq!(resolved.site_stride, 1);
    }

    #[test]
    fn overrides_beat_config_values() {
        let config = Config {
            schema_version: Some(2),
            grouping_keys: Some(vec!["plate".to_string()]),
            join_keys: None,
            output_dir: Some("out".to_string()),
            site_stride: Some(2),
        };
        let overrides = ConfigOverrides {
            grouping_keys: Some(vec!["batch".to_string(), "plate".to_string()]),
            join_keys: None,
            output_dir: None,
            site_stride: Some(3),
        };
        let resolved = ConfigLoader::resolve_config(config, overrides).unwrap();
        assert_eq!(resolved.schema_version, 2);
        assert_eq!(resolved.grouping_keys, vec!["batch", "plate"]);
        assert_eq!(resolved.output_dir, Utf8PathBuf::from("out"));
        assert_eq!(resolved.site_stride, 3);
    }

    #[test]
    fn zero_stride_is_rejected() {
        let overrides = ConfigOverrides {
            site_stride: Some(0),
            ..ConfigOverrides::default()
        };
        let err = ConfigLoader::resolve_config(Config::default(), overrides).unwrap_err();
        assert_matches!(err, PlatebindError::InvalidStride(0));
    }

    #[test]
    fn parse_key_list_trims_entries() {
        assert_eq!(parse_key_list("batch, plate").unwrap(), vec!["batch", "plate"]);
        assert_matches!(parse_key_list(" , ").unwrap_err(), PlatebindError::InvalidKeyList(_));
    }
}
