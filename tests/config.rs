use std::fs;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use platebind::config::{
    Config, ConfigLoader, ConfigOverrides, default_grouping_keys, default_join_keys,
    parse_key_list,
};
use platebind::error::PlatebindError;

#[test]
fn resolve_config_applies_defaults() {
    let resolved =
        ConfigLoader::resolve_config(Config::default(), ConfigOverrides::default()).unwrap();
    assert_eq!(resolved.schema_version, 1);
    assert_eq!(resolved.grouping_keys, default_grouping_keys());
    assert_eq!(resolved.join_keys, default_join_keys());
    assert_eq!(resolved.output_dir, Utf8PathBuf::from("manifests"));
    assert_eq!(resolved.site_stride, 1);
}

#[test]
fn resolve_reads_explicit_config_file() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("platebind.json");
    fs::write(
        &path,
        r#"{
            "schema_version": 1,
            "grouping_keys": ["batch", "plate", "cycle"],
            "join_keys": ["batch", "plate"],
            "output_dir": "load_data",
            "site_stride": 2
        }"#,
    )
    .unwrap();

    let resolved = ConfigLoader::resolve(
        Some(path.to_str().unwrap()),
        ConfigOverrides::default(),
    )
    .unwrap();
    assert_eq!(resolved.grouping_keys, vec!["batch", "plate", "cycle"]);
    assert_eq!(resolved.output_dir, Utf8PathBuf::from("load_data"));
    assert_eq!(resolved.site_stride, 2);
}

#[test]
fn explicit_missing_config_path_errors() {
    let err = ConfigLoader::resolve(Some("does/not/exist.json"), ConfigOverrides::default())
        .unwrap_err();
    assert_matches!(err, PlatebindError::ConfigRead(_));
}

#[test]
fn malformed_config_is_a_parse_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("platebind.json");
    fs::write(&path, "{not json").unwrap();

    let err = ConfigLoader::resolve(Some(path.to_str().unwrap()), ConfigOverrides::default())
        .unwrap_err();
    assert_matches!(err, PlatebindError::ConfigParse(_));
}

#[test]
fn cli_key_lists_override_config() {
    let config = Config {
        schema_version: None,
        grouping_keys: Some(vec!["plate".to_string()]),
        join_keys: Some(vec!["plate".to_string()]),
        output_dir: None,
        site_stride: None,
    };
    let overrides = ConfigOverrides {
        grouping_keys: Some(parse_key_list("batch,plate,well").unwrap()),
        join_keys: None,
        output_dir: None,
        site_stride: None,
    };
    let resolved = ConfigLoader::resolve_config(config, overrides).unwrap();
    assert_eq!(resolved.grouping_keys, vec!["batch", "plate", "well"]);
    assert_eq!(resolved.join_keys, vec!["plate"]);
}

#[test]
fn blank_key_list_is_rejected() {
    let config = Config {
        grouping_keys: Some(vec![String::new()]),
        ..Config::default()
    };
    let err = ConfigLoader::resolve_config(config, ConfigOverrides::default()).unwrap_err();
    assert_matches!(err, PlatebindError::InvalidKeyList(_));
}
