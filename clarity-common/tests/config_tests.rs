//! Unit tests for configuration and graceful degradation
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate CLARITY_* variables are marked with #[serial].

use clarity_common::config::{
    default_root_folder, env_flag, env_u64, load_toml_or_default, read_toml_config,
    LoggingConfig, RootFolderInitializer, RootFolderResolver, ROOT_FOLDER_ENV,
};
use serde::Deserialize;
use serial_test::serial;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Default, Deserialize)]
struct SampleConfig {
    #[serde(default)]
    root_folder: Option<PathBuf>,
    #[serde(default)]
    logging: LoggingConfig,
}

#[test]
#[serial]
fn test_resolver_with_no_overrides_uses_default() {
    env::remove_var(ROOT_FOLDER_ENV);

    let resolver = RootFolderResolver::new(None);
    assert_eq!(resolver.resolve(), default_root_folder());
}

#[test]
#[serial]
fn test_resolver_env_var_beats_toml() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/clarity-env-root");

    let resolver = RootFolderResolver::new(Some(PathBuf::from("/tmp/clarity-toml-root")));
    assert_eq!(resolver.resolve(), PathBuf::from("/tmp/clarity-env-root"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_resolver_toml_used_without_env() {
    env::remove_var(ROOT_FOLDER_ENV);

    let resolver = RootFolderResolver::new(Some(PathBuf::from("/tmp/clarity-toml-root")));
    assert_eq!(resolver.resolve(), PathBuf::from("/tmp/clarity-toml-root"));
}

#[test]
fn test_initializer_creates_directory_and_jobs_path() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path().join("nested").join("state");
    let initializer = RootFolderInitializer::new(root.clone());

    initializer.ensure_directory_exists().unwrap();

    assert!(root.is_dir());
    assert_eq!(initializer.jobs_file_path(), root.join("analysis-jobs.json"));
}

#[test]
fn test_missing_toml_yields_defaults() {
    let config: SampleConfig = load_toml_or_default(None);
    assert!(config.root_folder.is_none());
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_malformed_toml_degrades_to_defaults() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("config.toml");
    std::fs::write(&path, "root_folder = [not valid").unwrap();

    assert!(read_toml_config::<SampleConfig>(&path).is_err());

    let config: SampleConfig = load_toml_or_default(Some(&path));
    assert!(config.root_folder.is_none());
}

#[test]
fn test_valid_toml_is_parsed() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("config.toml");
    std::fs::write(
        &path,
        "root_folder = \"/srv/clarity\"\n[logging]\nlevel = \"debug\"\n",
    )
    .unwrap();

    let config: SampleConfig = load_toml_or_default(Some(&path));
    assert_eq!(config.root_folder, Some(PathBuf::from("/srv/clarity")));
    assert_eq!(config.logging.level, "debug");
}

#[test]
#[serial]
fn test_env_flag_and_u64_parsing() {
    env::set_var("CLARITY_TEST_FLAG", "TRUE");
    env::set_var("CLARITY_TEST_NUM", "4000");
    env::set_var("CLARITY_TEST_BAD_NUM", "lots");

    assert_eq!(env_flag("CLARITY_TEST_FLAG"), Some(true));
    assert_eq!(env_u64("CLARITY_TEST_NUM"), Some(4000));
    assert_eq!(env_u64("CLARITY_TEST_BAD_NUM"), None);
    assert_eq!(env_flag("CLARITY_TEST_UNSET_FLAG"), None);

    env::set_var("CLARITY_TEST_FLAG", "yes");
    assert_eq!(env_flag("CLARITY_TEST_FLAG"), Some(false));

    env::remove_var("CLARITY_TEST_FLAG");
    env::remove_var("CLARITY_TEST_NUM");
    env::remove_var("CLARITY_TEST_BAD_NUM");
}
