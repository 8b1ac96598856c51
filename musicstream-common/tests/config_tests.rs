//! Tests for configuration loading and root folder resolution
//!
//! Tests that manipulate MUSICSTREAM_ROOT_FOLDER are marked #[serial] so
//! they do not race on the process environment.

use musicstream_common::config::{
    CompiledDefaults, RootFolderInitializer, RootFolderResolver, TomlConfig, ROOT_FOLDER_ENV,
};
use serial_test::serial;
use std::env;
use std::path::PathBuf;

#[test]
fn test_compiled_defaults_for_current_platform() {
    let defaults = CompiledDefaults::for_current_platform();

    assert!(!defaults.root_folder.as_os_str().is_empty());
    assert!(defaults.root_folder.to_string_lossy().contains("musicstream"));
    assert_eq!(defaults.bind_addr, "127.0.0.1:8000");
    assert_eq!(defaults.log_level, "info");
}

#[test]
#[serial]
fn test_resolver_with_no_overrides_uses_default() {
    env::remove_var(ROOT_FOLDER_ENV);

    let root_folder = RootFolderResolver::new().resolve();

    assert_eq!(root_folder, CompiledDefaults::for_current_platform().root_folder);
}

#[test]
#[serial]
fn test_resolver_env_var() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/musicstream-env-root");

    let root_folder = RootFolderResolver::new().resolve();
    env::remove_var(ROOT_FOLDER_ENV);

    assert_eq!(root_folder, PathBuf::from("/tmp/musicstream-env-root"));
}

#[test]
#[serial]
fn test_resolver_cli_beats_env_and_toml() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/from-env");
    let toml = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/from-toml")),
        ..Default::default()
    };

    let root_folder = RootFolderResolver::new()
        .with_cli_arg(Some(PathBuf::from("/tmp/from-cli")))
        .with_toml(&toml)
        .resolve();
    env::remove_var(ROOT_FOLDER_ENV);

    assert_eq!(root_folder, PathBuf::from("/tmp/from-cli"));
}

#[test]
#[serial]
fn test_resolver_env_beats_toml() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/from-env");
    let toml = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/from-toml")),
        ..Default::default()
    };

    let root_folder = RootFolderResolver::new().with_toml(&toml).resolve();
    env::remove_var(ROOT_FOLDER_ENV);

    assert_eq!(root_folder, PathBuf::from("/tmp/from-env"));
}

#[test]
#[serial]
fn test_resolver_toml_used_without_env() {
    env::remove_var(ROOT_FOLDER_ENV);
    let toml = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/from-toml")),
        ..Default::default()
    };

    let root_folder = RootFolderResolver::new().with_toml(&toml).resolve();

    assert_eq!(root_folder, PathBuf::from("/tmp/from-toml"));
}

#[test]
fn test_toml_parsing_full() {
    let config = TomlConfig::from_toml_str(
        r#"
        root_folder = "/srv/musicstream"
        bind_addr = "0.0.0.0:9000"

        [logging]
        level = "debug"

        [session]
        cookie_secure = true
        ttl_hours = 12

        [uploads]
        max_upload_mb = 50
        "#,
    )
    .unwrap();

    assert_eq!(config.root_folder, Some(PathBuf::from("/srv/musicstream")));
    assert_eq!(config.bind_addr.as_deref(), Some("0.0.0.0:9000"));
    assert_eq!(config.logging.level, "debug");
    assert!(config.session.cookie_secure);
    assert_eq!(config.session.ttl_hours, 12);
    assert_eq!(config.uploads.max_upload_mb, 50);
}

#[test]
fn test_toml_parsing_partial_uses_defaults() {
    let config = TomlConfig::from_toml_str("[session]\ncookie_secure = true\n").unwrap();

    assert!(config.root_folder.is_none());
    assert_eq!(config.logging.level, "info");
    assert!(config.session.cookie_secure);
    assert_eq!(config.session.ttl_hours, 24 * 14);
    assert_eq!(config.uploads.max_upload_mb, 200);
}

#[test]
fn test_toml_parsing_invalid_is_error() {
    assert!(TomlConfig::from_toml_str("root_folder = [").is_err());
}

#[test]
fn test_load_or_default_with_malformed_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "bind_addr = 42").unwrap();

    let config = TomlConfig::load_or_default(Some(&path));

    assert!(config.bind_addr.is_none());
}

#[test]
fn test_load_or_default_with_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = TomlConfig::load_or_default(Some(&dir.path().join("absent.toml")));
    assert!(config.root_folder.is_none());
}

#[test]
fn test_initializer_creates_layout() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("root");
    let init = RootFolderInitializer::new(root.clone());

    init.ensure_directory_exists().unwrap();

    assert!(root.is_dir());
    assert!(init.media_path().is_dir());
    assert!(init.static_path().is_dir());
    assert_eq!(init.database_path(), root.join("musicstream.db"));
}
