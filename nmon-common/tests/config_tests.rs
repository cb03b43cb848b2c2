//! Tests for TOML config loading and resolution
//!
//! Missing files degrade to defaults; broken files are reported.

use nmon_common::config::{
    load_toml_config, CompiledDefaults, ConfigOverrides, ServerConfig, TomlConfig,
};
use nmon_common::Error;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_compiled_defaults_for_current_platform() {
    let defaults = CompiledDefaults::for_current_platform();

    assert!(!defaults.data_folder.as_os_str().is_empty());
    assert!(defaults.data_folder.ends_with("nmon") || defaults.data_folder.ends_with("nmon_data"));
    assert_eq!(defaults.port, 5801);
    assert_eq!(defaults.log_level, "info");
}

#[test]
fn test_missing_config_file_uses_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("does-not-exist.toml");

    let config = load_toml_config(&path).unwrap();
    assert!(config.port.is_none());
    assert!(config.data_folder.is_none());
    assert!(config.logging.level.is_none());
}

#[test]
fn test_full_config_file_is_parsed() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
data_folder = "/srv/nmon"
host = "0.0.0.0"
port = 9100
seed_dir = "/srv/nmon/seed"
dedup_window_minutes = 30
hotspot_default_top = 5

[logging]
level = "debug"
"#,
    )
    .unwrap();

    let toml = load_toml_config(&path).unwrap();
    let config = ServerConfig::resolve(ConfigOverrides::default(), toml).unwrap();

    assert_eq!(config.data_folder, PathBuf::from("/srv/nmon"));
    assert_eq!(config.host, "0.0.0.0");
    assert_eq!(config.port, 9100);
    assert_eq!(config.seed_dir, Some(PathBuf::from("/srv/nmon/seed")));
    assert_eq!(config.dedup_window_minutes, 30);
    assert_eq!(config.hotspot_default_top, 5);
    assert_eq!(config.log_level, "debug");
}

#[test]
fn test_partial_config_file_falls_through_to_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "port = 6000\n").unwrap();

    let config = ServerConfig::resolve(ConfigOverrides::default(), load_toml_config(&path).unwrap())
        .unwrap();

    assert_eq!(config.port, 6000);
    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.dedup_window_minutes, 60);
}

#[test]
fn test_malformed_config_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "port = \"not a number\"\n").unwrap();

    let result = load_toml_config(&path);
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_command_line_overrides_config_file() {
    let toml = TomlConfig {
        data_folder: Some(PathBuf::from("/from/toml")),
        dedup_window_minutes: Some(15),
        ..Default::default()
    };
    let overrides = ConfigOverrides {
        data_folder: Some(PathBuf::from("/from/cli")),
        log_level: Some("trace".to_string()),
        ..Default::default()
    };

    let config = ServerConfig::resolve(overrides, toml).unwrap();
    assert_eq!(config.data_folder, PathBuf::from("/from/cli"));
    assert_eq!(config.dedup_window_minutes, 15);
    assert_eq!(config.log_level, "trace");
}

#[test]
fn test_zero_hotspot_default_is_rejected() {
    let toml = TomlConfig {
        hotspot_default_top: Some(0),
        ..Default::default()
    };
    let result = ServerConfig::resolve(ConfigOverrides::default(), toml);
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_ensure_data_folder_creates_directory() {
    let temp_dir = TempDir::new().unwrap();
    let folder = temp_dir.path().join("nested").join("nmon");
    let overrides = ConfigOverrides {
        data_folder: Some(folder.clone()),
        ..Default::default()
    };
    let config = ServerConfig::resolve(overrides, TomlConfig::default()).unwrap();

    config.ensure_data_folder().unwrap();
    assert!(folder.is_dir());
    assert_eq!(config.database_path(), folder.join("nmon.db"));
}
