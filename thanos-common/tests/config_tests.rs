//! Config file resolution and graceful degradation
//!
//! Uses serial_test: tests touching THANOS_CONFIG run sequentially so they do
//! not race on the process environment.

use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::PathBuf;
use thanos_common::config::{BrightnessMode, ConfigFileResolver, TomlConfig, CONFIG_ENV_VAR};
use thanos_common::Error;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
#[serial]
fn test_cli_path_beats_env_var() {
    let cli_file = write_config("[http]\nport = 8080\n");
    let env_file = write_config("[http]\nport = 9090\n");
    env::set_var(CONFIG_ENV_VAR, env_file.path());

    let resolver = ConfigFileResolver::new(Some(cli_file.path().to_path_buf()));
    assert_eq!(resolver.resolve(), Some(cli_file.path().to_path_buf()));
    assert_eq!(resolver.load().unwrap().http.port, 8080);

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_env_var_used_without_cli_path() {
    let env_file = write_config(
        r#"
        [controller]
        brightness_step = 50
        brightness_mode = "cadence"
        "#,
    );
    env::set_var(CONFIG_ENV_VAR, env_file.path());

    let config = ConfigFileResolver::new(None).load().unwrap();
    assert_eq!(config.controller.brightness_step, 50);
    assert_eq!(config.controller.brightness_mode, BrightnessMode::Cadence);

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_missing_explicit_file_falls_back_to_defaults() {
    env::remove_var(CONFIG_ENV_VAR);
    let dir = tempfile::tempdir().unwrap();
    let missing: PathBuf = dir.path().join("does-not-exist.toml");

    let config = ConfigFileResolver::new(Some(missing)).load().unwrap();
    assert_eq!(config, TomlConfig::default());
}

#[test]
#[serial]
fn test_malformed_file_is_an_error() {
    env::remove_var(CONFIG_ENV_VAR);
    let file = write_config("[mqtt\nport = \"not a port\"");

    let result = ConfigFileResolver::new(Some(file.path().to_path_buf())).load();
    assert!(matches!(result, Err(Error::TomlParse(_))));
}

#[test]
#[serial]
fn test_invalid_values_fail_validation() {
    env::remove_var(CONFIG_ENV_VAR);
    let file = write_config("[controller]\nhistory_capacity = 0\n");

    let result = ConfigFileResolver::new(Some(file.path().to_path_buf())).load();
    assert!(matches!(result, Err(Error::Config(_))));
}
