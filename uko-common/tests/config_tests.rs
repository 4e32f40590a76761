//! Unit tests for configuration resolution
//!
//! Covers:
//! - Base URL priority: command line → environment → TOML → build default
//! - TOML loading and graceful handling of bad files
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate UKO_API_URL are marked with #[serial]
//! to ensure they run sequentially, not in parallel.

use serial_test::serial;
use std::env;
use std::io::Write;
use uko_common::config::{
    load_toml_config, resolve_api_base, BuildMode, ClientConfig, TomlConfig, API_URL_ENV,
};
use uko_common::Error;

fn toml_with_url(url: &str) -> TomlConfig {
    TomlConfig {
        api_url: Some(url.to_string()),
        ..Default::default()
    }
}

#[test]
#[serial]
fn test_cli_overrides_env_and_toml() {
    env::set_var(API_URL_ENV, "http://env.test/api");

    let base = resolve_api_base(
        Some("http://cli.test/api"),
        &toml_with_url("http://toml.test/api"),
        BuildMode::Production,
    );
    assert_eq!(base, "http://cli.test/api");

    env::remove_var(API_URL_ENV);
}

#[test]
#[serial]
fn test_env_overrides_toml() {
    env::set_var(API_URL_ENV, "http://env.test/api/");

    let base = resolve_api_base(None, &toml_with_url("http://toml.test/api"), BuildMode::Production);
    assert_eq!(base, "http://env.test/api");

    env::remove_var(API_URL_ENV);
}

#[test]
#[serial]
fn test_blank_env_is_skipped() {
    env::set_var(API_URL_ENV, "   ");

    let base = resolve_api_base(None, &toml_with_url("http://toml.test/api"), BuildMode::Production);
    assert_eq!(base, "http://toml.test/api");

    env::remove_var(API_URL_ENV);
}

#[test]
#[serial]
fn test_build_default_per_mode() {
    env::remove_var(API_URL_ENV);

    let production = resolve_api_base(None, &TomlConfig::default(), BuildMode::Production);
    assert_eq!(production, "https://uko-single-predictor.onrender.com/api");

    let development = resolve_api_base(None, &TomlConfig::default(), BuildMode::Development);
    assert_eq!(development, "http://localhost:5173/api");
}

#[test]
#[serial]
fn test_load_explicit_toml_file() {
    env::remove_var(API_URL_ENV);

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
api_url = "http://toml.test/api"
request_timeout_secs = 5
share_command = ["wl-share", "--text"]
share_url = "https://ukosinglepredictor.netlify.app"

[logging]
level = "debug"
"#
    )
    .unwrap();

    let toml_config = load_toml_config(Some(file.path())).unwrap();
    assert_eq!(toml_config.logging.level, "debug");

    let config = ClientConfig::resolve(None, &toml_config, BuildMode::Development);
    assert_eq!(config.api_base, "http://toml.test/api");
    assert_eq!(config.request_timeout.as_secs(), 5);
    assert_eq!(
        config.share_command,
        Some(vec!["wl-share".to_string(), "--text".to_string()])
    );
    assert_eq!(
        config.share_url.as_deref(),
        Some("https://ukosinglepredictor.netlify.app")
    );
}

#[test]
fn test_missing_explicit_file_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");

    let err = load_toml_config(Some(&missing)).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn test_malformed_file_is_config_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "api_url = [unterminated").unwrap();

    let err = load_toml_config(Some(file.path())).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn test_empty_share_command_is_dropped() {
    let toml_config = TomlConfig {
        share_command: Some(Vec::new()),
        ..Default::default()
    };
    let config = ClientConfig::resolve(Some("http://cli.test/api"), &toml_config, BuildMode::Production);
    assert!(config.share_command.is_none());
}
