//! Integration tests for configuration file resolution and loading
//!
//! Tests that touch `CALLSIGN_LOOKUP_CONFIG` are marked `#[serial]` so they
//! never race on the process environment.

use callsign_common::config::{
    resolve_config_path, ConfigSource, ServiceConfig, CONFIG_ENV_VAR,
};
use callsign_common::Error;
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
#[serial]
fn test_explicit_path_has_priority_over_env() {
    env::set_var(CONFIG_ENV_VAR, "/from/env.toml");

    let source = resolve_config_path(Some(PathBuf::from("/from/cli.toml").as_path()));
    assert_eq!(source, ConfigSource::Explicit(PathBuf::from("/from/cli.toml")));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_env_var_used_without_explicit_path() {
    env::set_var(CONFIG_ENV_VAR, "/from/env.toml");

    let source = resolve_config_path(None);
    assert_eq!(source, ConfigSource::Explicit(PathBuf::from("/from/env.toml")));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_load_reads_explicit_file() {
    env::remove_var(CONFIG_ENV_VAR);
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
        [server]
        bind = "0.0.0.0:9000"

        [database]
        path = "/var/lib/callsign/members.db"

        [import]
        writers = 8
        queue_capacity = 16

        [auth]
        user_header = "x-forwarded-user"
        login_url = "https://sso.example.org/login"
        "#,
    )
    .unwrap();

    let config = ServiceConfig::load(Some(&path)).unwrap();
    assert_eq!(config.server.bind.port(), 9000);
    assert_eq!(config.database.path, PathBuf::from("/var/lib/callsign/members.db"));
    assert_eq!(config.import.writers, 8);
    assert_eq!(config.import.queue_capacity, 16);
    assert_eq!(config.auth.user_header, "x-forwarded-user");
    assert_eq!(config.auth.login_url, "https://sso.example.org/login");
    assert!(!config.auth.disabled);
}

#[test]
#[serial]
fn test_missing_explicit_file_is_an_error() {
    env::remove_var(CONFIG_ENV_VAR);
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("missing.toml");

    let result = ServiceConfig::load(Some(&path));
    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
#[serial]
fn test_malformed_file_reports_path() {
    env::remove_var(CONFIG_ENV_VAR);
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("bad.toml");
    std::fs::write(&path, "[import]\nwriters = \"many\"\n").unwrap();

    match ServiceConfig::load(Some(&path)) {
        Err(Error::Config(msg)) => assert!(msg.contains("bad.toml"), "got: {}", msg),
        other => panic!("expected config error, got {:?}", other),
    }
}
