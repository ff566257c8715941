use inn_check::config::AppConfig;
use inn_check::error::Error;
use serial_test::serial;
use std::env;
use std::fs;

// Helper to clear environment variables that might interfere with tests
fn clear_env_vars() {
    unsafe {
        env::remove_var("INN__SERVER__PORT");
        env::remove_var("INN__LIST__CAPACITY");
        env::remove_var("CONFIG_FILE");
        env::remove_var("PORT");
        env::remove_var("VALIDATOR_URL");
        env::remove_var("TOKEN_REQUIRED");
    }
}

#[test]
#[serial]
fn test_default_config() {
    clear_env_vars();

    let config = AppConfig::load().expect("defaults should load");
    assert_eq!(config.server.port, 3000);
    assert_eq!(config.list.capacity, 10);
    assert!(!config.security.token_required);
}

#[test]
#[serial]
fn test_env_override() {
    clear_env_vars();
    unsafe {
        env::set_var("INN__SERVER__PORT", "9090");
        env::set_var("INN__LIST__CAPACITY", "3");
    }

    let config = AppConfig::load().expect("Failed to load config");
    assert_eq!(config.server.port, 9090);
    assert_eq!(config.list.capacity, 3);

    clear_env_vars();
}

#[test]
#[serial]
fn test_file_load() {
    clear_env_vars();

    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("inn.yaml");
    fs::write(
        &file_path,
        r#"
server:
  port: 7070
validator:
  url: "http://validator.local/check"
    "#,
    )
    .expect("Failed to write temp config");

    unsafe {
        env::set_var("CONFIG_FILE", &file_path);
    }

    let config = AppConfig::load().expect("Failed to load config from file");
    assert_eq!(config.server.port, 7070);
    assert_eq!(config.validator.url, "http://validator.local/check");

    clear_env_vars();
}

#[test]
#[serial]
fn test_cli_flags_win() {
    clear_env_vars();
    unsafe {
        env::set_var("INN__SERVER__PORT", "9090");
    }

    let config = AppConfig::load_from_args([
        "inn-check",
        "--port",
        "8181",
        "--capacity",
        "4",
        "--validator-url",
        "http://127.0.0.1:9999/check",
    ])
    .expect("Failed to load config");

    assert_eq!(config.server.port, 8181);
    assert_eq!(config.list.capacity, 4);
    assert_eq!(config.validator.url, "http://127.0.0.1:9999/check");

    clear_env_vars();
}

#[test]
#[serial]
fn test_zero_capacity_rejected() {
    clear_env_vars();

    let result = AppConfig::load_from_args(["inn-check", "--capacity", "0"]);
    assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("list.capacity")));
}

#[test]
#[serial]
fn test_token_required_needs_secret() {
    clear_env_vars();

    let result = AppConfig::load_from_args(["inn-check", "--token-required", "true"]);
    assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("jwt_secret")));
}

#[test]
#[serial]
fn test_missing_config_file_is_config_error() {
    clear_env_vars();

    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.yaml");

    let result = AppConfig::load_from_args(["inn-check", "--config", missing.to_str().unwrap()]);
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_unknown_flag_is_config_error() {
    clear_env_vars();

    let result = AppConfig::load_from_args(["inn-check", "--no-such-flag"]);
    assert!(matches!(result, Err(Error::Config(_))));
}
