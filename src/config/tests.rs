//! Tests for config functionality.

use crate::config::Config;
use crate::locks::RetryPolicy;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.lock_max_attempts, 13);
    assert_eq!(config.lock_retry_delay_ms, 150);
    assert_eq!(config.lock_stale_minutes, 120);
    assert_eq!(config.retry_policy(), RetryPolicy::default());
}

#[test]
fn test_parse_minimal_yaml() {
    let config = Config::from_yaml("").unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_parse_partial_yaml() {
    let yaml = r#"
lock_max_attempts: 3
"#;
    let config = Config::from_yaml(yaml).unwrap();

    assert_eq!(config.lock_max_attempts, 3);
    assert_eq!(config.lock_retry_delay_ms, 150);
    assert_eq!(config.lock_stale_minutes, 120);
}

#[test]
fn test_parse_full_yaml() {
    let yaml = r#"
lock_max_attempts: 5
lock_retry_delay_ms: 20
lock_stale_minutes: 30
"#;
    let config = Config::from_yaml(yaml).unwrap();

    assert_eq!(
        config.retry_policy(),
        RetryPolicy::new(5, Duration::from_millis(20))
    );
    assert_eq!(config.lock_stale_minutes, 30);
}

#[test]
fn test_unknown_fields_are_ignored() {
    let yaml = r#"
lock_max_attempts: 2
future_option: true
"#;
    let config = Config::from_yaml(yaml).unwrap();
    assert_eq!(config.lock_max_attempts, 2);
}

#[test]
fn test_zero_attempts_is_rejected() {
    let err = Config::from_yaml("lock_max_attempts: 0").unwrap_err();
    assert!(err.to_string().contains("lock_max_attempts"));
}

#[test]
fn test_zero_stale_minutes_is_rejected() {
    let err = Config::from_yaml("lock_stale_minutes: 0").unwrap_err();
    assert!(err.to_string().contains("lock_stale_minutes"));
}

#[test]
fn test_invalid_yaml_is_rejected() {
    let err = Config::from_yaml("lock_max_attempts: [").unwrap_err();
    assert!(err.to_string().contains("failed to parse config YAML"));
}

#[test]
fn test_yaml_roundtrip() {
    let config = Config {
        lock_max_attempts: 7,
        lock_retry_delay_ms: 0,
        lock_stale_minutes: 5,
    };
    let yaml = config.to_yaml().unwrap();
    assert_eq!(Config::from_yaml(&yaml).unwrap(), config);
}

#[test]
fn test_load_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("treelock.yaml");
    std::fs::write(&path, "lock_retry_delay_ms: 10\n").unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.retry_delay(), Duration::from_millis(10));

    let err = Config::load(temp_dir.path().join("missing.yaml")).unwrap_err();
    assert!(err.to_string().contains("failed to read config file"));
}
