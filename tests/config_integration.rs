//! Integration tests for the ghtools-config crate.

use std::fs;
use tempfile::TempDir;
use ghtools_config::{Config, ConfigError, RateLimitConfig, RetryConfig};

#[tokio::test]
async fn config_load_from_json5_file() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("ghtools.json5");

    fs::write(
        &config_path,
        r#"
        {
            // Throttle early on a shared token
            rate_limit: {
                min_remaining: 500,
                reset_buffer_ms: 2500,
            },
            retry: {
                max_retries: 5,
                base_delay_ms: 250,
            },
            github_token: "ghp_test_token",
        }
        "#,
    )
    .unwrap();

    let config = Config::load_from(&config_path).unwrap();

    assert!(config.rate_limit.enabled);
    assert_eq!(config.rate_limit.min_remaining, 500);
    assert_eq!(config.rate_limit.reset_buffer_ms, 2500);
    assert_eq!(config.retry.max_retries, 5);
    assert_eq!(config.retry.base_delay_ms, 250);
    assert_eq!(config.retry.request_timeout_ms, 30_000);
    assert_eq!(config.github_token, Some("ghp_test_token".to_string()));
}

#[test]
fn config_load_from_plain_json_file() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.json");
    fs::write(
        &config_path,
        r#"{"rate_limit": {"enabled": false}, "retry": {"request_timeout_ms": 5000}}"#,
    )
    .unwrap();

    let config = Config::load_from(&config_path).unwrap();

    assert_eq!(
        config.rate_limit,
        RateLimitConfig {
            enabled: false,
            ..RateLimitConfig::default()
        }
    );
    assert_eq!(config.retry.request_timeout_ms, 5_000);
    assert_eq!(config.retry.max_retries, RetryConfig::default().max_retries);
    assert!(config.github_token.is_none());
}

#[tokio::test]
async fn config_load_nonexistent_fails() {
    let result = Config::load_from("/nonexistent/path/config.json");
    assert!(matches!(result, Err(ConfigError::ReadFile { .. })));
}

#[test]
fn config_load_rejects_invalid_values() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.json5");
    fs::write(&config_path, "{ retry: { max_retries: 50 } }").unwrap();

    let result = Config::load_from(&config_path);
    assert!(matches!(result, Err(ConfigError::InvalidRetry { .. })));
}

#[test]
fn config_load_rejects_malformed_json5() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.json5");
    fs::write(&config_path, "{ retry: ").unwrap();

    assert!(Config::load_from(&config_path).is_err());
}

#[test]
fn env_overrides_take_precedence_over_file() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.json5");
    fs::write(
        &config_path,
        "{ github_token: 'from_file', retry: { max_retries: 2 } }",
    )
    .unwrap();

    let mut config = Config::load_from(&config_path).unwrap();
    config
        .apply_env_overrides(|name| match name {
            "GITHUB_TOKEN" => Some("from_env".to_string()),
            "GHTOOLS_MAX_RETRIES" => Some("4".to_string()),
            _ => None,
        })
        .unwrap();

    assert_eq!(config.github_token.as_deref(), Some("from_env"));
    assert_eq!(config.retry.max_retries, 4);
}

#[test]
fn env_override_with_garbage_is_an_error() {
    let mut config = Config::default();
    let result = config.apply_env_overrides(|name| {
        (name == "GHTOOLS_MIN_REMAINING").then(|| "lots".to_string())
    });

    assert!(matches!(result, Err(ConfigError::InvalidEnvVar { .. })));
}

#[test]
fn config_github_token_not_serialized_when_none() {
    let config = Config {
        github_token: None,
        ..Default::default()
    };
    let json = serde_json::to_string(&config).unwrap();
    assert!(!json.contains("github_token"));
}

#[test]
fn durations_follow_millisecond_settings() {
    let retry = RetryConfig {
        max_retries: 3,
        base_delay_ms: 1500,
        request_timeout_ms: 10_000,
    };
    assert_eq!(retry.base_delay().as_millis(), 1500);
    assert_eq!(retry.request_timeout().as_secs(), 10);
    assert_eq!(RateLimitConfig::default().reset_buffer().as_millis(), 1000);
}
