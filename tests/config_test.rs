// ABOUTME: Integration tests for environment configuration parsing and validation
// ABOUTME: Tests run serially because they mutate process environment variables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use serial_test::serial;
use std::env;
use std::time::Duration;
use wellness_sync::config::SyncConfig;
use wellness_sync::constants::{defaults, env_keys};
use wellness_sync::errors::ErrorCode;

const ALL_KEYS: [&str; 15] = [
    env_keys::DATABASE_URL,
    env_keys::SYNC_INTERVAL_SECS,
    env_keys::RATE_LIMIT_DELAY_MS,
    env_keys::DOWNLOAD_RATE_LIMIT_DELAY_MS,
    env_keys::CALL_TIMEOUT_SECS,
    env_keys::BOOTSTRAP_DAYS,
    env_keys::BULK_DAYS_BACK,
    env_keys::COLLECT_ACTIVITY_FILES,
    env_keys::GARMIN_API_BASE_URL,
    env_keys::GARMIN_TOKEN_URL,
    env_keys::GARMIN_ACCESS_TOKEN,
    env_keys::GARMIN_REFRESH_TOKEN,
    env_keys::GARMIN_CLIENT_ID,
    env_keys::GARMIN_CLIENT_SECRET,
    env_keys::GARMIN_TOKEN_EXPIRES_AT,
];

fn clear_env() {
    for key in ALL_KEYS {
        env::remove_var(key);
    }
}

#[test]
#[serial]
fn test_defaults_without_environment() {
    clear_env();

    let config = SyncConfig::from_env().unwrap();

    assert_eq!(config.database_url, defaults::DATABASE_URL);
    assert_eq!(
        config.sync_interval,
        Duration::from_secs(defaults::SYNC_INTERVAL_SECS)
    );
    assert_eq!(
        config.rate_limit.json_delay,
        Duration::from_millis(defaults::RATE_LIMIT_DELAY_MS)
    );
    assert_eq!(
        config.rate_limit.download_delay,
        Duration::from_millis(defaults::DOWNLOAD_RATE_LIMIT_DELAY_MS)
    );
    assert_eq!(config.bootstrap_days, defaults::BOOTSTRAP_DAYS);
    assert_eq!(config.bulk_days_back, defaults::BULK_DAYS_BACK);
    assert!(!config.collect_activity_files);
    assert!(config.credentials.is_none());
    assert!(config.summary().contains("Session: Missing"));
}

#[test]
#[serial]
fn test_environment_overrides() {
    clear_env();
    env::set_var(env_keys::DATABASE_URL, "sqlite:/tmp/wellness.db");
    env::set_var(env_keys::SYNC_INTERVAL_SECS, "60");
    env::set_var(env_keys::RATE_LIMIT_DELAY_MS, " 250 ");
    env::set_var(env_keys::DOWNLOAD_RATE_LIMIT_DELAY_MS, "2000");
    env::set_var(env_keys::BOOTSTRAP_DAYS, "14");
    env::set_var(env_keys::BULK_DAYS_BACK, "90");
    env::set_var(env_keys::COLLECT_ACTIVITY_FILES, "Yes");
    env::set_var(env_keys::GARMIN_API_BASE_URL, "http://localhost:9000");

    let config = SyncConfig::from_env().unwrap();
    clear_env();

    assert_eq!(config.database_url, "sqlite:/tmp/wellness.db");
    assert_eq!(config.sync_interval, Duration::from_secs(60));
    assert_eq!(config.rate_limit.json_delay, Duration::from_millis(250));
    assert_eq!(config.rate_limit.download_delay, Duration::from_secs(2));
    assert_eq!(config.bootstrap_days, 14);
    assert_eq!(config.bulk_days_back, 90);
    assert!(config.collect_activity_files);
    assert_eq!(config.garmin.api_base_url, "http://localhost:9000");
    assert_eq!(config.garmin.token_url, defaults::GARMIN_TOKEN_URL);
}

#[test]
#[serial]
fn test_session_material_from_environment() {
    clear_env();
    env::set_var(env_keys::GARMIN_ACCESS_TOKEN, "access-abc");
    env::set_var(env_keys::GARMIN_TOKEN_EXPIRES_AT, "2024-03-11T06:00:00Z");

    let config = SyncConfig::from_env().unwrap();
    clear_env();

    let credentials = config.credentials.unwrap();
    assert_eq!(credentials.access_token.as_deref(), Some("access-abc"));
    assert!(credentials.refresh_token.is_none());
    assert!(credentials.expires_at.is_some());
}

#[test]
#[serial]
fn test_unparsable_values_are_rejected() {
    clear_env();
    env::set_var(env_keys::SYNC_INTERVAL_SECS, "five minutes");
    let err = SyncConfig::from_env().unwrap_err();
    assert_eq!(err.code, ErrorCode::ConfigError);
    assert!(err.message.contains(env_keys::SYNC_INTERVAL_SECS));

    clear_env();
    env::set_var(env_keys::COLLECT_ACTIVITY_FILES, "sometimes");
    assert!(SyncConfig::from_env().is_err());

    clear_env();
    env::set_var(env_keys::GARMIN_REFRESH_TOKEN, "refresh");
    env::set_var(env_keys::GARMIN_TOKEN_EXPIRES_AT, "tomorrow");
    assert!(SyncConfig::from_env().is_err());
    clear_env();
}

#[test]
#[serial]
fn test_zero_windows_and_intervals_are_rejected() {
    for key in [
        env_keys::SYNC_INTERVAL_SECS,
        env_keys::CALL_TIMEOUT_SECS,
        env_keys::BOOTSTRAP_DAYS,
        env_keys::BULK_DAYS_BACK,
    ] {
        clear_env();
        env::set_var(key, "0");
        let err = SyncConfig::from_env().unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigError, "{key}");
        assert!(err.message.contains(key));
    }
    clear_env();
}

#[test]
#[serial]
fn test_zero_rate_limit_delay_is_allowed() {
    clear_env();
    env::set_var(env_keys::RATE_LIMIT_DELAY_MS, "0");

    let config = SyncConfig::from_env().unwrap();
    clear_env();

    assert!(config.rate_limit.json_delay.is_zero());
}

#[test]
fn test_validate_rejects_blank_database_url() {
    let config = SyncConfig {
        database_url: "  ".to_owned(),
        ..SyncConfig::default()
    };

    let err = config.validate().unwrap_err();
    assert!(err.message.contains(env_keys::DATABASE_URL));
}
