// ABOUTME: Environment-based configuration for the sync service
// ABOUTME: Reads intervals, rate limits, windows, remote endpoints and session material with validation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};
use wellness_providers::{GarminConfig, OAuth2Credentials, RateLimitPolicy};

use crate::constants::{defaults, env_keys};
use crate::errors::{AppError, AppResult};

/// Complete runtime configuration
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// SQLite connection URL
    pub database_url: String,
    /// Sleep between continuous sync cycles
    pub sync_interval: Duration,
    /// Per call class rate-limit delays
    pub rate_limit: RateLimitPolicy,
    /// Per remote call timeout
    pub call_timeout: Duration,
    /// First-run window in days
    pub bootstrap_days: u32,
    /// Default bulk collection window in days
    pub bulk_days_back: u32,
    /// Whether the activity file extractor runs
    pub collect_activity_files: bool,
    /// Remote endpoints
    pub garmin: GarminConfig,
    /// Session material from the login flow, if any
    pub credentials: Option<OAuth2Credentials>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            database_url: defaults::DATABASE_URL.to_owned(),
            sync_interval: Duration::from_secs(defaults::SYNC_INTERVAL_SECS),
            rate_limit: RateLimitPolicy::default(),
            call_timeout: Duration::from_secs(defaults::CALL_TIMEOUT_SECS),
            bootstrap_days: defaults::BOOTSTRAP_DAYS,
            bulk_days_back: defaults::BULK_DAYS_BACK,
            collect_activity_files: false,
            garmin: GarminConfig::default(),
            credentials: None,
        }
    }
}

impl SyncConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns a configuration error when a value does not parse or a
    /// duration or window is zero
    pub fn from_env() -> AppResult<Self> {
        info!("Loading configuration from environment variables");

        let sync_interval_secs: u64 =
            parse_env(env_keys::SYNC_INTERVAL_SECS, defaults::SYNC_INTERVAL_SECS)?;
        let json_delay_ms: u64 =
            parse_env(env_keys::RATE_LIMIT_DELAY_MS, defaults::RATE_LIMIT_DELAY_MS)?;
        let download_delay_ms: u64 = parse_env(
            env_keys::DOWNLOAD_RATE_LIMIT_DELAY_MS,
            defaults::DOWNLOAD_RATE_LIMIT_DELAY_MS,
        )?;
        let call_timeout_secs: u64 =
            parse_env(env_keys::CALL_TIMEOUT_SECS, defaults::CALL_TIMEOUT_SECS)?;

        let config = Self {
            database_url: env_var_or(env_keys::DATABASE_URL, defaults::DATABASE_URL),
            sync_interval: Duration::from_secs(sync_interval_secs),
            rate_limit: RateLimitPolicy::new(
                Duration::from_millis(json_delay_ms),
                Duration::from_millis(download_delay_ms),
            ),
            call_timeout: Duration::from_secs(call_timeout_secs),
            bootstrap_days: parse_env(env_keys::BOOTSTRAP_DAYS, defaults::BOOTSTRAP_DAYS)?,
            bulk_days_back: parse_env(env_keys::BULK_DAYS_BACK, defaults::BULK_DAYS_BACK)?,
            collect_activity_files: parse_flag(env_keys::COLLECT_ACTIVITY_FILES)?,
            garmin: GarminConfig {
                api_base_url: env_var_or(
                    env_keys::GARMIN_API_BASE_URL,
                    defaults::GARMIN_API_BASE_URL,
                ),
                token_url: env_var_or(env_keys::GARMIN_TOKEN_URL, defaults::GARMIN_TOKEN_URL),
            },
            credentials: credentials_from_env()?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject zero intervals and empty windows
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the offending setting
    pub fn validate(&self) -> AppResult<()> {
        if self.sync_interval.is_zero() {
            return Err(AppError::config(format!(
                "{} must be greater than zero",
                env_keys::SYNC_INTERVAL_SECS
            )));
        }
        if self.call_timeout.is_zero() {
            return Err(AppError::config(format!(
                "{} must be greater than zero",
                env_keys::CALL_TIMEOUT_SECS
            )));
        }
        if self.bootstrap_days == 0 {
            return Err(AppError::config(format!(
                "{} must be at least 1",
                env_keys::BOOTSTRAP_DAYS
            )));
        }
        if self.bulk_days_back == 0 {
            return Err(AppError::config(format!(
                "{} must be at least 1",
                env_keys::BULK_DAYS_BACK
            )));
        }
        if self.database_url.trim().is_empty() {
            return Err(AppError::config(format!(
                "{} must not be empty",
                env_keys::DATABASE_URL
            )));
        }
        if self.credentials.is_none() {
            warn!("No Garmin session material configured; remote calls will fail");
        }
        Ok(())
    }

    /// Log-safe configuration summary
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Wellness Sync Configuration:\n\
             - Database: {}\n\
             - Sync Interval: {}s\n\
             - Rate Limit: {}ms json / {}ms download\n\
             - Call Timeout: {}s\n\
             - Bootstrap Window: {} days\n\
             - Bulk Window: {} days\n\
             - Activity Files: {}\n\
             - Garmin API: {}\n\
             - Session: {}",
            self.database_url,
            self.sync_interval.as_secs(),
            self.rate_limit.json_delay.as_millis(),
            self.rate_limit.download_delay.as_millis(),
            self.call_timeout.as_secs(),
            self.bootstrap_days,
            self.bulk_days_back,
            if self.collect_activity_files {
                "Enabled"
            } else {
                "Disabled"
            },
            self.garmin.api_base_url,
            if self.credentials.is_some() {
                "Configured"
            } else {
                "Missing"
            },
        )
    }
}

fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn parse_env<T>(key: &str, default: T) -> AppResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::config(format!("Invalid {key} value '{raw}': {e}"))),
        Err(_) => Ok(default),
    }
}

fn parse_flag(key: &str) -> AppResult<bool> {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            _ => Err(AppError::config(format!("Invalid {key} value '{raw}'"))),
        },
        Err(_) => Ok(false),
    }
}

fn credentials_from_env() -> AppResult<Option<OAuth2Credentials>> {
    let access_token = env::var(env_keys::GARMIN_ACCESS_TOKEN).ok();
    let refresh_token = env::var(env_keys::GARMIN_REFRESH_TOKEN).ok();
    if access_token.is_none() && refresh_token.is_none() {
        return Ok(None);
    }

    let expires_at = match env::var(env_keys::GARMIN_TOKEN_EXPIRES_AT) {
        Ok(raw) => Some(
            DateTime::parse_from_rfc3339(raw.trim())
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| {
                    AppError::config(format!(
                        "Invalid {} value '{raw}': {e}",
                        env_keys::GARMIN_TOKEN_EXPIRES_AT
                    ))
                })?,
        ),
        Err(_) => None,
    };

    Ok(Some(OAuth2Credentials {
        client_id: env_var_or(env_keys::GARMIN_CLIENT_ID, ""),
        client_secret: env_var_or(env_keys::GARMIN_CLIENT_SECRET, ""),
        access_token,
        refresh_token,
        expires_at,
    }))
}
