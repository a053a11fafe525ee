// ABOUTME: Application constants for checkpoints, configuration defaults, and environment keys
// ABOUTME: Pure data constants shared by the providers crate and the sync service
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Sync checkpoint keys stored in `sync_metadata`
pub mod checkpoint {
    /// Timestamp through which remote data is fully collected
    pub const LAST_SYNC_TIME: &str = "last_sync_time";
}

/// Local identity defaults
pub mod identity {
    /// Local user id used when the remote profile cannot be resolved
    pub const DEFAULT_USER_ID: i64 = 1;
}

/// Default configuration values
pub mod defaults {
    /// Default SQLite database location
    pub const DATABASE_URL: &str = "sqlite:./data/garmin.db";
    /// Seconds slept between continuous sync cycles
    pub const SYNC_INTERVAL_SECS: u64 = 300;
    /// Minimum gap before a JSON endpoint call
    pub const RATE_LIMIT_DELAY_MS: u64 = 1_000;
    /// Minimum gap before a binary file download
    pub const DOWNLOAD_RATE_LIMIT_DELAY_MS: u64 = 5_000;
    /// Per remote call timeout
    pub const CALL_TIMEOUT_SECS: u64 = 30;
    /// Days collected on the first run when no checkpoint exists
    pub const BOOTSTRAP_DAYS: u32 = 7;
    /// Days collected by a bulk run when the caller does not say otherwise
    pub const BULK_DAYS_BACK: u32 = 7;
    /// Garmin Connect API base URL
    pub const GARMIN_API_BASE_URL: &str = "https://connectapi.garmin.com";
    /// Garmin OAuth2 token exchange endpoint
    pub const GARMIN_TOKEN_URL: &str =
        "https://connectapi.garmin.com/oauth-service/oauth/exchange/user/2.0";
}

/// Environment variable names
pub mod env_keys {
    /// Database connection URL
    pub const DATABASE_URL: &str = "DATABASE_URL";
    /// Continuous sync interval in seconds
    pub const SYNC_INTERVAL_SECS: &str = "SYNC_INTERVAL_SECS";
    /// JSON call rate-limit delay in milliseconds
    pub const RATE_LIMIT_DELAY_MS: &str = "RATE_LIMIT_DELAY_MS";
    /// File download rate-limit delay in milliseconds
    pub const DOWNLOAD_RATE_LIMIT_DELAY_MS: &str = "DOWNLOAD_RATE_LIMIT_DELAY_MS";
    /// Per-call timeout in seconds
    pub const CALL_TIMEOUT_SECS: &str = "CALL_TIMEOUT_SECS";
    /// Bootstrap window in days
    pub const BOOTSTRAP_DAYS: &str = "BOOTSTRAP_DAYS";
    /// Bulk collection default window in days
    pub const BULK_DAYS_BACK: &str = "BULK_DAYS_BACK";
    /// Enables the activity file extractor
    pub const COLLECT_ACTIVITY_FILES: &str = "COLLECT_ACTIVITY_FILES";
    /// Remote API base URL
    pub const GARMIN_API_BASE_URL: &str = "GARMIN_API_BASE_URL";
    /// Remote OAuth token URL
    pub const GARMIN_TOKEN_URL: &str = "GARMIN_TOKEN_URL";
    /// Current access token
    pub const GARMIN_ACCESS_TOKEN: &str = "GARMIN_ACCESS_TOKEN";
    /// Refresh token
    pub const GARMIN_REFRESH_TOKEN: &str = "GARMIN_REFRESH_TOKEN";
    /// OAuth client id
    pub const GARMIN_CLIENT_ID: &str = "GARMIN_CLIENT_ID";
    /// OAuth client secret
    pub const GARMIN_CLIENT_SECRET: &str = "GARMIN_CLIENT_SECRET";
    /// Access token expiry (RFC3339)
    pub const GARMIN_TOKEN_EXPIRES_AT: &str = "GARMIN_TOKEN_EXPIRES_AT";
}

/// Provider identifiers
pub mod providers {
    /// Garmin Connect
    pub const GARMIN: &str = "garmin";
}
