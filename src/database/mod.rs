// ABOUTME: SQLite persistence layer with natural-key upserts for every collected entity
// ABOUTME: Owns the connection pool, schema migrations and record dispatch by entity kind
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Database Management
//!
//! One `impl Database` block per table. Every write is keyed by the entity's
//! natural key, so re-collecting a window is always safe:
//!
//! - `daily_metrics`, `sleep_data`, `activities`: sparse upsert, omitted
//!   attributes keep their stored value
//! - `body_composition`, `intraday_samples`, `activity_files`: insert if absent,
//!   re-deliveries are dropped
//!
//! Timestamps are stored as RFC3339 text, calendar dates as `YYYY-MM-DD`.

mod activities;
mod body_composition;
mod collection_log;
mod daily_metrics;
mod intraday;
mod profiles;
mod sleep;
mod sync_metadata;

pub use sync_metadata::SyncCheckpoint;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};
use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

use crate::errors::{AppError, AppResult, DatabaseError};
use crate::models::NormalizedRecord;

/// Connections kept open against a file-backed store
const FILE_POOL_CONNECTIONS: u32 = 4;

/// Database manager for collected wellness data
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Open (creating if needed) the store at `database_url` and run migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened or the schema cannot be created
    pub async fn new(database_url: &str) -> AppResult<Self> {
        let in_memory = database_url.contains(":memory:");

        let pool = if in_memory {
            // A single connection that never recycles keeps the in-memory store alive
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect(database_url)
                .await
        } else {
            ensure_parent_dir(database_url).await?;
            let connection_options =
                if database_url.starts_with("sqlite:") && !database_url.contains('?') {
                    format!("{database_url}?mode=rwc")
                } else {
                    database_url.to_owned()
                };
            SqlitePoolOptions::new()
                .max_connections(FILE_POOL_CONNECTIONS)
                .connect(&connection_options)
                .await
        }
        .map_err(|e| {
            AppError::from(DatabaseError::ConnectionFailed {
                context: format!("{database_url}: {e}"),
            })
        })?;

        let db = Self { pool };
        db.migrate().await?;

        info!(database_url, "Database ready");
        Ok(db)
    }

    /// Get a reference to the database pool
    #[must_use]
    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Create all tables and indexes
    ///
    /// # Errors
    ///
    /// Returns an error if any statement fails
    pub async fn migrate(&self) -> AppResult<()> {
        self.migrate_profiles().await?;
        self.migrate_daily_metrics().await?;
        self.migrate_activities().await?;
        self.migrate_sleep().await?;
        self.migrate_body_composition().await?;
        self.migrate_intraday().await?;
        self.migrate_sync_metadata().await?;
        self.migrate_collection_log().await?;
        debug!("Database migrations complete");
        Ok(())
    }

    /// Persist one normalized record under its entity's natural-key rule
    ///
    /// Returns the number of rows inserted or updated, which is zero when an
    /// insert-if-absent record was already present.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails
    pub async fn store_record(&self, record: &NormalizedRecord) -> AppResult<u64> {
        match record {
            NormalizedRecord::Daily(daily) => self.upsert_daily_metrics(daily).await,
            NormalizedRecord::Activity(activity) => self.upsert_activity(activity).await,
            NormalizedRecord::Sleep(sleep) => self.upsert_sleep(sleep).await,
            NormalizedRecord::BodyComposition(weigh_in) => {
                self.insert_body_composition(weigh_in).await
            }
            NormalizedRecord::Intraday(sample) => self.insert_intraday_sample(sample).await,
            NormalizedRecord::ActivityFile(file) => self.insert_activity_file(file).await,
        }
    }
}

async fn ensure_parent_dir(database_url: &str) -> AppResult<()> {
    let path = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url);
    let path = path.split('?').next().unwrap_or(path);

    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::from(DatabaseError::ConnectionFailed {
                    context: format!("cannot create {}: {e}", parent.display()),
                })
            })?;
        }
    }
    Ok(())
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub(crate) fn parse_date(field: &str, value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| {
        AppError::from(DatabaseError::InvalidData {
            field: field.to_owned(),
            reason: format!("'{value}': {e}"),
        })
    })
}

pub(crate) fn parse_timestamp(field: &str, value: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            AppError::from(DatabaseError::InvalidData {
                field: field.to_owned(),
                reason: format!("'{value}': {e}"),
            })
        })
}

pub(crate) fn parse_optional_timestamp(
    field: &str,
    value: Option<String>,
) -> AppResult<Option<DateTime<Utc>>> {
    value.map(|raw| parse_timestamp(field, &raw)).transpose()
}
