// ABOUTME: Sync checkpoint key/value storage
// ABOUTME: Holds the last fully-collected timestamp written by the sync state tracker
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{parse_timestamp, Database};
use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;

/// One stored checkpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCheckpoint {
    /// Checkpoint key
    pub key: String,
    /// Raw stored value
    pub value: String,
    /// When the value was last written
    pub updated_at: DateTime<Utc>,
}

impl Database {
    pub(super) async fn migrate_sync_metadata(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS sync_metadata (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create sync_metadata table: {e}")))?;

        Ok(())
    }

    /// Read a checkpoint by key
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the stored update time is invalid
    pub async fn get_checkpoint(&self, key: &str) -> AppResult<Option<SyncCheckpoint>> {
        let row = sqlx::query("SELECT key, value, updated_at FROM sync_metadata WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get checkpoint {key}: {e}")))?;

        row.map(|row| {
            let updated_at: String = row.get("updated_at");
            Ok(SyncCheckpoint {
                key: row.get("key"),
                value: row.get("value"),
                updated_at: parse_timestamp("sync_metadata.updated_at", &updated_at)?,
            })
        })
        .transpose()
    }

    /// Write a checkpoint, replacing any previous value
    ///
    /// # Errors
    ///
    /// Returns an error if the upsert fails
    pub async fn set_checkpoint(&self, key: &str, value: &str) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO sync_metadata (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            ",
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to set checkpoint {key}: {e}")))?;

        Ok(())
    }
}
