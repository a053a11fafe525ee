// ABOUTME: Intraday sample database operations
// ABOUTME: One row per (user_id, timestamp, metric); duplicates are treated as re-deliveries and dropped
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{IntradayMetric, IntradaySample};
use chrono::{DateTime, Utc};
use sqlx::Row;

impl Database {
    pub(super) async fn migrate_intraday(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS intraday_samples (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                timestamp TEXT NOT NULL,
                metric TEXT NOT NULL,
                value REAL NOT NULL,
                UNIQUE (user_id, timestamp, metric)
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::database(format!("Failed to create intraday_samples table: {e}"))
        })?;

        Ok(())
    }

    /// Store a sample unless one already exists at the same instant
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn insert_intraday_sample(&self, sample: &IntradaySample) -> AppResult<u64> {
        let result = sqlx::query(
            r"
            INSERT INTO intraday_samples (user_id, timestamp, metric, value)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(user_id, timestamp, metric) DO NOTHING
            ",
        )
        .bind(sample.user_id)
        .bind(sample.timestamp.to_rfc3339())
        .bind(sample.metric.as_str())
        .bind(sample.value)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to insert intraday sample: {e}")))?;

        Ok(result.rows_affected())
    }

    /// Number of stored samples of one metric in `[from, to)`
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn count_intraday_samples(
        &self,
        user_id: i64,
        metric: IntradayMetric,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<i64> {
        let row = sqlx::query(
            r"
            SELECT COUNT(*) AS total FROM intraday_samples
            WHERE user_id = ?1 AND metric = ?2 AND timestamp >= ?3 AND timestamp < ?4
            ",
        )
        .bind(user_id)
        .bind(metric.as_str())
        .bind(from.to_rfc3339())
        .bind(to.to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to count intraday samples: {e}")))?;

        Ok(row.get("total"))
    }
}
