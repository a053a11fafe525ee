// ABOUTME: Collection ledger storage
// ABOUTME: Rows are opened as running and receive exactly one terminal update
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{parse_optional_timestamp, parse_timestamp, Database};
use crate::errors::{AppError, AppResult, DatabaseError};
use crate::models::{CollectionRun, CollectionType, RunStatus};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

impl Database {
    pub(super) async fn migrate_collection_log(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS collection_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                collection_type TEXT NOT NULL CHECK (collection_type IN ('sync', 'bulk')),
                start_time TEXT NOT NULL,
                end_time TEXT,
                status TEXT NOT NULL CHECK (status IN ('running', 'success', 'error')),
                records_collected INTEGER NOT NULL DEFAULT 0,
                error_message TEXT
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create collection_log table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_collection_log_type ON collection_log(collection_type, id)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create collection_log index: {e}")))?;

        Ok(())
    }

    /// Append a `running` ledger entry and return its id
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn open_collection_run(
        &self,
        collection_type: CollectionType,
        start_time: DateTime<Utc>,
    ) -> AppResult<i64> {
        let row = sqlx::query(
            r"
            INSERT INTO collection_log (collection_type, start_time, status, records_collected)
            VALUES (?1, ?2, ?3, 0)
            RETURNING id
            ",
        )
        .bind(collection_type.as_str())
        .bind(start_time.to_rfc3339())
        .bind(RunStatus::Running.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to open collection run: {e}")))?;

        Ok(row.get("id"))
    }

    /// Write the terminal update of a running ledger entry
    ///
    /// # Errors
    ///
    /// Returns `ResourceLocked` if the entry is already closed, `ResourceNotFound`
    /// if it does not exist, and `InvalidInput` if `status` is not terminal
    pub async fn close_collection_run(
        &self,
        run_id: i64,
        status: RunStatus,
        records_collected: i64,
        error_message: Option<&str>,
        end_time: DateTime<Utc>,
    ) -> AppResult<()> {
        if !status.is_terminal() {
            return Err(AppError::invalid_input(format!(
                "cannot close collection run {run_id} with status {status}"
            )));
        }

        let result = sqlx::query(
            r"
            UPDATE collection_log
            SET status = ?1, records_collected = ?2, error_message = ?3, end_time = ?4
            WHERE id = ?5 AND status = 'running'
            ",
        )
        .bind(status.as_str())
        .bind(records_collected)
        .bind(error_message)
        .bind(end_time.to_rfc3339())
        .bind(run_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to close collection run: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(match self.get_collection_run(run_id).await? {
                Some(_) => DatabaseError::AlreadyClosed { run_id }.into(),
                None => DatabaseError::NotFound {
                    entity: "collection run",
                    id: run_id.to_string(),
                }
                .into(),
            });
        }

        Ok(())
    }

    /// Ledger entry by id
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the stored row is invalid
    pub async fn get_collection_run(&self, run_id: i64) -> AppResult<Option<CollectionRun>> {
        let row = sqlx::query("SELECT * FROM collection_log WHERE id = ?1")
            .bind(run_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get collection run: {e}")))?;

        row.map(|row| row_to_run(&row)).transpose()
    }

    /// Most recent ledger entries, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored row is invalid
    pub async fn recent_collection_runs(&self, limit: u32) -> AppResult<Vec<CollectionRun>> {
        let rows = sqlx::query("SELECT * FROM collection_log ORDER BY id DESC LIMIT ?1")
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list collection runs: {e}")))?;

        rows.iter().map(row_to_run).collect()
    }

    /// Newest ledger entry, optionally restricted to one collection type
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the stored row is invalid
    pub async fn last_collection_run(
        &self,
        collection_type: Option<CollectionType>,
    ) -> AppResult<Option<CollectionRun>> {
        let row = match collection_type {
            Some(collection_type) => {
                sqlx::query(
                    "SELECT * FROM collection_log WHERE collection_type = ?1 ORDER BY id DESC LIMIT 1",
                )
                .bind(collection_type.as_str())
                .fetch_optional(&self.pool)
                .await
            }
            None => {
                sqlx::query("SELECT * FROM collection_log ORDER BY id DESC LIMIT 1")
                    .fetch_optional(&self.pool)
                    .await
            }
        }
        .map_err(|e| AppError::database(format!("Failed to get last collection run: {e}")))?;

        row.map(|row| row_to_run(&row)).transpose()
    }
}

fn row_to_run(row: &SqliteRow) -> AppResult<CollectionRun> {
    let collection_type: String = row.get("collection_type");
    let status: String = row.get("status");
    let start_time: String = row.get("start_time");

    Ok(CollectionRun {
        id: row.get("id"),
        collection_type: collection_type.parse()?,
        start_time: parse_timestamp("collection_log.start_time", &start_time)?,
        end_time: parse_optional_timestamp("collection_log.end_time", row.get("end_time"))?,
        status: status.parse()?,
        records_collected: row.get("records_collected"),
        error_message: row.get("error_message"),
    })
}
