// ABOUTME: Append-only collection ledger recording every orchestration run and its outcome
// ABOUTME: Thin typed facade over the collection_log table with open/close and status queries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Collection Ledger
//!
//! Every orchestration run opens exactly one entry in `running` state and closes it
//! exactly once with `success` or `error`. Entries are never deleted, and a closed
//! entry rejects further updates with `ResourceLocked`.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::database::Database;
use crate::errors::AppResult;
use crate::models::{CollectionRun, CollectionType, RunStatus};

/// Audit log of collection runs
#[derive(Clone)]
pub struct CollectionLedger {
    database: Database,
}

impl CollectionLedger {
    /// Create a ledger over `database`
    #[must_use]
    pub const fn new(database: Database) -> Self {
        Self { database }
    }

    /// Open a `running` entry and return its id
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be written
    pub async fn open(
        &self,
        collection_type: CollectionType,
        start_time: DateTime<Utc>,
    ) -> AppResult<i64> {
        let run_id = self
            .database
            .open_collection_run(collection_type, start_time)
            .await?;
        debug!(run_id, collection_type = %collection_type, "Opened collection run");
        Ok(run_id)
    }

    /// Write the single terminal update of a run
    ///
    /// # Errors
    ///
    /// Returns `ResourceLocked` if the run was already closed, `ResourceNotFound`
    /// for an unknown id, and `InvalidInput` for a non-terminal status
    pub async fn close(
        &self,
        run_id: i64,
        status: RunStatus,
        records_collected: u64,
        error_message: Option<&str>,
    ) -> AppResult<()> {
        let records = i64::try_from(records_collected).unwrap_or(i64::MAX);
        self.database
            .close_collection_run(run_id, status, records, error_message, Utc::now())
            .await?;
        info!(run_id, status = %status, records = records_collected, "Closed collection run");
        Ok(())
    }

    /// Entry by id
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get(&self, run_id: i64) -> AppResult<Option<CollectionRun>> {
        self.database.get_collection_run(run_id).await
    }

    /// Newest entries first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn recent(&self, limit: u32) -> AppResult<Vec<CollectionRun>> {
        self.database.recent_collection_runs(limit).await
    }

    /// Newest entry, optionally of one collection type
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn last_run(
        &self,
        collection_type: Option<CollectionType>,
    ) -> AppResult<Option<CollectionRun>> {
        self.database.last_collection_run(collection_type).await
    }

    /// Whether the newest run of `collection_type` closed with `success`
    ///
    /// `false` when no run exists or the newest one is still running.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn last_run_succeeded(
        &self,
        collection_type: Option<CollectionType>,
    ) -> AppResult<bool> {
        Ok(self
            .last_run(collection_type)
            .await?
            .is_some_and(|run| run.status == RunStatus::Success))
    }
}
