// ABOUTME: Sync state tracker comparing the local checkpoint with the remote device sync time
// ABOUTME: Decides the minimal window needing collection and commits checkpoints after clean runs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Days, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use wellness_providers::WellnessDataSource;

use crate::constants::checkpoint::LAST_SYNC_TIME;
use crate::database::Database;
use crate::errors::AppResult;

/// Result of comparing the local and remote checkpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncDecision {
    /// Whether anything needs collecting
    pub needs_sync: bool,
    /// Start of the window, absent when nothing needs collecting
    pub from: Option<DateTime<Utc>>,
    /// End of the window
    pub to: DateTime<Utc>,
    /// Value to commit once the window is collected
    pub checkpoint: DateTime<Utc>,
}

impl SyncDecision {
    /// Compare checkpoints
    ///
    /// Without a local checkpoint the last `bootstrap_days` days through `now` are
    /// collected. Otherwise the window is `[local, remote]` when the remote is ahead.
    #[must_use]
    pub fn compute(
        local: Option<DateTime<Utc>>,
        remote: DateTime<Utc>,
        now: DateTime<Utc>,
        bootstrap_days: u32,
    ) -> Self {
        match local {
            None => Self {
                needs_sync: true,
                from: Some(
                    now.checked_sub_days(Days::new(u64::from(bootstrap_days)))
                        .unwrap_or(DateTime::<Utc>::MIN_UTC),
                ),
                to: now,
                checkpoint: remote,
            },
            Some(local) if local < remote => Self {
                needs_sync: true,
                from: Some(local),
                to: remote,
                checkpoint: remote,
            },
            Some(local) => Self {
                needs_sync: false,
                from: None,
                to: remote,
                checkpoint: local,
            },
        }
    }
}

/// Owner of the `last_sync_time` checkpoint
#[derive(Clone)]
pub struct SyncStateTracker {
    database: Database,
    source: Arc<dyn WellnessDataSource>,
    bootstrap_days: u32,
}

impl SyncStateTracker {
    /// Create a tracker
    #[must_use]
    pub fn new(database: Database, source: Arc<dyn WellnessDataSource>, bootstrap_days: u32) -> Self {
        Self {
            database,
            source,
            bootstrap_days,
        }
    }

    /// Persisted checkpoint, absent on the first run
    ///
    /// An unreadable stored value is treated as absent so the next run bootstraps.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be queried
    pub async fn last_known_checkpoint(&self) -> AppResult<Option<DateTime<Utc>>> {
        let Some(stored) = self.database.get_checkpoint(LAST_SYNC_TIME).await? else {
            return Ok(None);
        };

        match DateTime::parse_from_rfc3339(&stored.value) {
            Ok(instant) => Ok(Some(instant.with_timezone(&Utc))),
            Err(e) => {
                warn!(value = %stored.value, error = %e, "Ignoring unreadable sync checkpoint");
                Ok(None)
            }
        }
    }

    /// Time the user's device last uploaded to the remote
    ///
    /// Falls back to `now` when the remote cannot report it.
    ///
    /// # Errors
    ///
    /// Returns `AuthExpired` if the remote rejected the session
    pub async fn remote_checkpoint(&self, now: DateTime<Utc>) -> AppResult<DateTime<Utc>> {
        match self.source.device_last_sync_time().await {
            Ok(instant) => Ok(instant),
            Err(err) if err.is_fatal() => Err(err.into()),
            Err(err) => {
                warn!(error = %err, "Remote sync time unavailable, using current time");
                Ok(now)
            }
        }
    }

    /// Decide whether and what to collect
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or the session expired
    pub async fn decide_sync_window(&self, now: DateTime<Utc>) -> AppResult<SyncDecision> {
        let local = self.last_known_checkpoint().await?;
        let remote = self.remote_checkpoint(now).await?;
        let decision = SyncDecision::compute(local, remote, now, self.bootstrap_days);

        debug!(
            local = ?local,
            remote = %remote,
            needs_sync = decision.needs_sync,
            "Computed sync window"
        );
        Ok(decision)
    }

    /// Persist a new checkpoint
    ///
    /// Only called after a run collected the whole window.
    ///
    /// # Errors
    ///
    /// Returns an error if the checkpoint cannot be written
    pub async fn commit(&self, checkpoint: DateTime<Utc>) -> AppResult<()> {
        self.database
            .set_checkpoint(LAST_SYNC_TIME, &checkpoint.to_rfc3339())
            .await?;
        info!(checkpoint = %checkpoint, "Advanced sync checkpoint");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, hour, 0, 0)
            .single()
            .unwrap_or_default()
    }

    #[test]
    fn test_bootstrap_window_ends_now() {
        let decision = SyncDecision::compute(None, at(8), at(12), 7);
        assert!(decision.needs_sync);
        assert_eq!(
            decision.from,
            Utc.with_ymd_and_hms(2024, 3, 3, 12, 0, 0).single()
        );
        assert_eq!(decision.to, at(12));
        assert_eq!(decision.checkpoint, at(8));
    }

    #[test]
    fn test_remote_ahead_yields_gap_window() {
        let decision = SyncDecision::compute(Some(at(6)), at(9), at(12), 7);
        assert!(decision.needs_sync);
        assert_eq!(decision.from, Some(at(6)));
        assert_eq!(decision.to, at(9));
    }

    #[test]
    fn test_caught_up_needs_nothing() {
        for local in [at(9), at(10)] {
            let decision = SyncDecision::compute(Some(local), at(9), at(12), 7);
            assert!(!decision.needs_sync);
            assert_eq!(decision.from, None);
            assert_eq!(decision.checkpoint, local);
        }
    }
}
