// ABOUTME: Collection orchestrator sequencing extractors over a date window with per-unit isolation
// ABOUTME: Persists each unit as it completes, aggregates per-family statistics and closes the ledger
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Collection Orchestrator
//!
//! A run walks the window newest day first and, for every day, every selected
//! extractor. One `(family, date)` pair is a *unit*:
//!
//! - a failed unit is logged, recorded in [`RunResult::errors`] and skipped
//! - a successful unit is written to the store before the next unit starts
//! - an expired session or a store failure aborts the run and closes the ledger
//!   entry with `error`
//!
//! Everything is strictly sequential; the data source is expected to apply its own
//! rate limiting and per-call timeout.

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::iter::successors;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use wellness_providers::WellnessDataSource;

use crate::collectors::{CollectionContext, Extractor, ExtractorRegistry, MetricSet};
use crate::constants::identity::DEFAULT_USER_ID;
use crate::database::Database;
use crate::errors::{AppError, AppResult, ProviderError};
use crate::ledger::CollectionLedger;
use crate::models::{CollectionType, MetricFamily, RunStatus, UserProfileRecord};

/// Inclusive range of calendar days to collect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CollectionWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl CollectionWindow {
    /// Window covering `start..=end`
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `start` is after `end`
    pub fn new(start: NaiveDate, end: NaiveDate) -> AppResult<Self> {
        if start > end {
            return Err(AppError::invalid_input(format!(
                "collection window starts after it ends ({start} > {end})"
            )));
        }
        Ok(Self { start, end })
    }

    /// Every calendar day touched by the instant range `[from, to]`
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `from` is after `to`
    pub fn from_instants(from: DateTime<Utc>, to: DateTime<Utc>) -> AppResult<Self> {
        Self::new(from.date_naive(), to.date_naive())
    }

    /// `days_back` days before `today` through `today`
    #[must_use]
    pub fn days_back(today: NaiveDate, days_back: u32) -> Self {
        let start = today
            .checked_sub_days(Days::new(u64::from(days_back)))
            .unwrap_or(NaiveDate::MIN);
        Self { start, end: today }
    }

    /// First day
    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day
    #[must_use]
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of days in the window
    #[must_use]
    pub fn len_days(&self) -> u64 {
        u64::try_from((self.end - self.start).num_days()).map_or(0, |days| days + 1)
    }

    /// Days from newest to oldest
    pub fn days_desc(&self) -> impl Iterator<Item = NaiveDate> {
        let start = self.start;
        successors(Some(self.end), NaiveDate::pred_opt).take_while(move |day| *day >= start)
    }
}

/// One skipped unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitFailure {
    /// Metric family of the unit
    pub family: MetricFamily,
    /// Day of the unit
    pub date: NaiveDate,
    /// Failure label (see `ProviderError::kind`)
    pub kind: &'static str,
    /// Failure message
    pub message: String,
    /// Whether a later attempt could succeed
    pub retryable: bool,
}

/// Counters for one metric family within a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExtractorStats {
    /// Units attempted
    pub attempted: u64,
    /// Units whose fetch succeeded
    pub succeeded: u64,
    /// Units skipped after a failure
    pub failed: u64,
    /// Records produced by normalization
    pub normalized: u64,
    /// Rows inserted or updated
    pub persisted: u64,
}

/// Outcome of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    /// Ledger entry of the run
    pub run_id: i64,
    /// What triggered the run
    pub collection_type: CollectionType,
    /// Days covered
    pub window: CollectionWindow,
    /// Rows inserted or updated
    pub records_collected: u64,
    /// Units attempted
    pub apis_attempted: u64,
    /// Units whose fetch succeeded
    pub apis_succeeded: u64,
    /// Skipped units
    pub errors: Vec<UnitFailure>,
    /// Per-family counters
    pub stats: BTreeMap<MetricFamily, ExtractorStats>,
}

impl RunResult {
    fn new(run_id: i64, collection_type: CollectionType, window: CollectionWindow) -> Self {
        Self {
            run_id,
            collection_type,
            window,
            records_collected: 0,
            apis_attempted: 0,
            apis_succeeded: 0,
            errors: Vec::new(),
            stats: BTreeMap::new(),
        }
    }

    /// Fraction of units that succeeded, `0.0` when nothing was attempted
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        if self.apis_attempted == 0 {
            0.0
        } else {
            self.apis_succeeded as f64 / self.apis_attempted as f64
        }
    }

    /// Records produced by normalization across all families
    #[must_use]
    pub fn total_data_points(&self) -> u64 {
        self.stats.values().map(|stats| stats.normalized).sum()
    }

    /// Whether any unit was skipped
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Whether the run may advance the sync checkpoint
    ///
    /// Skips caused by permanent conditions (no data, unsupported endpoint,
    /// malformed payload) do not block; anything retryable does.
    #[must_use]
    pub fn can_advance_checkpoint(&self) -> bool {
        self.errors.iter().all(|failure| !failure.retryable)
    }

    fn record_failure(&mut self, family: MetricFamily, date: NaiveDate, error: &ProviderError) {
        self.stats.entry(family).or_default().failed += 1;
        self.errors.push(UnitFailure {
            family,
            date,
            kind: error.kind(),
            message: error.to_string(),
            retryable: error.is_retryable(),
        });
    }
}

/// Runs extractors over a window and records the outcome in the ledger
pub struct CollectionOrchestrator {
    database: Database,
    source: Arc<dyn WellnessDataSource>,
    registry: Arc<ExtractorRegistry>,
    ledger: CollectionLedger,
}

impl CollectionOrchestrator {
    /// Create an orchestrator writing to `database`
    #[must_use]
    pub fn new(
        database: Database,
        source: Arc<dyn WellnessDataSource>,
        registry: Arc<ExtractorRegistry>,
    ) -> Self {
        let ledger = CollectionLedger::new(database.clone());
        Self {
            database,
            source,
            registry,
            ledger,
        }
    }

    /// Ledger the orchestrator writes to
    #[must_use]
    pub const fn ledger(&self) -> &CollectionLedger {
        &self.ledger
    }

    /// Collect `metrics` for every day of `window`
    ///
    /// Per-unit failures are reported in the result; the ledger entry is closed
    /// with `success` whenever the loop completes.
    ///
    /// # Errors
    ///
    /// Returns the fatal error (expired session, store failure) after closing the
    /// ledger entry with `error`, or an error if the ledger cannot be written
    pub async fn run(
        &self,
        window: CollectionWindow,
        metrics: &MetricSet,
        collection_type: CollectionType,
    ) -> AppResult<RunResult> {
        let run_id = self.ledger.open(collection_type, Utc::now()).await?;
        let mut result = RunResult::new(run_id, collection_type, window);

        info!(
            run_id,
            collection_type = %collection_type,
            start = %window.start(),
            end = %window.end(),
            days = window.len_days(),
            metrics = metrics.len(),
            "Starting collection run"
        );

        match self.collect(window, metrics, &mut result).await {
            Ok(()) => {
                self.ledger
                    .close(run_id, RunStatus::Success, result.records_collected, None)
                    .await?;
                log_summary(&result);
                Ok(result)
            }
            Err(fatal) => {
                error!(
                    run_id,
                    records = result.records_collected,
                    error = %fatal,
                    "Collection run aborted"
                );
                if let Err(close_err) = self
                    .ledger
                    .close(
                        run_id,
                        RunStatus::Error,
                        result.records_collected,
                        Some(fatal.message.as_str()),
                    )
                    .await
                {
                    error!(run_id, error = %close_err, "Failed to close aborted collection run");
                }
                Err(fatal)
            }
        }
    }

    async fn collect(
        &self,
        window: CollectionWindow,
        metrics: &MetricSet,
        result: &mut RunResult,
    ) -> AppResult<()> {
        let ctx = self.resolve_context().await?;
        let extractors = self.registry.select(metrics);

        for date in window.days_desc() {
            for extractor in &extractors {
                self.collect_unit(extractor.as_ref(), &ctx, date, result)
                    .await?;
            }
        }
        Ok(())
    }

    async fn collect_unit(
        &self,
        extractor: &dyn Extractor,
        ctx: &CollectionContext,
        date: NaiveDate,
        result: &mut RunResult,
    ) -> AppResult<()> {
        let family = extractor.family();
        result.apis_attempted += 1;
        result.stats.entry(family).or_default().attempted += 1;

        let records = match extractor.extract(self.source.as_ref(), ctx, date).await {
            Ok(records) => records,
            Err(err) if err.is_fatal() => return Err(err.into()),
            Err(err) => {
                warn!(
                    metric = %family,
                    date = %date,
                    kind = err.kind(),
                    error = %err,
                    "Skipping unit"
                );
                result.record_failure(family, date, &err);
                return Ok(());
            }
        };

        result.apis_succeeded += 1;
        {
            let stats = result.stats.entry(family).or_default();
            stats.succeeded += 1;
            stats.normalized += records.len() as u64;
        }

        // Counted per record so an aborted unit still reports what it wrote
        let mut persisted = 0;
        for record in &records {
            let rows = self.database.store_record(record).await?;
            persisted += rows;
            result.records_collected += rows;
            result.stats.entry(family).or_default().persisted += rows;
        }

        debug!(
            metric = %family,
            date = %date,
            normalized = records.len(),
            records = persisted,
            "Collected unit"
        );
        Ok(())
    }

    /// Upsert the remote profile and build the run context
    ///
    /// Only an expired session is fatal here; any other failure falls back to the
    /// default local user.
    async fn resolve_context(&self) -> AppResult<CollectionContext> {
        let profile = match self.source.user_profile().await {
            Ok(profile) => profile,
            Err(err) if err.is_fatal() => return Err(err.into()),
            Err(err) => {
                warn!(error = %err, "Could not resolve user profile, using default user");
                return Ok(CollectionContext::new(DEFAULT_USER_ID, None));
            }
        };

        let Some(remote_user_id) = profile
            .profile_id
            .map(|id| id.to_string())
            .or_else(|| profile.display_name.clone())
        else {
            warn!("User profile has no identifier, using default user");
            return Ok(CollectionContext::new(DEFAULT_USER_ID, None));
        };

        let record = UserProfileRecord {
            remote_user_id,
            display_name: profile.display_name.clone(),
            full_name: profile.full_name,
            profile_image_url: profile.profile_image_url_large,
            ..UserProfileRecord::default()
        };
        let user_id = self.database.upsert_user_profile(&record).await?;
        debug!(user_id, remote_user_id = %record.remote_user_id, "Resolved user profile");

        Ok(CollectionContext::new(user_id, profile.display_name))
    }
}

fn log_summary(result: &RunResult) {
    for (family, stats) in &result.stats {
        debug!(
            run_id = result.run_id,
            metric = %family,
            attempted = stats.attempted,
            succeeded = stats.succeeded,
            failed = stats.failed,
            normalized = stats.normalized,
            persisted = stats.persisted,
            "Extractor statistics"
        );
    }

    info!(
        run_id = result.run_id,
        apis_attempted = result.apis_attempted,
        apis_succeeded = result.apis_succeeded,
        success_rate = %format!("{:.1}%", result.success_rate() * 100.0),
        data_points = result.total_data_points(),
        records = result.records_collected,
        skipped = result.errors.len(),
        "Collection run complete"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap_or_default()
    }

    #[test]
    fn test_days_are_newest_first() {
        let window = CollectionWindow::days_back(day(4), 3);
        let days: Vec<_> = window.days_desc().collect();
        assert_eq!(days, vec![day(4), day(3), day(2), day(1)]);
        assert_eq!(window.len_days(), 4);
    }

    #[test]
    fn test_days_back_is_inclusive_of_today() {
        let window = CollectionWindow::days_back(day(11), 10);
        assert_eq!(window.start(), day(1));
        assert_eq!(window.len_days(), 11);
    }

    #[test]
    fn test_inverted_window_is_rejected() {
        assert!(CollectionWindow::new(day(5), day(4)).is_err());
    }

    #[test]
    fn test_checkpoint_blocked_only_by_retryable_failures() {
        let window = CollectionWindow::days_back(day(2), 1);
        let mut result = RunResult::new(1, CollectionType::Sync, window);
        result.record_failure(
            MetricFamily::Sleep,
            day(2),
            &ProviderError::malformed("sleep", "truncated"),
        );
        assert!(result.can_advance_checkpoint());

        result.record_failure(
            MetricFamily::Hydration,
            day(1),
            &ProviderError::Timeout { seconds: 30 },
        );
        assert!(!result.can_advance_checkpoint());
        assert_eq!(result.stats[&MetricFamily::Hydration].failed, 1);
    }

    #[test]
    fn test_success_rate() {
        let window = CollectionWindow::days_back(day(2), 0);
        let mut result = RunResult::new(1, CollectionType::Bulk, window);
        assert!(result.success_rate().abs() < f64::EPSILON);
        result.apis_attempted = 4;
        result.apis_succeeded = 3;
        assert!((result.success_rate() - 0.75).abs() < f64::EPSILON);
    }
}
