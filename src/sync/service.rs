// ABOUTME: Sync service exposing single-cycle, continuous and bulk collection entry points
// ABOUTME: Ties the tracker to the orchestrator and only commits checkpoints after clean runs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};
use wellness_providers::WellnessDataSource;

use super::tracker::SyncStateTracker;
use crate::collectors::{ExtractorRegistry, MetricSet};
use crate::config::SyncConfig;
use crate::database::Database;
use crate::errors::AppResult;
use crate::models::{CollectionType, MetricFamily};
use crate::orchestrator::{CollectionOrchestrator, CollectionWindow, RunResult};

/// Source of the current time
pub trait Clock: Send + Sync {
    /// Current instant
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Outcome of one sync cycle
#[derive(Debug, Clone, Serialize)]
pub struct SyncCycleOutcome {
    /// Whether the checkpoint was advanced
    pub synced: bool,
    /// Collection run, when one was needed
    pub run: Option<RunResult>,
}

/// Entry points used by the CLI
pub struct SyncService {
    orchestrator: CollectionOrchestrator,
    tracker: SyncStateTracker,
    source: Arc<dyn WellnessDataSource>,
    metrics: MetricSet,
    sync_interval: Duration,
    bulk_days_back: u32,
    clock: Arc<dyn Clock>,
}

impl SyncService {
    /// Build a service with the standard extractors and the configured metric set
    #[must_use]
    pub fn new(database: Database, source: Arc<dyn WellnessDataSource>, config: &SyncConfig) -> Self {
        let registry = Arc::new(ExtractorRegistry::standard());
        let metrics =
            MetricSet::default_set().with(MetricFamily::ActivityFiles, config.collect_activity_files);

        Self {
            orchestrator: CollectionOrchestrator::new(database.clone(), source.clone(), registry),
            tracker: SyncStateTracker::new(database, source.clone(), config.bootstrap_days),
            source,
            metrics,
            sync_interval: config.sync_interval,
            bulk_days_back: config.bulk_days_back,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the metric set used by sync cycles
    #[must_use]
    pub fn with_metrics(mut self, metrics: MetricSet) -> Self {
        self.metrics = metrics;
        self
    }

    /// Replace the clock
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Orchestrator used by every entry point
    #[must_use]
    pub const fn orchestrator(&self) -> &CollectionOrchestrator {
        &self.orchestrator
    }

    /// Checkpoint tracker
    #[must_use]
    pub const fn tracker(&self) -> &SyncStateTracker {
        &self.tracker
    }

    /// Decide the window, collect it, and commit the checkpoint if nothing retryable failed
    ///
    /// # Errors
    ///
    /// Returns the fatal error of the cycle; the checkpoint is left unchanged
    pub async fn run_single_sync_cycle(&self) -> AppResult<SyncCycleOutcome> {
        let now = self.clock.now();
        let decision = self.tracker.decide_sync_window(now).await?;

        let Some(from) = decision.from.filter(|_| decision.needs_sync) else {
            info!(checkpoint = %decision.checkpoint, "Local data is up to date");
            return Ok(SyncCycleOutcome {
                synced: false,
                run: None,
            });
        };

        let window = CollectionWindow::from_instants(from, decision.to)?;
        let run = self
            .orchestrator
            .run(window, &self.metrics, CollectionType::Sync)
            .await?;

        let synced = run.can_advance_checkpoint();
        if synced {
            self.tracker.commit(decision.checkpoint).await?;
        } else {
            warn!(
                run_id = run.run_id,
                skipped = run.errors.len(),
                "Retryable failures in run, checkpoint not advanced"
            );
        }

        Ok(SyncCycleOutcome {
            synced,
            run: Some(run),
        })
    }

    /// Run sync cycles until `shutdown` resolves
    ///
    /// A failed cycle is logged and retried after the next sleep; after an expired
    /// session the data source is asked to re-authenticate first. `shutdown` is
    /// only observed while sleeping, so a cycle in progress always completes.
    pub async fn run_continuous_sync<F>(&self, shutdown: F)
    where
        F: Future<Output = ()> + Send,
    {
        tokio::pin!(shutdown);
        info!(
            interval_secs = self.sync_interval.as_secs(),
            "Starting continuous sync"
        );

        loop {
            match self.run_single_sync_cycle().await {
                Ok(outcome) => info!(
                    synced = outcome.synced,
                    records = outcome.run.as_ref().map_or(0, |run| run.records_collected),
                    "Sync cycle finished"
                ),
                Err(err) => {
                    error!(error = %err, "Sync cycle failed");
                    if err.is_auth_failure() {
                        match self.source.reauthenticate().await {
                            Ok(()) => info!("Re-authenticated with {}", self.source.name()),
                            Err(e) => error!(error = %e, "Re-authentication failed"),
                        }
                    }
                }
            }

            tokio::select! {
                () = &mut shutdown => {
                    info!("Stop requested, leaving continuous sync");
                    return;
                }
                () = sleep(self.sync_interval) => {}
            }
        }
    }

    /// Collect a fixed window ending today without touching the checkpoint
    ///
    /// `days_back` defaults to the configured bulk window.
    ///
    /// # Errors
    ///
    /// Returns the fatal error of the run
    pub async fn run_bulk_collection(
        &self,
        days_back: Option<u32>,
        metrics: Option<&MetricSet>,
    ) -> AppResult<RunResult> {
        let days_back = days_back.unwrap_or(self.bulk_days_back);
        let window = CollectionWindow::days_back(self.clock.now().date_naive(), days_back);
        info!(days_back, "Starting bulk collection");

        self.orchestrator
            .run(window, metrics.unwrap_or(&self.metrics), CollectionType::Bulk)
            .await
    }
}
