// ABOUTME: Metric extractors that fetch one family for one date and normalize it into records
// ABOUTME: Defines the extractor traits, the per-run collection context and the extractor registry
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Metric Extractors
//!
//! An extractor is split in two halves:
//!
//! - [`MetricExtractor::fetch`] issues the remote call(s) for one date and
//!   returns the typed payload
//! - [`MetricExtractor::normalize`] is a pure function from that payload to
//!   [`NormalizedRecord`]s and never touches the network
//!
//! The orchestrator only sees the object-safe [`Extractor`] trait, which every
//! `MetricExtractor` gets through a blanket implementation. The only state shared
//! between calls is the read-only [`CollectionContext`].

/// Activities and original activity files
pub mod activities;
/// Weigh-ins
pub mod body_composition;
/// Daily-scalar extractors merged into the daily metrics row
pub mod daily;
/// Intraday array extractors
pub mod intraday;
/// Intraday series parsing helpers
pub mod series;
/// Nightly sleep session
pub mod sleep;

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, warn};
use wellness_providers::WellnessDataSource;

use crate::errors::{AppError, AppResult, ProviderResult};
use crate::models::{MetricFamily, NormalizedRecord};

pub use activities::{ActivitiesExtractor, ActivityFilesExtractor};
pub use body_composition::BodyCompositionExtractor;
pub use daily::{
    BodyBatterySummaryExtractor, DailySummaryExtractor, HeartRateSummaryExtractor,
    HydrationExtractor, StressSummaryExtractor, TrainingReadinessExtractor,
};
pub use intraday::{
    IntradayBodyBatteryExtractor, IntradayHeartRateExtractor, IntradayHrvExtractor,
    IntradayRespirationExtractor, IntradaySleepStagesExtractor, IntradayStepsExtractor,
    IntradayStressExtractor,
};
pub use sleep::SleepExtractor;

/// Identity resolved once per run and passed to every extractor call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionContext {
    /// Local user id that owns every record of the run
    pub user_id: i64,
    /// Remote display name, when the profile was resolved
    pub display_name: Option<String>,
}

impl CollectionContext {
    /// Context for a known local user
    #[must_use]
    pub const fn new(user_id: i64, display_name: Option<String>) -> Self {
        Self {
            user_id,
            display_name,
        }
    }
}

/// Typed extractor for one metric family
#[async_trait]
pub trait MetricExtractor: Send + Sync {
    /// Remote payload consumed by `normalize`
    type Payload: Send;

    /// Family this extractor collects
    fn family(&self) -> MetricFamily;

    /// Fetch the raw payload for `date`
    async fn fetch(
        &self,
        source: &dyn WellnessDataSource,
        ctx: &CollectionContext,
        date: NaiveDate,
    ) -> ProviderResult<Self::Payload>;

    /// Map a payload into records, omitting anything the payload did not report
    fn normalize(
        &self,
        ctx: &CollectionContext,
        date: NaiveDate,
        payload: Self::Payload,
    ) -> Vec<NormalizedRecord>;
}

/// Object-safe view of a [`MetricExtractor`]
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Family this extractor collects
    fn family(&self) -> MetricFamily;

    /// Fetch and normalize one date
    async fn extract(
        &self,
        source: &dyn WellnessDataSource,
        ctx: &CollectionContext,
        date: NaiveDate,
    ) -> ProviderResult<Vec<NormalizedRecord>>;
}

#[async_trait]
impl<T> Extractor for T
where
    T: MetricExtractor,
{
    fn family(&self) -> MetricFamily {
        MetricExtractor::family(self)
    }

    async fn extract(
        &self,
        source: &dyn WellnessDataSource,
        ctx: &CollectionContext,
        date: NaiveDate,
    ) -> ProviderResult<Vec<NormalizedRecord>> {
        let payload = self.fetch(source, ctx, date).await?;
        Ok(self.normalize(ctx, date, payload))
    }
}

/// Set of metric families selected for a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSet {
    families: BTreeSet<MetricFamily>,
}

impl MetricSet {
    /// Every family, including opt-in ones
    #[must_use]
    pub fn all() -> Self {
        Self {
            families: MetricFamily::ALL.into_iter().collect(),
        }
    }

    /// Families enabled by default
    #[must_use]
    pub fn default_set() -> Self {
        Self {
            families: MetricFamily::ALL
                .into_iter()
                .filter(|family| family.enabled_by_default())
                .collect(),
        }
    }

    /// Exactly the listed families
    #[must_use]
    pub fn only(families: impl IntoIterator<Item = MetricFamily>) -> Self {
        Self {
            families: families.into_iter().collect(),
        }
    }

    /// Parse a comma-separated list such as `daily_summary,sleep`
    ///
    /// `all` and `default` name the predefined sets.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an unknown name or an empty list
    pub fn parse(list: &str) -> AppResult<Self> {
        match list.trim() {
            "all" => return Ok(Self::all()),
            "default" => return Ok(Self::default_set()),
            _ => {}
        }

        let families = list
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| name.parse::<MetricFamily>().map_err(AppError::invalid_input))
            .collect::<AppResult<BTreeSet<_>>>()?;

        if families.is_empty() {
            return Err(AppError::invalid_input("metric list is empty"));
        }
        Ok(Self { families })
    }

    /// Add or remove one family
    #[must_use]
    pub fn with(mut self, family: MetricFamily, enabled: bool) -> Self {
        if enabled {
            self.families.insert(family);
        } else {
            self.families.remove(&family);
        }
        self
    }

    /// Whether `family` is selected
    #[must_use]
    pub fn contains(&self, family: MetricFamily) -> bool {
        self.families.contains(&family)
    }

    /// Selected families in registry order
    pub fn iter(&self) -> impl Iterator<Item = MetricFamily> + '_ {
        self.families.iter().copied()
    }

    /// Number of selected families
    #[must_use]
    pub fn len(&self) -> usize {
        self.families.len()
    }

    /// Whether nothing is selected
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }
}

impl Default for MetricSet {
    fn default() -> Self {
        Self::default_set()
    }
}

/// Registry of extractors, one per metric family
#[derive(Default)]
pub struct ExtractorRegistry {
    extractors: BTreeMap<MetricFamily, Arc<dyn Extractor>>,
}

impl ExtractorRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in extractor
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(DailySummaryExtractor));
        registry.register(Arc::new(HeartRateSummaryExtractor));
        registry.register(Arc::new(StressSummaryExtractor));
        registry.register(Arc::new(BodyBatterySummaryExtractor));
        registry.register(Arc::new(HydrationExtractor));
        registry.register(Arc::new(TrainingReadinessExtractor));
        registry.register(Arc::new(SleepExtractor));
        registry.register(Arc::new(ActivitiesExtractor));
        registry.register(Arc::new(BodyCompositionExtractor));
        registry.register(Arc::new(IntradayHeartRateExtractor));
        registry.register(Arc::new(IntradayStressExtractor));
        registry.register(Arc::new(IntradayBodyBatteryExtractor));
        registry.register(Arc::new(IntradaySleepStagesExtractor));
        registry.register(Arc::new(IntradayHrvExtractor));
        registry.register(Arc::new(IntradayRespirationExtractor));
        registry.register(Arc::new(IntradayStepsExtractor));
        registry.register(Arc::new(ActivityFilesExtractor));
        debug!(count = registry.len(), "Registered built-in extractors");
        registry
    }

    /// Register an extractor
    ///
    /// # Returns
    ///
    /// `true` if registered, `false` if the family already has an extractor
    pub fn register(&mut self, extractor: Arc<dyn Extractor>) -> bool {
        let family = extractor.family();
        if self.extractors.contains_key(&family) {
            warn!(metric = %family, "Extractor already registered, skipping");
            return false;
        }
        self.extractors.insert(family, extractor);
        true
    }

    /// Extractor for a family
    #[must_use]
    pub fn get(&self, family: MetricFamily) -> Option<&Arc<dyn Extractor>> {
        self.extractors.get(&family)
    }

    /// Extractors for the selected families, in registry order
    #[must_use]
    pub fn select(&self, metrics: &MetricSet) -> Vec<Arc<dyn Extractor>> {
        metrics
            .iter()
            .filter_map(|family| {
                let extractor = self.extractors.get(&family);
                if extractor.is_none() {
                    warn!(metric = %family, "No extractor registered for metric");
                }
                extractor.cloned()
            })
            .collect()
    }

    /// Number of registered extractors
    #[must_use]
    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry_covers_every_family() {
        let registry = ExtractorRegistry::standard();
        assert_eq!(registry.len(), MetricFamily::ALL.len());
        for family in MetricFamily::ALL {
            assert!(registry.get(family).is_some(), "missing {family}");
        }
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let mut registry = ExtractorRegistry::new();
        assert!(registry.register(Arc::new(DailySummaryExtractor)));
        assert!(!registry.register(Arc::new(DailySummaryExtractor)));
    }

    #[test]
    fn test_default_set_excludes_activity_files() {
        let set = MetricSet::default_set();
        assert!(!set.contains(MetricFamily::ActivityFiles));
        assert!(set.contains(MetricFamily::DailySummary));
        assert!(set
            .with(MetricFamily::ActivityFiles, true)
            .contains(MetricFamily::ActivityFiles));
    }

    #[test]
    fn test_metric_list_parsing() {
        let set = MetricSet::parse("sleep, daily-summary").unwrap_or_default();
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![MetricFamily::DailySummary, MetricFamily::Sleep]
        );
        assert!(MetricSet::parse("sleep,bogus").is_err());
        assert!(MetricSet::parse(" , ").is_err());
        assert_eq!(MetricSet::parse("all").unwrap_or_default(), MetricSet::all());
    }

    #[test]
    fn test_select_follows_registry_order() {
        let registry = ExtractorRegistry::standard();
        let set = MetricSet::only([MetricFamily::IntradaySteps, MetricFamily::Hydration]);
        let families: Vec<_> = registry.select(&set).iter().map(|e| e.family()).collect();
        assert_eq!(
            families,
            vec![MetricFamily::Hydration, MetricFamily::IntradaySteps]
        );
    }
}
