// ABOUTME: Daily-scalar extractors that each contribute a sparse patch to the daily metrics row
// ABOUTME: Covers the daily summary, heart rate, stress, body battery, hydration and training readiness
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;
use chrono::NaiveDate;
use wellness_providers::payloads::{
    BodyBatteryReport, DailySummaryPayload, HeartRatePayload, HydrationPayload, StressPayload,
    TrainingReadinessEntry,
};
use wellness_providers::utils::conversions::f64_to_i64;
use wellness_providers::WellnessDataSource;

use super::series::{extract_points, SeriesShape};
use super::{CollectionContext, MetricExtractor};
use crate::errors::ProviderResult;
use crate::models::{DailyMetricRecord, MetricFamily, NormalizedRecord};

/// Remote stress and body battery summaries use negative values for "no data"
fn non_negative(value: Option<i64>) -> Option<i64> {
    value.filter(|v| *v >= 0)
}

fn single_patch(patch: DailyMetricRecord) -> Vec<NormalizedRecord> {
    if patch.is_empty() {
        Vec::new()
    } else {
        vec![patch.into()]
    }
}

/// Steps, distance, calories, floors, activity durations, SpO2 and respiration
pub struct DailySummaryExtractor;

#[async_trait]
impl MetricExtractor for DailySummaryExtractor {
    type Payload = DailySummaryPayload;

    fn family(&self) -> MetricFamily {
        MetricFamily::DailySummary
    }

    async fn fetch(
        &self,
        source: &dyn WellnessDataSource,
        _ctx: &CollectionContext,
        date: NaiveDate,
    ) -> ProviderResult<Self::Payload> {
        source.daily_summary(date).await
    }

    fn normalize(
        &self,
        ctx: &CollectionContext,
        date: NaiveDate,
        payload: Self::Payload,
    ) -> Vec<NormalizedRecord> {
        single_patch(DailyMetricRecord {
            total_steps: payload.total_steps.filter(|steps| *steps >= 0),
            total_distance_meters: payload.total_distance_meters,
            active_seconds: payload.active_seconds,
            highly_active_seconds: payload.highly_active_seconds,
            sedentary_seconds: payload.sedentary_seconds,
            calories_total: payload.total_kilocalories.and_then(f64_to_i64),
            calories_active: payload.active_kilocalories.and_then(f64_to_i64),
            floors_climbed: payload.floors_ascended.and_then(f64_to_i64),
            spo2_avg: payload.average_spo2,
            respiration_avg: payload.avg_waking_respiration_value,
            ..DailyMetricRecord::new(date, ctx.user_id)
        })
    }
}

/// Resting, minimum and maximum heart rate
pub struct HeartRateSummaryExtractor;

#[async_trait]
impl MetricExtractor for HeartRateSummaryExtractor {
    type Payload = HeartRatePayload;

    fn family(&self) -> MetricFamily {
        MetricFamily::HeartRateSummary
    }

    async fn fetch(
        &self,
        source: &dyn WellnessDataSource,
        _ctx: &CollectionContext,
        date: NaiveDate,
    ) -> ProviderResult<Self::Payload> {
        source.heart_rates(date).await
    }

    fn normalize(
        &self,
        ctx: &CollectionContext,
        date: NaiveDate,
        payload: Self::Payload,
    ) -> Vec<NormalizedRecord> {
        single_patch(DailyMetricRecord {
            resting_heart_rate: payload.resting_heart_rate,
            min_heart_rate: payload.min_heart_rate,
            max_heart_rate: payload.max_heart_rate,
            ..DailyMetricRecord::new(date, ctx.user_id)
        })
    }
}

/// Average and peak stress
pub struct StressSummaryExtractor;

#[async_trait]
impl MetricExtractor for StressSummaryExtractor {
    type Payload = StressPayload;

    fn family(&self) -> MetricFamily {
        MetricFamily::StressSummary
    }

    async fn fetch(
        &self,
        source: &dyn WellnessDataSource,
        _ctx: &CollectionContext,
        date: NaiveDate,
    ) -> ProviderResult<Self::Payload> {
        source.stress(date).await
    }

    fn normalize(
        &self,
        ctx: &CollectionContext,
        date: NaiveDate,
        payload: Self::Payload,
    ) -> Vec<NormalizedRecord> {
        single_patch(DailyMetricRecord {
            avg_stress_level: non_negative(payload.avg_stress_level),
            max_stress_level: non_negative(payload.max_stress_level),
            ..DailyMetricRecord::new(date, ctx.user_id)
        })
    }
}

/// Body battery charged, drained and daily extremes
pub struct BodyBatterySummaryExtractor;

#[async_trait]
impl MetricExtractor for BodyBatterySummaryExtractor {
    type Payload = Vec<BodyBatteryReport>;

    fn family(&self) -> MetricFamily {
        MetricFamily::BodyBatterySummary
    }

    async fn fetch(
        &self,
        source: &dyn WellnessDataSource,
        _ctx: &CollectionContext,
        date: NaiveDate,
    ) -> ProviderResult<Self::Payload> {
        source.body_battery(date).await
    }

    fn normalize(
        &self,
        ctx: &CollectionContext,
        date: NaiveDate,
        payload: Self::Payload,
    ) -> Vec<NormalizedRecord> {
        let Some(report) = payload.into_iter().next() else {
            return Vec::new();
        };

        let levels: Vec<i64> = report
            .body_battery_values_array
            .as_deref()
            .map(|values| extract_points(SeriesShape::TupleArray { value_index: 1 }, values))
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(_, level)| f64_to_i64(level))
            .filter(|level| *level >= 0)
            .collect();

        single_patch(DailyMetricRecord {
            body_battery_charged: non_negative(report.charged),
            body_battery_drained: non_negative(report.drained),
            body_battery_highest: levels.iter().max().copied(),
            body_battery_lowest: levels.iter().min().copied(),
            ..DailyMetricRecord::new(date, ctx.user_id)
        })
    }
}

/// Logged water intake
pub struct HydrationExtractor;

#[async_trait]
impl MetricExtractor for HydrationExtractor {
    type Payload = HydrationPayload;

    fn family(&self) -> MetricFamily {
        MetricFamily::Hydration
    }

    async fn fetch(
        &self,
        source: &dyn WellnessDataSource,
        _ctx: &CollectionContext,
        date: NaiveDate,
    ) -> ProviderResult<Self::Payload> {
        source.hydration(date).await
    }

    fn normalize(
        &self,
        ctx: &CollectionContext,
        date: NaiveDate,
        payload: Self::Payload,
    ) -> Vec<NormalizedRecord> {
        single_patch(DailyMetricRecord {
            hydration_ml: payload
                .value_in_ml
                .and_then(f64_to_i64)
                .filter(|ml| *ml >= 0),
            ..DailyMetricRecord::new(date, ctx.user_id)
        })
    }
}

/// Training readiness score; the latest reading of the day wins
pub struct TrainingReadinessExtractor;

#[async_trait]
impl MetricExtractor for TrainingReadinessExtractor {
    type Payload = Vec<TrainingReadinessEntry>;

    fn family(&self) -> MetricFamily {
        MetricFamily::TrainingReadiness
    }

    async fn fetch(
        &self,
        source: &dyn WellnessDataSource,
        _ctx: &CollectionContext,
        date: NaiveDate,
    ) -> ProviderResult<Self::Payload> {
        source.training_readiness(date).await
    }

    fn normalize(
        &self,
        ctx: &CollectionContext,
        date: NaiveDate,
        payload: Self::Payload,
    ) -> Vec<NormalizedRecord> {
        let latest = payload
            .into_iter()
            .filter(|entry| entry.score.is_some())
            .max_by(|a, b| a.timestamp.cmp(&b.timestamp));

        single_patch(DailyMetricRecord {
            training_readiness_score: latest.and_then(|entry| entry.score),
            ..DailyMetricRecord::new(date, ctx.user_id)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx() -> CollectionContext {
        CollectionContext::new(7, None)
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap_or_default()
    }

    fn daily(records: &[NormalizedRecord]) -> Option<&DailyMetricRecord> {
        match records {
            [NormalizedRecord::Daily(record)] => Some(&**record),
            _ => None,
        }
    }

    #[test]
    fn test_daily_summary_rounds_calories_and_omits_missing() {
        let payload: DailySummaryPayload = serde_json::from_value(json!({
            "totalSteps": 8123,
            "totalKilocalories": 2210.6,
            "floorsAscended": 11.2
        }))
        .unwrap_or_default();

        let records = DailySummaryExtractor.normalize(&ctx(), date(), payload);
        let record = daily(&records).cloned().unwrap_or_default();
        assert_eq!(record.user_id, 7);
        assert_eq!(record.total_steps, Some(8123));
        assert_eq!(record.calories_total, Some(2211));
        assert_eq!(record.floors_climbed, Some(11));
        assert_eq!(record.calories_active, None);
        assert_eq!(record.resting_heart_rate, None);
    }

    #[test]
    fn test_empty_summary_emits_nothing() {
        let records =
            DailySummaryExtractor.normalize(&ctx(), date(), DailySummaryPayload::default());
        assert!(records.is_empty());
    }

    #[test]
    fn test_stress_sentinels_are_dropped() {
        let payload = StressPayload {
            avg_stress_level: Some(-1),
            max_stress_level: Some(78),
            ..StressPayload::default()
        };
        let records = StressSummaryExtractor.normalize(&ctx(), date(), payload);
        let record = daily(&records).cloned().unwrap_or_default();
        assert_eq!(record.avg_stress_level, None);
        assert_eq!(record.max_stress_level, Some(78));
    }

    #[test]
    fn test_body_battery_extremes_come_from_samples() {
        let payload: Vec<BodyBatteryReport> = serde_json::from_value(json!([{
            "charged": 54,
            "drained": 61,
            "bodyBatteryValuesArray": [
                [1_709_251_200_000_i64, 35],
                [1_709_280_000_000_i64, 89],
                [1_709_300_000_000_i64, null],
                [1_709_330_000_000_i64, 28]
            ]
        }]))
        .unwrap_or_default();

        let records = BodyBatterySummaryExtractor.normalize(&ctx(), date(), payload);
        let record = daily(&records).cloned().unwrap_or_default();
        assert_eq!(record.body_battery_charged, Some(54));
        assert_eq!(record.body_battery_highest, Some(89));
        assert_eq!(record.body_battery_lowest, Some(28));
    }

    #[test]
    fn test_training_readiness_prefers_latest_reading() {
        let payload = vec![
            TrainingReadinessEntry {
                timestamp: Some("2024-03-01T05:00:00.0".to_owned()),
                score: Some(61),
                ..TrainingReadinessEntry::default()
            },
            TrainingReadinessEntry {
                timestamp: Some("2024-03-01T09:30:00.0".to_owned()),
                score: Some(70),
                ..TrainingReadinessEntry::default()
            },
        ];
        let records = TrainingReadinessExtractor.normalize(&ctx(), date(), payload);
        let record = daily(&records).cloned().unwrap_or_default();
        assert_eq!(record.training_readiness_score, Some(70));
    }
}
