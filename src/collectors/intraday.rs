// ABOUTME: Intraday extractors turning remote arrays into timestamped samples
// ABOUTME: One extractor per intraday metric; samples are insert-if-absent on (user, instant, metric)
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use wellness_providers::payloads::{
    BodyBatteryReport, HeartRatePayload, HrvPayload, RespirationPayload, SleepPayload,
    StepsBucket, StressPayload,
};
use wellness_providers::WellnessDataSource;

use super::series::{extract_points, parse_instant_str, to_samples, SeriesShape};
use super::{CollectionContext, MetricExtractor};
use crate::errors::ProviderResult;
use crate::models::{IntradayMetric, MetricFamily, NormalizedRecord};

const TIMESTAMP_VALUE: SeriesShape = SeriesShape::TupleArray { value_index: 1 };

fn series(
    ctx: &CollectionContext,
    metric: IntradayMetric,
    shape: SeriesShape,
    entries: Option<&[Value]>,
) -> Vec<NormalizedRecord> {
    entries.map_or_else(Vec::new, |entries| {
        to_samples(ctx.user_id, metric, extract_points(shape, entries))
    })
}

/// Heart rate samples, roughly every two minutes
pub struct IntradayHeartRateExtractor;

#[async_trait]
impl MetricExtractor for IntradayHeartRateExtractor {
    type Payload = HeartRatePayload;

    fn family(&self) -> MetricFamily {
        MetricFamily::IntradayHeartRate
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
        _date: NaiveDate,
        payload: Self::Payload,
    ) -> Vec<NormalizedRecord> {
        series(
            ctx,
            IntradayMetric::HeartRate,
            TIMESTAMP_VALUE,
            payload.heart_rate_values.as_deref(),
        )
    }
}

/// Stress samples
pub struct IntradayStressExtractor;

#[async_trait]
impl MetricExtractor for IntradayStressExtractor {
    type Payload = StressPayload;

    fn family(&self) -> MetricFamily {
        MetricFamily::IntradayStress
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
        _date: NaiveDate,
        payload: Self::Payload,
    ) -> Vec<NormalizedRecord> {
        series(
            ctx,
            IntradayMetric::Stress,
            TIMESTAMP_VALUE,
            payload.stress_values_array.as_deref(),
        )
    }
}

/// Body battery level samples from every report of the day
pub struct IntradayBodyBatteryExtractor;

#[async_trait]
impl MetricExtractor for IntradayBodyBatteryExtractor {
    type Payload = Vec<BodyBatteryReport>;

    fn family(&self) -> MetricFamily {
        MetricFamily::IntradayBodyBattery
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
        _date: NaiveDate,
        payload: Self::Payload,
    ) -> Vec<NormalizedRecord> {
        payload
            .iter()
            .flat_map(|report| {
                series(
                    ctx,
                    IntradayMetric::BodyBattery,
                    TIMESTAMP_VALUE,
                    report.body_battery_values_array.as_deref(),
                )
            })
            .collect()
    }
}

/// Sleep stage transitions, one sample per stage start
pub struct IntradaySleepStagesExtractor;

#[async_trait]
impl MetricExtractor for IntradaySleepStagesExtractor {
    type Payload = SleepPayload;

    fn family(&self) -> MetricFamily {
        MetricFamily::IntradaySleepStages
    }

    async fn fetch(
        &self,
        source: &dyn WellnessDataSource,
        _ctx: &CollectionContext,
        date: NaiveDate,
    ) -> ProviderResult<Self::Payload> {
        source.sleep(date).await
    }

    fn normalize(
        &self,
        ctx: &CollectionContext,
        _date: NaiveDate,
        payload: Self::Payload,
    ) -> Vec<NormalizedRecord> {
        series(
            ctx,
            IntradayMetric::SleepStage,
            SeriesShape::ObjectList {
                time_key: "startGMT",
                value_key: "activityLevel",
            },
            payload.sleep_levels.as_deref(),
        )
    }
}

/// Overnight HRV readings
pub struct IntradayHrvExtractor;

#[async_trait]
impl MetricExtractor for IntradayHrvExtractor {
    type Payload = HrvPayload;

    fn family(&self) -> MetricFamily {
        MetricFamily::IntradayHrv
    }

    async fn fetch(
        &self,
        source: &dyn WellnessDataSource,
        _ctx: &CollectionContext,
        date: NaiveDate,
    ) -> ProviderResult<Self::Payload> {
        source.hrv(date).await
    }

    fn normalize(
        &self,
        ctx: &CollectionContext,
        _date: NaiveDate,
        payload: Self::Payload,
    ) -> Vec<NormalizedRecord> {
        series(
            ctx,
            IntradayMetric::Hrv,
            SeriesShape::ObjectList {
                time_key: "readingTimeGMT",
                value_key: "hrvValue",
            },
            payload.hrv_readings.as_deref(),
        )
    }
}

/// Respiration rate samples
pub struct IntradayRespirationExtractor;

#[async_trait]
impl MetricExtractor for IntradayRespirationExtractor {
    type Payload = RespirationPayload;

    fn family(&self) -> MetricFamily {
        MetricFamily::IntradayRespiration
    }

    async fn fetch(
        &self,
        source: &dyn WellnessDataSource,
        _ctx: &CollectionContext,
        date: NaiveDate,
    ) -> ProviderResult<Self::Payload> {
        source.respiration(date).await
    }

    fn normalize(
        &self,
        ctx: &CollectionContext,
        _date: NaiveDate,
        payload: Self::Payload,
    ) -> Vec<NormalizedRecord> {
        series(
            ctx,
            IntradayMetric::Respiration,
            TIMESTAMP_VALUE,
            payload.respiration_values_array.as_deref(),
        )
    }
}

/// Steps per 15-minute bucket, stamped at the bucket start
pub struct IntradayStepsExtractor;

#[async_trait]
impl MetricExtractor for IntradayStepsExtractor {
    type Payload = Vec<StepsBucket>;

    fn family(&self) -> MetricFamily {
        MetricFamily::IntradaySteps
    }

    async fn fetch(
        &self,
        source: &dyn WellnessDataSource,
        _ctx: &CollectionContext,
        date: NaiveDate,
    ) -> ProviderResult<Self::Payload> {
        source.steps_intraday(date).await
    }

    fn normalize(
        &self,
        ctx: &CollectionContext,
        _date: NaiveDate,
        payload: Self::Payload,
    ) -> Vec<NormalizedRecord> {
        let points = payload.into_iter().filter_map(|bucket| {
            let start = bucket.start_gmt.as_deref().and_then(parse_instant_str)?;
            Some((start, bucket.steps?))
        });
        to_samples(ctx.user_id, IntradayMetric::Steps, points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn ctx() -> CollectionContext {
        CollectionContext::new(4, None)
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap_or_default()
    }

    fn values(records: &[NormalizedRecord]) -> Vec<f64> {
        records
            .iter()
            .filter_map(|record| match record {
                NormalizedRecord::Intraday(sample) => Some(sample.value),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_heart_rate_skips_nulls_and_sentinels() {
        let payload: HeartRatePayload = serde_json::from_value(json!({
            "restingHeartRate": 52,
            "heartRateValues": [
                [1_709_251_200_000_i64, 58],
                [1_709_251_320_000_i64, null],
                [1_709_251_440_000_i64, -1],
                [1_709_251_560_000_i64, 61]
            ]
        }))
        .unwrap_or_default();

        let records = IntradayHeartRateExtractor.normalize(&ctx(), date(), payload);
        assert_eq!(values(&records), vec![58.0, 61.0]);
    }

    #[test]
    fn test_missing_array_emits_nothing() {
        let records =
            IntradayStressExtractor.normalize(&ctx(), date(), StressPayload::default());
        assert!(records.is_empty());
    }

    #[test]
    fn test_body_battery_reads_every_report() {
        let payload: Vec<BodyBatteryReport> = serde_json::from_value(json!([
            {"bodyBatteryValuesArray": [[1_709_251_200_000_i64, 40]]},
            {"bodyBatteryValuesArray": [[1_709_254_800_000_i64, 44]]}
        ]))
        .unwrap_or_default();
        let records = IntradayBodyBatteryExtractor.normalize(&ctx(), date(), payload);
        assert_eq!(values(&records), vec![40.0, 44.0]);
    }

    #[test]
    fn test_sleep_stages_use_stage_start() {
        let payload: SleepPayload = serde_json::from_value(json!({
            "sleepLevels": [
                {"startGMT": "2024-02-29T23:10:00.0", "endGMT": "2024-02-29T23:40:00.0", "activityLevel": 1.0},
                {"startGMT": "2024-02-29T23:40:00.0", "endGMT": "2024-03-01T00:30:00.0", "activityLevel": 0.0}
            ]
        }))
        .unwrap_or_default();

        let records = IntradaySleepStagesExtractor.normalize(&ctx(), date(), payload);
        assert_eq!(records.len(), 2);
        assert!(matches!(
            &records[0],
            NormalizedRecord::Intraday(sample)
                if sample.metric == IntradayMetric::SleepStage
                    && Some(sample.timestamp) == Utc.with_ymd_and_hms(2024, 2, 29, 23, 10, 0).single()
        ));
    }

    #[test]
    fn test_hrv_readings() {
        let payload: HrvPayload = serde_json::from_value(json!({
            "hrvReadings": [
                {"hrvValue": 41, "readingTimeGMT": "2024-03-01T01:05:00.0"},
                {"hrvValue": 47, "readingTimeGMT": "2024-03-01T01:10:00.0"}
            ]
        }))
        .unwrap_or_default();
        let records = IntradayHrvExtractor.normalize(&ctx(), date(), payload);
        assert_eq!(values(&records), vec![41.0, 47.0]);
    }

    #[test]
    fn test_steps_buckets_need_start_and_count() {
        let payload = vec![
            StepsBucket {
                start_gmt: Some("2024-03-01T08:00:00.0".to_owned()),
                steps: Some(312.0),
                ..StepsBucket::default()
            },
            StepsBucket {
                start_gmt: None,
                steps: Some(80.0),
                ..StepsBucket::default()
            },
            StepsBucket {
                start_gmt: Some("2024-03-01T08:30:00.0".to_owned()),
                steps: None,
                ..StepsBucket::default()
            },
        ];
        let records = IntradayStepsExtractor.normalize(&ctx(), date(), payload);
        assert_eq!(values(&records), vec![312.0]);
    }
}
