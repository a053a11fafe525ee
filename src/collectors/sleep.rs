// ABOUTME: Sleep extractor producing the nightly sleep row and the sleep fields of the daily row
// ABOUTME: Reads the nested daily sleep DTO; stage samples are handled by the intraday extractor
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use wellness_providers::payloads::SleepPayload;
use wellness_providers::WellnessDataSource;

use super::{CollectionContext, MetricExtractor};
use crate::errors::ProviderResult;
use crate::models::{DailyMetricRecord, MetricFamily, NormalizedRecord, SleepRecord};

/// Nightly sleep session
pub struct SleepExtractor;

#[async_trait]
impl MetricExtractor for SleepExtractor {
    type Payload = SleepPayload;

    fn family(&self) -> MetricFamily {
        MetricFamily::Sleep
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
        date: NaiveDate,
        payload: Self::Payload,
    ) -> Vec<NormalizedRecord> {
        let raw_json = serde_json::to_string(&payload).ok();
        let Some(dto) = payload.daily_sleep_dto else {
            return Vec::new();
        };

        let calendar_date = dto
            .calendar_date
            .as_deref()
            .and_then(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
            .unwrap_or(date);

        let sleep = SleepRecord {
            calendar_date,
            user_id: ctx.user_id,
            sleep_id: dto.id.map(|id| id.to_string()),
            sleep_start: dto
                .sleep_start_timestamp_gmt
                .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
            sleep_end: dto
                .sleep_end_timestamp_gmt
                .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
            deep_sleep_seconds: dto.deep_sleep_seconds,
            light_sleep_seconds: dto.light_sleep_seconds,
            rem_sleep_seconds: dto.rem_sleep_seconds,
            awake_seconds: dto.awake_sleep_seconds,
            unmeasurable_seconds: dto.unmeasurable_sleep_seconds,
            overall_sleep_score: dto
                .sleep_scores
                .and_then(|scores| scores.overall)
                .and_then(|overall| overall.value),
            avg_respiration: dto.average_respiration_value,
            avg_spo2: dto.average_spo2_value,
            lowest_spo2: dto.lowest_spo2_value,
            highest_spo2: dto.highest_spo2_value,
            avg_hrv: payload.avg_overnight_hrv,
            restless_moments_count: payload.restless_moments_count,
            raw_json,
        };

        // No session was recorded for the night
        if sleep.sleep_id.is_none()
            && sleep.sleep_start.is_none()
            && sleep.total_sleep_seconds().is_none()
        {
            return Vec::new();
        }

        let patch = DailyMetricRecord {
            sleep_score: sleep.overall_sleep_score,
            total_sleep_seconds: sleep.total_sleep_seconds(),
            deep_sleep_seconds: sleep.deep_sleep_seconds,
            light_sleep_seconds: sleep.light_sleep_seconds,
            rem_sleep_seconds: sleep.rem_sleep_seconds,
            awake_seconds: sleep.awake_seconds,
            ..DailyMetricRecord::new(calendar_date, ctx.user_id)
        };

        let mut records = vec![NormalizedRecord::from(sleep)];
        if !patch.is_empty() {
            records.push(patch.into());
        }
        records
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sleep_emits_session_and_daily_patch() {
        let payload: SleepPayload = serde_json::from_value(json!({
            "dailySleepDTO": {
                "id": 1_709_251_000_000_i64,
                "calendarDate": "2024-03-01",
                "sleepStartTimestampGMT": 1_709_250_000_000_i64,
                "sleepEndTimestampGMT": 1_709_278_800_000_i64,
                "deepSleepSeconds": 5400,
                "lightSleepSeconds": 14_400,
                "remSleepSeconds": 6300,
                "awakeSleepSeconds": 900,
                "sleepScores": {"overall": {"value": 84}}
            },
            "avgOvernightHrv": 46.0
        }))
        .unwrap_or_default();

        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap_or_default();
        let records = SleepExtractor.normalize(&CollectionContext::new(3, None), date, payload);
        assert_eq!(records.len(), 2);

        let NormalizedRecord::Sleep(sleep) = &records[0] else {
            panic!("expected sleep record first");
        };
        assert_eq!(sleep.overall_sleep_score, Some(84));
        assert_eq!(sleep.avg_hrv, Some(46.0));
        assert!(sleep.raw_json.is_some());

        let NormalizedRecord::Daily(daily) = &records[1] else {
            panic!("expected daily patch second");
        };
        assert_eq!(daily.total_sleep_seconds, Some(26_100));
        assert_eq!(daily.sleep_score, Some(84));
        assert_eq!(daily.awake_seconds, Some(900));
        assert_eq!(daily.total_steps, None);
    }

    #[test]
    fn test_night_without_session_emits_nothing() {
        let payload: SleepPayload =
            serde_json::from_value(json!({"dailySleepDTO": {"calendarDate": "2024-03-01"}}))
                .unwrap_or_default();
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap_or_default();
        assert!(SleepExtractor
            .normalize(&CollectionContext::new(1, None), date, payload)
            .is_empty());
    }
}
