// ABOUTME: Activity extractors for recorded activities and their original files
// ABOUTME: Activities are keyed by remote id; files are downloaded under the slower download rate class
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;
use bytes::Bytes;
use chrono::NaiveDate;
use sha2::{Digest, Sha256};
use tracing::debug;
use wellness_providers::payloads::ActivityPayload;
use wellness_providers::utils::conversions::f64_to_i64;
use wellness_providers::WellnessDataSource;

use super::series::parse_instant_str;
use super::{CollectionContext, MetricExtractor};
use crate::errors::ProviderResult;
use crate::models::{ActivityFile, ActivityRecord, MetricFamily, NormalizedRecord};

/// Format label stored with downloaded files
pub const ORIGINAL_FILE_FORMAT: &str = "original";

/// Map one remote activity onto an activity row
///
/// Returns `None` when the payload carries no activity id.
#[must_use]
pub fn activity_record(user_id: i64, payload: &ActivityPayload) -> Option<ActivityRecord> {
    let activity_id = payload.activity_id?.to_string();

    Some(ActivityRecord {
        activity_id,
        user_id,
        activity_name: payload.activity_name.clone(),
        activity_type: payload
            .activity_type
            .as_ref()
            .and_then(|kind| kind.type_key.clone()),
        sport_type: payload
            .event_type
            .as_ref()
            .and_then(|kind| kind.type_key.clone()),
        start_time_local: payload.start_time_local.clone(),
        start_time_gmt: payload
            .start_time_gmt
            .as_deref()
            .and_then(parse_instant_str),
        duration_seconds: payload.duration,
        distance_meters: payload.distance,
        elevation_gain_meters: payload.elevation_gain,
        elevation_loss_meters: payload.elevation_loss,
        avg_speed_mps: payload.average_speed,
        max_speed_mps: payload.max_speed,
        avg_heart_rate: payload.average_hr.and_then(f64_to_i64),
        max_heart_rate: payload.max_hr.and_then(f64_to_i64),
        calories: payload.calories.and_then(f64_to_i64),
        avg_power_watts: payload.avg_power.and_then(f64_to_i64),
        max_power_watts: payload.max_power.and_then(f64_to_i64),
        training_effect_aerobic: payload.aerobic_training_effect,
        training_effect_anaerobic: payload.anaerobic_training_effect,
        start_latitude: payload.start_latitude,
        start_longitude: payload.start_longitude,
        end_latitude: payload.end_latitude,
        end_longitude: payload.end_longitude,
        manual_activity: payload.manual_activity,
        device_id: payload.device_id.map(|id| id.to_string()),
        raw_json: serde_json::to_string(payload).ok(),
    })
}

/// Activities started on the date
pub struct ActivitiesExtractor;

#[async_trait]
impl MetricExtractor for ActivitiesExtractor {
    type Payload = Vec<ActivityPayload>;

    fn family(&self) -> MetricFamily {
        MetricFamily::Activities
    }

    async fn fetch(
        &self,
        source: &dyn WellnessDataSource,
        _ctx: &CollectionContext,
        date: NaiveDate,
    ) -> ProviderResult<Self::Payload> {
        source.activities(date, date).await
    }

    fn normalize(
        &self,
        ctx: &CollectionContext,
        _date: NaiveDate,
        payload: Self::Payload,
    ) -> Vec<NormalizedRecord> {
        payload
            .iter()
            .filter_map(|activity| activity_record(ctx.user_id, activity))
            .map(NormalizedRecord::from)
            .collect()
    }
}

/// Original files of the activities started on the date
///
/// Every download must succeed for the unit to succeed; stored files are never
/// replaced, so a retried unit only adds what is missing.
pub struct ActivityFilesExtractor;

#[async_trait]
impl MetricExtractor for ActivityFilesExtractor {
    type Payload = Vec<(String, Bytes)>;

    fn family(&self) -> MetricFamily {
        MetricFamily::ActivityFiles
    }

    async fn fetch(
        &self,
        source: &dyn WellnessDataSource,
        _ctx: &CollectionContext,
        date: NaiveDate,
    ) -> ProviderResult<Self::Payload> {
        let activities = source.activities(date, date).await?;
        let mut files = Vec::with_capacity(activities.len());
        for activity_id in activities.iter().filter_map(|a| a.activity_id) {
            let activity_id = activity_id.to_string();
            let content = source.download_activity_file(&activity_id).await?;
            debug!(activity_id = %activity_id, bytes = content.len(), "Downloaded activity file");
            files.push((activity_id, content));
        }
        Ok(files)
    }

    fn normalize(
        &self,
        ctx: &CollectionContext,
        _date: NaiveDate,
        payload: Self::Payload,
    ) -> Vec<NormalizedRecord> {
        payload
            .into_iter()
            .filter(|(_, content)| !content.is_empty())
            .map(|(activity_id, content)| {
                NormalizedRecord::from(ActivityFile {
                    activity_id,
                    user_id: ctx.user_id,
                    format: ORIGINAL_FILE_FORMAT.to_owned(),
                    sha256: hex::encode(Sha256::digest(&content)),
                    content: content.to_vec(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn test_activity_record_maps_nested_types_and_rounds() {
        let payload: ActivityPayload = serde_json::from_value(json!({
            "activityId": 14_523_001_i64,
            "activityName": "Morning Run",
            "activityType": {"typeKey": "running"},
            "eventType": {"typeKey": "training"},
            "startTimeGMT": "2024-03-01 06:15:00",
            "averageHR": 148.6,
            "calories": 612.0,
            "vO2MaxValue": 51.0
        }))
        .unwrap_or_default();

        let record = activity_record(2, &payload).unwrap_or_default();
        assert_eq!(record.activity_id, "14523001");
        assert_eq!(record.activity_type.as_deref(), Some("running"));
        assert_eq!(record.sport_type.as_deref(), Some("training"));
        assert_eq!(record.avg_heart_rate, Some(149));
        assert_eq!(record.calories, Some(612));
        assert_eq!(
            record.start_time_gmt,
            Utc.with_ymd_and_hms(2024, 3, 1, 6, 15, 0).single()
        );
        assert!(record
            .raw_json
            .as_deref()
            .is_some_and(|raw| raw.contains("vO2MaxValue")));
        assert_eq!(record.distance_meters, None);
    }

    #[test]
    fn test_activity_without_id_is_skipped() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap_or_default();
        let records = ActivitiesExtractor.normalize(
            &CollectionContext::new(1, None),
            date,
            vec![ActivityPayload::default()],
        );
        assert!(records.is_empty());
    }

    #[test]
    fn test_activity_file_digest() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap_or_default();
        let records = ActivityFilesExtractor.normalize(
            &CollectionContext::new(1, None),
            date,
            vec![
                ("1".to_owned(), Bytes::from_static(b"abc")),
                ("2".to_owned(), Bytes::new()),
            ],
        );
        assert_eq!(records.len(), 1);
        assert!(matches!(
            &records[0],
            NormalizedRecord::ActivityFile(file)
                if file.sha256 == "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        ));
    }
}
