// ABOUTME: Typed remote payloads returned by the data source, one struct per metric family
// ABOUTME: Every field is optional; intraday arrays stay as raw JSON values for tolerant parsing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Remote payload DTOs.
//!
//! The remote omits fields freely and occasionally truncates arrays, so every scalar
//! is an `Option` and every tuple array is kept as `Vec<serde_json::Value>`; the
//! extractors decide what to accept.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Account identity
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfilePayload {
    /// Remote profile id
    pub profile_id: Option<i64>,
    /// Display name used in URL paths
    pub display_name: Option<String>,
    /// Full name
    pub full_name: Option<String>,
    /// Large avatar URL
    pub profile_image_url_large: Option<String>,
    /// Location string
    pub location: Option<String>,
}

/// Daily totals
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DailySummaryPayload {
    /// `YYYY-MM-DD`
    pub calendar_date: Option<String>,
    /// Step count
    pub total_steps: Option<i64>,
    /// Distance in meters
    pub total_distance_meters: Option<f64>,
    /// Active seconds
    pub active_seconds: Option<i64>,
    /// Highly active seconds
    pub highly_active_seconds: Option<i64>,
    /// Sedentary seconds
    pub sedentary_seconds: Option<i64>,
    /// Total kilocalories
    pub total_kilocalories: Option<f64>,
    /// Active kilocalories
    pub active_kilocalories: Option<f64>,
    /// Floors ascended (fractional)
    pub floors_ascended: Option<f64>,
    /// Average SpO2
    pub average_spo2: Option<f64>,
    /// Average waking respiration
    pub avg_waking_respiration_value: Option<f64>,
}

/// Heart rate for one day
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeartRatePayload {
    /// `YYYY-MM-DD`
    pub calendar_date: Option<String>,
    /// Resting heart rate
    pub resting_heart_rate: Option<i64>,
    /// Lowest heart rate
    pub min_heart_rate: Option<i64>,
    /// Highest heart rate
    pub max_heart_rate: Option<i64>,
    /// `[epoch_ms, bpm]` tuples
    pub heart_rate_values: Option<Vec<Value>>,
}

/// Stress for one day
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StressPayload {
    /// `YYYY-MM-DD`
    pub calendar_date: Option<String>,
    /// Average stress
    pub avg_stress_level: Option<i64>,
    /// Peak stress
    pub max_stress_level: Option<i64>,
    /// `[epoch_ms, level]` tuples
    pub stress_values_array: Option<Vec<Value>>,
    /// `[epoch_ms, status, level, version]` tuples
    pub body_battery_values_array: Option<Vec<Value>>,
}

/// One body battery daily report
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BodyBatteryReport {
    /// `YYYY-MM-DD`
    pub date: Option<String>,
    /// Charged over the day
    pub charged: Option<i64>,
    /// Drained over the day
    pub drained: Option<i64>,
    /// `[epoch_ms, level]` tuples
    pub body_battery_values_array: Option<Vec<Value>>,
}

/// Water intake
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HydrationPayload {
    /// `YYYY-MM-DD`
    pub calendar_date: Option<String>,
    /// Intake in milliliters
    #[serde(rename = "valueInML")]
    pub value_in_ml: Option<f64>,
    /// Goal in milliliters
    #[serde(rename = "goalInML")]
    pub goal_in_ml: Option<f64>,
}

/// One training readiness evaluation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrainingReadinessEntry {
    /// `YYYY-MM-DD`
    pub calendar_date: Option<String>,
    /// Evaluation time
    pub timestamp: Option<String>,
    /// Score 0-100
    pub score: Option<i64>,
    /// Level label
    pub level: Option<String>,
}

/// Nested score value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoreValue {
    /// Numeric score
    pub value: Option<i64>,
}

/// Sleep score breakdown
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SleepScores {
    /// Overall score
    pub overall: Option<ScoreValue>,
}

/// Nightly sleep summary
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DailySleepDto {
    /// Session id
    pub id: Option<i64>,
    /// `YYYY-MM-DD`
    pub calendar_date: Option<String>,
    /// Start, epoch ms
    #[serde(rename = "sleepStartTimestampGMT")]
    pub sleep_start_timestamp_gmt: Option<i64>,
    /// End, epoch ms
    #[serde(rename = "sleepEndTimestampGMT")]
    pub sleep_end_timestamp_gmt: Option<i64>,
    /// Deep sleep seconds
    pub deep_sleep_seconds: Option<i64>,
    /// Light sleep seconds
    pub light_sleep_seconds: Option<i64>,
    /// REM sleep seconds
    pub rem_sleep_seconds: Option<i64>,
    /// Awake seconds
    pub awake_sleep_seconds: Option<i64>,
    /// Unclassified seconds
    pub unmeasurable_sleep_seconds: Option<i64>,
    /// Average respiration
    pub average_respiration_value: Option<f64>,
    /// Average SpO2
    #[serde(rename = "averageSpO2Value")]
    pub average_spo2_value: Option<f64>,
    /// Lowest SpO2
    #[serde(rename = "lowestSpO2Value")]
    pub lowest_spo2_value: Option<f64>,
    /// Highest SpO2
    #[serde(rename = "highestSpO2Value")]
    pub highest_spo2_value: Option<f64>,
    /// Scores
    pub sleep_scores: Option<SleepScores>,
}

/// Sleep for one night
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SleepPayload {
    /// Summary
    #[serde(rename = "dailySleepDTO")]
    pub daily_sleep_dto: Option<DailySleepDto>,
    /// Stage transitions: objects with `startGMT`, `endGMT`, `activityLevel`
    pub sleep_levels: Option<Vec<Value>>,
    /// Restless moments
    pub restless_moments_count: Option<i64>,
    /// Average overnight HRV
    pub avg_overnight_hrv: Option<f64>,
    /// Fields not modeled above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Overnight HRV
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HrvPayload {
    /// Readings: objects with `hrvValue` and `readingTimeGMT`
    pub hrv_readings: Option<Vec<Value>>,
}

/// Respiration for one day
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RespirationPayload {
    /// `YYYY-MM-DD`
    pub calendar_date: Option<String>,
    /// Average waking respiration
    pub avg_waking_respiration_value: Option<f64>,
    /// `[epoch_ms, breaths_per_minute]` tuples
    pub respiration_values_array: Option<Vec<Value>>,
}

/// One step chart bucket
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StepsBucket {
    /// Bucket start
    #[serde(rename = "startGMT")]
    pub start_gmt: Option<String>,
    /// Bucket end
    #[serde(rename = "endGMT")]
    pub end_gmt: Option<String>,
    /// Steps in the bucket
    pub steps: Option<f64>,
    /// Activity level label
    pub primary_activity_level: Option<String>,
}

/// Remote type reference (`activityType`, `eventType`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TypeRef {
    /// Type key
    pub type_key: Option<String>,
}

/// One activity as listed by the remote
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivityPayload {
    /// Activity id
    pub activity_id: Option<i64>,
    /// Title
    pub activity_name: Option<String>,
    /// Activity type
    pub activity_type: Option<TypeRef>,
    /// Event type
    pub event_type: Option<TypeRef>,
    /// Local start time, `YYYY-MM-DD HH:MM:SS`
    pub start_time_local: Option<String>,
    /// UTC start time, `YYYY-MM-DD HH:MM:SS`
    #[serde(rename = "startTimeGMT")]
    pub start_time_gmt: Option<String>,
    /// Duration in seconds
    pub duration: Option<f64>,
    /// Distance in meters
    pub distance: Option<f64>,
    /// Elevation gain in meters
    pub elevation_gain: Option<f64>,
    /// Elevation loss in meters
    pub elevation_loss: Option<f64>,
    /// Average speed in m/s
    pub average_speed: Option<f64>,
    /// Max speed in m/s
    pub max_speed: Option<f64>,
    /// Average heart rate
    #[serde(rename = "averageHR")]
    pub average_hr: Option<f64>,
    /// Max heart rate
    #[serde(rename = "maxHR")]
    pub max_hr: Option<f64>,
    /// Kilocalories
    pub calories: Option<f64>,
    /// Average power
    pub avg_power: Option<f64>,
    /// Max power
    pub max_power: Option<f64>,
    /// Aerobic training effect
    pub aerobic_training_effect: Option<f64>,
    /// Anaerobic training effect
    pub anaerobic_training_effect: Option<f64>,
    /// Start latitude
    pub start_latitude: Option<f64>,
    /// Start longitude
    pub start_longitude: Option<f64>,
    /// End latitude
    pub end_latitude: Option<f64>,
    /// End longitude
    pub end_longitude: Option<f64>,
    /// Hand-entered activity
    pub manual_activity: Option<bool>,
    /// Recording device
    pub device_id: Option<i64>,
    /// Fields not modeled above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One weigh-in
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WeighIn {
    /// Remote sample key
    pub sample_pk: Option<i64>,
    /// Measurement instant, epoch ms
    pub date: Option<i64>,
    /// Measurement instant, epoch ms (UTC)
    #[serde(rename = "timestampGMT")]
    pub timestamp_gmt: Option<i64>,
    /// `YYYY-MM-DD`
    pub calendar_date: Option<String>,
    /// Weight in grams
    pub weight: Option<f64>,
    /// Body mass index
    pub bmi: Option<f64>,
    /// Body fat percentage
    pub body_fat: Option<f64>,
    /// Body water percentage
    pub body_water: Option<f64>,
    /// Bone mass in grams
    pub bone_mass: Option<f64>,
    /// Muscle mass in grams
    pub muscle_mass: Option<f64>,
    /// Physique rating
    pub physique_rating: Option<f64>,
    /// Visceral fat rating
    pub visceral_fat: Option<f64>,
    /// Metabolic age
    pub metabolic_age: Option<f64>,
    /// Source type label
    pub source_type: Option<String>,
}

/// Weigh-ins in a date range
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BodyCompositionPayload {
    /// Individual weigh-ins
    pub date_weight_list: Vec<WeighIn>,
}

/// Device upload status
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceLastUsedPayload {
    /// Last upload, epoch ms
    pub last_used_device_upload_time: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_payload_keeps_unmodeled_fields() {
        let json = r#"{"activityId": 42, "averageHR": 151.0, "vO2MaxValue": 52.0}"#;
        let payload: ActivityPayload = serde_json::from_str(json).unwrap_or_default();
        assert_eq!(payload.activity_id, Some(42));
        assert_eq!(payload.average_hr, Some(151.0));
        assert!(payload.extra.contains_key("vO2MaxValue"));
    }

    #[test]
    fn test_sleep_payload_reads_nested_scores() {
        let json = r#"{
            "dailySleepDTO": {
                "calendarDate": "2024-03-01",
                "averageSpO2Value": 95.0,
                "sleepScores": {"overall": {"value": 81}}
            },
            "sleepLevels": []
        }"#;
        let payload: SleepPayload = serde_json::from_str(json).unwrap_or_default();
        let dto = payload.daily_sleep_dto.unwrap_or_default();
        assert_eq!(dto.average_spo2_value, Some(95.0));
        assert_eq!(
            dto.sleep_scores
                .and_then(|scores| scores.overall)
                .and_then(|overall| overall.value),
            Some(81)
        );
    }
}
