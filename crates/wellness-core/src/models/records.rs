// ABOUTME: Normalized record types produced by metric extractors and consumed by persistence
// ABOUTME: Sparse Option fields mean "not reported", never zero, so upserts can skip them
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::IntradayMetric;

/// Daily-resolution metrics for one `(date, user_id)`
///
/// Extractors each fill a subset of the attributes. Persistence merges the subset
/// into the stored row, so a `None` leaves the stored column untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyMetricRecord {
    /// Calendar day
    pub date: NaiveDate,
    /// Local user id
    pub user_id: i64,

    /// Step count
    pub total_steps: Option<i64>,
    /// Distance covered in meters
    pub total_distance_meters: Option<f64>,
    /// Seconds of activity
    pub active_seconds: Option<i64>,
    /// Seconds of vigorous activity
    pub highly_active_seconds: Option<i64>,
    /// Seconds sedentary
    pub sedentary_seconds: Option<i64>,
    /// Total kilocalories
    pub calories_total: Option<i64>,
    /// Active kilocalories
    pub calories_active: Option<i64>,
    /// Floors ascended
    pub floors_climbed: Option<i64>,

    /// Resting heart rate in bpm
    pub resting_heart_rate: Option<i64>,
    /// Lowest heart rate in bpm
    pub min_heart_rate: Option<i64>,
    /// Highest heart rate in bpm
    pub max_heart_rate: Option<i64>,
    /// Average stress level
    pub avg_stress_level: Option<i64>,
    /// Peak stress level
    pub max_stress_level: Option<i64>,

    /// Body battery charged over the day
    pub body_battery_charged: Option<i64>,
    /// Body battery drained over the day
    pub body_battery_drained: Option<i64>,
    /// Highest body battery level
    pub body_battery_highest: Option<i64>,
    /// Lowest body battery level
    pub body_battery_lowest: Option<i64>,

    /// Overall sleep score
    pub sleep_score: Option<i64>,
    /// Total sleep in seconds
    pub total_sleep_seconds: Option<i64>,
    /// Deep sleep in seconds
    pub deep_sleep_seconds: Option<i64>,
    /// Light sleep in seconds
    pub light_sleep_seconds: Option<i64>,
    /// REM sleep in seconds
    pub rem_sleep_seconds: Option<i64>,
    /// Awake time during the sleep window in seconds
    pub awake_seconds: Option<i64>,

    /// Water intake in milliliters
    pub hydration_ml: Option<i64>,
    /// Average waking respiration rate
    pub respiration_avg: Option<f64>,
    /// Average SpO2 percentage
    pub spo2_avg: Option<f64>,
    /// Training readiness score
    pub training_readiness_score: Option<i64>,
}

impl DailyMetricRecord {
    /// Empty patch for one day
    #[must_use]
    pub fn new(date: NaiveDate, user_id: i64) -> Self {
        Self {
            date,
            user_id,
            ..Self::default()
        }
    }

    /// True when no attribute is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let counts = [
            self.total_steps,
            self.active_seconds,
            self.highly_active_seconds,
            self.sedentary_seconds,
            self.calories_total,
            self.calories_active,
            self.floors_climbed,
            self.resting_heart_rate,
            self.min_heart_rate,
            self.max_heart_rate,
            self.avg_stress_level,
            self.max_stress_level,
            self.body_battery_charged,
            self.body_battery_drained,
            self.body_battery_highest,
            self.body_battery_lowest,
            self.sleep_score,
            self.total_sleep_seconds,
            self.deep_sleep_seconds,
            self.light_sleep_seconds,
            self.rem_sleep_seconds,
            self.awake_seconds,
            self.hydration_ml,
            self.training_readiness_score,
        ];
        let reals = [
            self.total_distance_meters,
            self.respiration_avg,
            self.spo2_avg,
        ];
        counts.iter().all(Option::is_none) && reals.iter().all(Option::is_none)
    }
}

/// One recorded activity, keyed globally by the remote activity id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Remote activity id
    pub activity_id: String,
    /// Local user id
    pub user_id: i64,
    /// Activity title
    pub activity_name: Option<String>,
    /// Remote activity type key (e.g. `running`)
    pub activity_type: Option<String>,
    /// Remote sport/event type key
    pub sport_type: Option<String>,
    /// Start in the device's local time, as reported
    pub start_time_local: Option<String>,
    /// Start instant
    pub start_time_gmt: Option<DateTime<Utc>>,
    /// Elapsed duration in seconds
    pub duration_seconds: Option<f64>,
    /// Distance in meters
    pub distance_meters: Option<f64>,
    /// Elevation gain in meters
    pub elevation_gain_meters: Option<f64>,
    /// Elevation loss in meters
    pub elevation_loss_meters: Option<f64>,
    /// Average speed in m/s
    pub avg_speed_mps: Option<f64>,
    /// Max speed in m/s
    pub max_speed_mps: Option<f64>,
    /// Average heart rate in bpm
    pub avg_heart_rate: Option<i64>,
    /// Max heart rate in bpm
    pub max_heart_rate: Option<i64>,
    /// Kilocalories
    pub calories: Option<i64>,
    /// Average power in watts
    pub avg_power_watts: Option<i64>,
    /// Max power in watts
    pub max_power_watts: Option<i64>,
    /// Aerobic training effect
    pub training_effect_aerobic: Option<f64>,
    /// Anaerobic training effect
    pub training_effect_anaerobic: Option<f64>,
    /// Start latitude
    pub start_latitude: Option<f64>,
    /// Start longitude
    pub start_longitude: Option<f64>,
    /// End latitude
    pub end_latitude: Option<f64>,
    /// End longitude
    pub end_longitude: Option<f64>,
    /// Whether the activity was entered by hand
    pub manual_activity: Option<bool>,
    /// Recording device id
    pub device_id: Option<String>,
    /// Payload as received, for later reprocessing
    pub raw_json: Option<String>,
}

/// One night of sleep for `(calendar_date, user_id)`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SleepRecord {
    /// Night's calendar date (the wake-up day)
    pub calendar_date: NaiveDate,
    /// Local user id
    pub user_id: i64,
    /// Remote sleep session id
    pub sleep_id: Option<String>,
    /// Sleep start instant
    pub sleep_start: Option<DateTime<Utc>>,
    /// Sleep end instant
    pub sleep_end: Option<DateTime<Utc>>,
    /// Deep sleep in seconds
    pub deep_sleep_seconds: Option<i64>,
    /// Light sleep in seconds
    pub light_sleep_seconds: Option<i64>,
    /// REM sleep in seconds
    pub rem_sleep_seconds: Option<i64>,
    /// Awake in seconds
    pub awake_seconds: Option<i64>,
    /// Seconds the device could not classify
    pub unmeasurable_seconds: Option<i64>,
    /// Overall sleep score
    pub overall_sleep_score: Option<i64>,
    /// Average respiration during sleep
    pub avg_respiration: Option<f64>,
    /// Average SpO2 during sleep
    pub avg_spo2: Option<f64>,
    /// Lowest SpO2 during sleep
    pub lowest_spo2: Option<f64>,
    /// Highest SpO2 during sleep
    pub highest_spo2: Option<f64>,
    /// Average overnight HRV
    pub avg_hrv: Option<f64>,
    /// Count of restless moments
    pub restless_moments_count: Option<i64>,
    /// Payload as received
    pub raw_json: Option<String>,
}

impl SleepRecord {
    /// Sum of classified stage durations, if any stage was reported
    #[must_use]
    pub fn total_sleep_seconds(&self) -> Option<i64> {
        let stages = [
            self.deep_sleep_seconds,
            self.light_sleep_seconds,
            self.rem_sleep_seconds,
        ];
        stages
            .iter()
            .flatten()
            .copied()
            .reduce(|acc, secs| acc + secs)
    }
}

/// One weigh-in, identified by its exact measurement instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyCompositionRecord {
    /// Local user id
    pub user_id: i64,
    /// Exact weigh-in instant
    pub measurement_time: DateTime<Utc>,
    /// Calendar day of the weigh-in
    pub measurement_date: NaiveDate,
    /// Weight in kilograms
    pub weight_kg: Option<f64>,
    /// Body mass index
    pub bmi: Option<f64>,
    /// Body fat percentage
    pub body_fat_percentage: Option<f64>,
    /// Body water percentage
    pub body_water_percentage: Option<f64>,
    /// Bone mass in kilograms
    pub bone_mass_kg: Option<f64>,
    /// Muscle mass in kilograms
    pub muscle_mass_kg: Option<f64>,
    /// Physique rating
    pub physique_rating: Option<i64>,
    /// Visceral fat rating
    pub visceral_fat_rating: Option<i64>,
    /// Metabolic age in years
    pub metabolic_age: Option<i64>,
    /// Source device type (e.g. `INDEX_SCALE`, `MANUAL`)
    pub source_type: Option<String>,
}

/// One timestamped sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntradaySample {
    /// Local user id
    pub user_id: i64,
    /// What was measured
    pub metric: IntradayMetric,
    /// Sample instant
    pub timestamp: DateTime<Utc>,
    /// Measured value
    pub value: f64,
}

/// Original activity file as downloaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityFile {
    /// Remote activity id
    pub activity_id: String,
    /// Local user id
    pub user_id: i64,
    /// File format label
    pub format: String,
    /// SHA-256 of `content`, lowercase hex
    pub sha256: String,
    /// File bytes
    #[serde(skip)]
    pub content: Vec<u8>,
}

/// Output of an extractor's normalization step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NormalizedRecord {
    /// Sparse daily patch
    Daily(Box<DailyMetricRecord>),
    /// Activity row
    Activity(Box<ActivityRecord>),
    /// Sleep row
    Sleep(Box<SleepRecord>),
    /// Weigh-in row
    BodyComposition(Box<BodyCompositionRecord>),
    /// Intraday sample
    Intraday(IntradaySample),
    /// Downloaded file
    ActivityFile(Box<ActivityFile>),
}

impl NormalizedRecord {
    /// Entity name for logs
    #[must_use]
    pub const fn entity(&self) -> &'static str {
        match self {
            Self::Daily(_) => "daily_metrics",
            Self::Activity(_) => "activities",
            Self::Sleep(_) => "sleep_data",
            Self::BodyComposition(_) => "body_composition",
            Self::Intraday(_) => "intraday_samples",
            Self::ActivityFile(_) => "activity_files",
        }
    }
}

impl From<DailyMetricRecord> for NormalizedRecord {
    fn from(record: DailyMetricRecord) -> Self {
        Self::Daily(Box::new(record))
    }
}

impl From<ActivityRecord> for NormalizedRecord {
    fn from(record: ActivityRecord) -> Self {
        Self::Activity(Box::new(record))
    }
}

impl From<SleepRecord> for NormalizedRecord {
    fn from(record: SleepRecord) -> Self {
        Self::Sleep(Box::new(record))
    }
}

impl From<BodyCompositionRecord> for NormalizedRecord {
    fn from(record: BodyCompositionRecord) -> Self {
        Self::BodyComposition(Box::new(record))
    }
}

impl From<IntradaySample> for NormalizedRecord {
    fn from(sample: IntradaySample) -> Self {
        Self::Intraday(sample)
    }
}

impl From<ActivityFile> for NormalizedRecord {
    fn from(file: ActivityFile) -> Self {
        Self::ActivityFile(Box::new(file))
    }
}

/// Remote account identity, upserted at the start of every run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfileRecord {
    /// Remote user id
    pub remote_user_id: String,
    /// Display name used in remote URL paths
    pub display_name: Option<String>,
    /// Full name
    pub full_name: Option<String>,
    /// Avatar URL
    pub profile_image_url: Option<String>,
    /// Locale tag
    pub locale: Option<String>,
    /// IANA time zone
    pub timezone: Option<String>,
    /// `metric` or `statute_us`
    pub measurement_system: Option<String>,
}
