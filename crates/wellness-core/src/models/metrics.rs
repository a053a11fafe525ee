// ABOUTME: Metric family and intraday metric enumerations used to select and label collection units
// ABOUTME: Parses user-facing metric names and classifies intraday values as count-like or signed
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One family of remote data, fetched by exactly one extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricFamily {
    /// Steps, distance, calories, floors and activity minutes
    DailySummary,
    /// Resting, min and max heart rate for the day
    HeartRateSummary,
    /// Average and max stress for the day
    StressSummary,
    /// Body battery charged, drained, highest and lowest
    BodyBatterySummary,
    /// Water intake
    Hydration,
    /// Training readiness score
    TrainingReadiness,
    /// Nightly sleep session
    Sleep,
    /// Recorded activities
    Activities,
    /// Weigh-ins and body composition scale readings
    BodyComposition,
    /// Heart rate samples
    IntradayHeartRate,
    /// Stress samples
    IntradayStress,
    /// Body battery samples
    IntradayBodyBattery,
    /// Sleep stage transitions
    IntradaySleepStages,
    /// Overnight HRV readings
    IntradayHrv,
    /// Respiration samples
    IntradayRespiration,
    /// Step count buckets
    IntradaySteps,
    /// Original activity files (binary download)
    ActivityFiles,
}

impl MetricFamily {
    /// Every family, in registry order
    pub const ALL: [Self; 17] = [
        Self::DailySummary,
        Self::HeartRateSummary,
        Self::StressSummary,
        Self::BodyBatterySummary,
        Self::Hydration,
        Self::TrainingReadiness,
        Self::Sleep,
        Self::Activities,
        Self::BodyComposition,
        Self::IntradayHeartRate,
        Self::IntradayStress,
        Self::IntradayBodyBattery,
        Self::IntradaySleepStages,
        Self::IntradayHrv,
        Self::IntradayRespiration,
        Self::IntradaySteps,
        Self::ActivityFiles,
    ];

    /// Stable name used in logs, ledger messages and on the command line
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DailySummary => "daily_summary",
            Self::HeartRateSummary => "heart_rate_summary",
            Self::StressSummary => "stress_summary",
            Self::BodyBatterySummary => "body_battery_summary",
            Self::Hydration => "hydration",
            Self::TrainingReadiness => "training_readiness",
            Self::Sleep => "sleep",
            Self::Activities => "activities",
            Self::BodyComposition => "body_composition",
            Self::IntradayHeartRate => "intraday_heart_rate",
            Self::IntradayStress => "intraday_stress",
            Self::IntradayBodyBattery => "intraday_body_battery",
            Self::IntradaySleepStages => "intraday_sleep_stages",
            Self::IntradayHrv => "intraday_hrv",
            Self::IntradayRespiration => "intraday_respiration",
            Self::IntradaySteps => "intraday_steps",
            Self::ActivityFiles => "activity_files",
        }
    }

    /// Whether this family produces timestamped samples rather than a daily row
    #[must_use]
    pub const fn is_intraday(self) -> bool {
        matches!(
            self,
            Self::IntradayHeartRate
                | Self::IntradayStress
                | Self::IntradayBodyBattery
                | Self::IntradaySleepStages
                | Self::IntradayHrv
                | Self::IntradayRespiration
                | Self::IntradaySteps
        )
    }

    /// Whether the family is collected unless explicitly enabled
    ///
    /// File downloads are opt-in.
    #[must_use]
    pub const fn enabled_by_default(self) -> bool {
        !matches!(self, Self::ActivityFiles)
    }
}

impl fmt::Display for MetricFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|family| family.as_str() == wanted)
            .ok_or_else(|| format!("unknown metric family: {s}"))
    }
}

/// Kind of value carried by an intraday sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntradayMetric {
    /// Beats per minute
    HeartRate,
    /// Stress level 0-100 (negative values mark unmeasurable periods)
    Stress,
    /// Body battery level 0-100
    BodyBattery,
    /// Sleep stage code (0 deep, 1 light, 2 REM, 3 awake)
    SleepStage,
    /// HRV in milliseconds
    Hrv,
    /// Breaths per minute (negative values mark unmeasurable periods)
    Respiration,
    /// Steps in the bucket
    Steps,
}

impl IntradayMetric {
    /// Stable name stored in the `metric` column
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HeartRate => "heart_rate",
            Self::Stress => "stress",
            Self::BodyBattery => "body_battery",
            Self::SleepStage => "sleep_stage",
            Self::Hrv => "hrv",
            Self::Respiration => "respiration",
            Self::Steps => "steps",
        }
    }

    /// Count-like metrics reject negative values during normalization
    ///
    /// The remote encodes unmeasurable periods as negative sentinels for these.
    #[must_use]
    pub const fn is_count_like(self) -> bool {
        matches!(
            self,
            Self::HeartRate
                | Self::Stress
                | Self::BodyBattery
                | Self::SleepStage
                | Self::Respiration
                | Self::Steps
        )
    }

    /// Whether `value` is acceptable as a sample of this metric
    #[must_use]
    pub fn accepts(self, value: f64) -> bool {
        value.is_finite() && (!self.is_count_like() || value >= 0.0)
    }
}

impl fmt::Display for IntradayMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_family_parse_accepts_dashes_and_case() {
        assert_eq!(
            "Intraday-Heart-Rate".parse::<MetricFamily>(),
            Ok(MetricFamily::IntradayHeartRate)
        );
        assert!("weather".parse::<MetricFamily>().is_err());
    }

    #[test]
    fn test_names_round_trip_for_every_family() {
        for family in MetricFamily::ALL {
            assert_eq!(family.as_str().parse::<MetricFamily>(), Ok(family));
        }
    }

    #[test]
    fn test_count_like_rejects_negative() {
        assert!(!IntradayMetric::Stress.accepts(-1.0));
        assert!(!IntradayMetric::HeartRate.accepts(f64::NAN));
        assert!(IntradayMetric::Hrv.accepts(-3.5));
        assert!(IntradayMetric::Steps.accepts(0.0));
    }
}
