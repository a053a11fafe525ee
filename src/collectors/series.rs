// ABOUTME: Tolerant parsing of remote intraday arrays into timestamped points
// ABOUTME: Handles tuple arrays and lists of keyed objects; malformed entries are dropped silently
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

use crate::models::{IntradayMetric, IntradaySample, NormalizedRecord};

/// Layout of one remote intraday array
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesShape {
    /// `[[epoch_ms, value, ...], ...]` with the value at `value_index`
    TupleArray {
        /// Position of the value in each tuple
        value_index: usize,
    },
    /// `[{time_key: instant, value_key: number}, ...]`
    ObjectList {
        /// Key holding the sample instant
        time_key: &'static str,
        /// Key holding the sample value
        value_key: &'static str,
    },
}

/// Timestamp formats the remote uses for naive GMT instants
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse a remote instant
///
/// Accepts epoch milliseconds (integer or float), RFC3339 strings, and naive
/// GMT strings such as `2024-03-01T06:15:00.0` or `2024-03-01 06:15:00`.
#[must_use]
pub fn parse_instant(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(number) => {
            let millis = number
                .as_i64()
                .or_else(|| number.as_f64().filter(|ms| ms.is_finite()).map(|ms| ms as i64))?;
            Utc.timestamp_millis_opt(millis).single()
        }
        Value::String(text) => parse_instant_str(text),
        _ => None,
    }
}

/// Parse a remote instant given as text
#[must_use]
pub fn parse_instant_str(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Some(instant.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| naive.and_utc())
}

/// Convert entries of `shape` into `(instant, value)` points
///
/// An entry is kept only when both its instant and its value parse. Short
/// tuples, nulls and wrong types are skipped.
#[must_use]
pub fn extract_points(shape: SeriesShape, entries: &[Value]) -> Vec<(DateTime<Utc>, f64)> {
    entries
        .iter()
        .filter_map(|entry| match shape {
            SeriesShape::TupleArray { value_index } => {
                let tuple = entry.as_array()?;
                let instant = parse_instant(tuple.first()?)?;
                let value = tuple.get(value_index)?.as_f64()?;
                Some((instant, value))
            }
            SeriesShape::ObjectList {
                time_key,
                value_key,
            } => {
                let object = entry.as_object()?;
                let instant = parse_instant(object.get(time_key)?)?;
                let value = object.get(value_key)?.as_f64()?;
                Some((instant, value))
            }
        })
        .collect()
}

/// Turn points into intraday samples, dropping values the metric does not accept
#[must_use]
pub fn to_samples(
    user_id: i64,
    metric: IntradayMetric,
    points: impl IntoIterator<Item = (DateTime<Utc>, f64)>,
) -> Vec<NormalizedRecord> {
    points
        .into_iter()
        .filter(|(_, value)| metric.accepts(*value))
        .map(|(timestamp, value)| {
            NormalizedRecord::Intraday(IntradaySample {
                user_id,
                metric,
                timestamp,
                value,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_instant_variants() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 6, 15, 0).single();
        assert_eq!(parse_instant(&json!(1_709_273_700_000_i64)), expected);
        assert_eq!(parse_instant(&json!("2024-03-01T06:15:00.0")), expected);
        assert_eq!(parse_instant(&json!("2024-03-01 06:15:00")), expected);
        assert_eq!(parse_instant(&json!("2024-03-01T06:15:00Z")), expected);
        assert_eq!(parse_instant(&json!(null)), None);
        assert_eq!(parse_instant(&json!("yesterday")), None);
    }

    #[test]
    fn test_tuple_array_drops_short_and_null_entries() {
        let entries = vec![
            json!([1_709_273_700_000_i64, 62]),
            json!([1_709_273_820_000_i64]),
            json!([1_709_273_940_000_i64, null]),
            json!("garbage"),
            json!([1_709_274_060_000_i64, 64.5]),
        ];
        let points = extract_points(SeriesShape::TupleArray { value_index: 1 }, &entries);
        assert_eq!(points.len(), 2);
        assert!((points[1].1 - 64.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_object_list_reads_named_keys() {
        let entries = vec![
            json!({"readingTimeGMT": "2024-03-01T02:00:00.0", "hrvValue": 48}),
            json!({"readingTimeGMT": "2024-03-01T02:05:00.0"}),
        ];
        let shape = SeriesShape::ObjectList {
            time_key: "readingTimeGMT",
            value_key: "hrvValue",
        };
        let points = extract_points(shape, &entries);
        assert_eq!(points.len(), 1);
    }

    #[test]
    fn test_negative_counts_are_rejected() {
        let instant = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).single().unwrap_or_default();
        let samples = to_samples(
            1,
            IntradayMetric::Stress,
            vec![(instant, -1.0), (instant, 25.0)],
        );
        assert_eq!(samples.len(), 1);
    }
}
