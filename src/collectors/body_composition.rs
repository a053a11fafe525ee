// ABOUTME: Body composition extractor mapping weigh-ins onto measurement rows
// ABOUTME: Converts gram masses to kilograms and keys each row on its exact measurement instant
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use wellness_providers::payloads::{BodyCompositionPayload, WeighIn};
use wellness_providers::utils::conversions::{f64_to_i64, grams_to_kg};
use wellness_providers::WellnessDataSource;

use super::{CollectionContext, MetricExtractor};
use crate::errors::ProviderResult;
use crate::models::{BodyCompositionRecord, MetricFamily, NormalizedRecord};

/// Map one weigh-in; `None` when it has no usable instant
fn weigh_in_record(user_id: i64, weigh_in: WeighIn) -> Option<BodyCompositionRecord> {
    let measurement_time = weigh_in
        .timestamp_gmt
        .or(weigh_in.date)
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())?;
    let measurement_date = weigh_in
        .calendar_date
        .as_deref()
        .and_then(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
        .unwrap_or_else(|| measurement_time.date_naive());

    Some(BodyCompositionRecord {
        user_id,
        measurement_time,
        measurement_date,
        weight_kg: weigh_in.weight.map(grams_to_kg),
        bmi: weigh_in.bmi,
        body_fat_percentage: weigh_in.body_fat,
        body_water_percentage: weigh_in.body_water,
        bone_mass_kg: weigh_in.bone_mass.map(grams_to_kg),
        muscle_mass_kg: weigh_in.muscle_mass.map(grams_to_kg),
        physique_rating: weigh_in.physique_rating.and_then(f64_to_i64),
        visceral_fat_rating: weigh_in.visceral_fat.and_then(f64_to_i64),
        metabolic_age: weigh_in.metabolic_age.and_then(f64_to_i64),
        source_type: weigh_in.source_type,
    })
}

/// Weigh-ins recorded on the date
pub struct BodyCompositionExtractor;

#[async_trait]
impl MetricExtractor for BodyCompositionExtractor {
    type Payload = BodyCompositionPayload;

    fn family(&self) -> MetricFamily {
        MetricFamily::BodyComposition
    }

    async fn fetch(
        &self,
        source: &dyn WellnessDataSource,
        _ctx: &CollectionContext,
        date: NaiveDate,
    ) -> ProviderResult<Self::Payload> {
        source.body_composition(date, date).await
    }

    fn normalize(
        &self,
        ctx: &CollectionContext,
        _date: NaiveDate,
        payload: Self::Payload,
    ) -> Vec<NormalizedRecord> {
        payload
            .date_weight_list
            .into_iter()
            .filter_map(|weigh_in| weigh_in_record(ctx.user_id, weigh_in))
            .map(NormalizedRecord::from)
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_weigh_in_converts_grams_and_rounds_ratings() {
        let payload: BodyCompositionPayload = serde_json::from_value(json!({
            "dateWeightList": [
                {
                    "samplePk": 1,
                    "timestampGMT": 1_709_280_000_000_i64,
                    "calendarDate": "2024-03-01",
                    "weight": 72_450.0,
                    "boneMass": 3100.0,
                    "bodyFat": 17.8,
                    "visceralFat": 6.4,
                    "sourceType": "INDEX_SCALE"
                },
                {"samplePk": 2, "weight": 72_000.0}
            ]
        }))
        .unwrap_or_default();

        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap_or_default();
        let records =
            BodyCompositionExtractor.normalize(&CollectionContext::new(5, None), date, payload);
        assert_eq!(records.len(), 1);

        let NormalizedRecord::BodyComposition(record) = &records[0] else {
            panic!("expected body composition record");
        };
        assert_eq!(record.measurement_date, date);
        assert_eq!(record.weight_kg, Some(72.45));
        assert_eq!(record.bone_mass_kg, Some(3.1));
        assert_eq!(record.visceral_fat_rating, Some(6));
        assert_eq!(record.muscle_mass_kg, None);
        assert_eq!(record.source_type.as_deref(), Some("INDEX_SCALE"));
    }

    #[test]
    fn test_measurement_date_falls_back_to_instant() {
        let weigh_in = WeighIn {
            date: Some(1_709_280_000_000),
            ..WeighIn::default()
        };
        let record = weigh_in_record(1, weigh_in);
        assert_eq!(
            record.map(|r| r.measurement_date),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
    }
}
