// ABOUTME: Sleep session database operations keyed by (calendar_date, user_id)
// ABOUTME: Same sparse upsert semantics as daily metrics
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{format_date, parse_date, parse_optional_timestamp, Database};
use crate::errors::{AppError, AppResult};
use crate::models::SleepRecord;
use chrono::{NaiveDate, Utc};
use sqlx::Row;

impl Database {
    pub(super) async fn migrate_sleep(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS sleep_data (
                calendar_date TEXT NOT NULL,
                user_id INTEGER NOT NULL,
                sleep_id TEXT,
                sleep_start TEXT,
                sleep_end TEXT,
                deep_sleep_seconds INTEGER,
                light_sleep_seconds INTEGER,
                rem_sleep_seconds INTEGER,
                awake_seconds INTEGER,
                unmeasurable_seconds INTEGER,
                overall_sleep_score INTEGER,
                avg_respiration REAL,
                avg_spo2 REAL,
                lowest_spo2 REAL,
                highest_spo2 REAL,
                avg_hrv REAL,
                restless_moments_count INTEGER,
                raw_json TEXT,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (calendar_date, user_id)
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create sleep_data table: {e}")))?;

        Ok(())
    }

    /// Create or merge one night of sleep
    ///
    /// # Errors
    ///
    /// Returns an error if the upsert fails
    pub async fn upsert_sleep(&self, sleep: &SleepRecord) -> AppResult<u64> {
        let result = sqlx::query(
            r"
            INSERT INTO sleep_data (
                calendar_date, user_id, sleep_id, sleep_start, sleep_end,
                deep_sleep_seconds, light_sleep_seconds, rem_sleep_seconds, awake_seconds,
                unmeasurable_seconds, overall_sleep_score, avg_respiration, avg_spo2,
                lowest_spo2, highest_spo2, avg_hrv, restless_moments_count, raw_json, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19
            )
            ON CONFLICT(calendar_date, user_id) DO UPDATE SET
                sleep_id = COALESCE(excluded.sleep_id, sleep_id),
                sleep_start = COALESCE(excluded.sleep_start, sleep_start),
                sleep_end = COALESCE(excluded.sleep_end, sleep_end),
                deep_sleep_seconds = COALESCE(excluded.deep_sleep_seconds, deep_sleep_seconds),
                light_sleep_seconds = COALESCE(excluded.light_sleep_seconds, light_sleep_seconds),
                rem_sleep_seconds = COALESCE(excluded.rem_sleep_seconds, rem_sleep_seconds),
                awake_seconds = COALESCE(excluded.awake_seconds, awake_seconds),
                unmeasurable_seconds = COALESCE(excluded.unmeasurable_seconds, unmeasurable_seconds),
                overall_sleep_score = COALESCE(excluded.overall_sleep_score, overall_sleep_score),
                avg_respiration = COALESCE(excluded.avg_respiration, avg_respiration),
                avg_spo2 = COALESCE(excluded.avg_spo2, avg_spo2),
                lowest_spo2 = COALESCE(excluded.lowest_spo2, lowest_spo2),
                highest_spo2 = COALESCE(excluded.highest_spo2, highest_spo2),
                avg_hrv = COALESCE(excluded.avg_hrv, avg_hrv),
                restless_moments_count = COALESCE(excluded.restless_moments_count, restless_moments_count),
                raw_json = COALESCE(excluded.raw_json, raw_json),
                updated_at = excluded.updated_at
            ",
        )
        .bind(format_date(sleep.calendar_date))
        .bind(sleep.user_id)
        .bind(&sleep.sleep_id)
        .bind(sleep.sleep_start.map(|ts| ts.to_rfc3339()))
        .bind(sleep.sleep_end.map(|ts| ts.to_rfc3339()))
        .bind(sleep.deep_sleep_seconds)
        .bind(sleep.light_sleep_seconds)
        .bind(sleep.rem_sleep_seconds)
        .bind(sleep.awake_seconds)
        .bind(sleep.unmeasurable_seconds)
        .bind(sleep.overall_sleep_score)
        .bind(sleep.avg_respiration)
        .bind(sleep.avg_spo2)
        .bind(sleep.lowest_spo2)
        .bind(sleep.highest_spo2)
        .bind(sleep.avg_hrv)
        .bind(sleep.restless_moments_count)
        .bind(&sleep.raw_json)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to upsert sleep data: {e}")))?;

        Ok(result.rows_affected())
    }

    /// Stored sleep for one night
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or stored values cannot be parsed
    pub async fn get_sleep(
        &self,
        calendar_date: NaiveDate,
        user_id: i64,
    ) -> AppResult<Option<SleepRecord>> {
        let row =
            sqlx::query("SELECT * FROM sleep_data WHERE calendar_date = ?1 AND user_id = ?2")
                .bind(format_date(calendar_date))
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| AppError::database(format!("Failed to get sleep data: {e}")))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let calendar_date: String = row.get("calendar_date");
        Ok(Some(SleepRecord {
            calendar_date: parse_date("sleep_data.calendar_date", &calendar_date)?,
            user_id: row.get("user_id"),
            sleep_id: row.get("sleep_id"),
            sleep_start: parse_optional_timestamp("sleep_data.sleep_start", row.get("sleep_start"))?,
            sleep_end: parse_optional_timestamp("sleep_data.sleep_end", row.get("sleep_end"))?,
            deep_sleep_seconds: row.get("deep_sleep_seconds"),
            light_sleep_seconds: row.get("light_sleep_seconds"),
            rem_sleep_seconds: row.get("rem_sleep_seconds"),
            awake_seconds: row.get("awake_seconds"),
            unmeasurable_seconds: row.get("unmeasurable_seconds"),
            overall_sleep_score: row.get("overall_sleep_score"),
            avg_respiration: row.get("avg_respiration"),
            avg_spo2: row.get("avg_spo2"),
            lowest_spo2: row.get("lowest_spo2"),
            highest_spo2: row.get("highest_spo2"),
            avg_hrv: row.get("avg_hrv"),
            restless_moments_count: row.get("restless_moments_count"),
            raw_json: row.get("raw_json"),
        }))
    }
}
