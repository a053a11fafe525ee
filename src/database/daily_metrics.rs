// ABOUTME: Daily metric database operations keyed by (date, user_id)
// ABOUTME: Sparse upsert merges each extractor's attribute subset into the stored row
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{format_date, parse_date, Database};
use crate::errors::{AppError, AppResult};
use crate::models::DailyMetricRecord;
use chrono::{NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

impl Database {
    pub(super) async fn migrate_daily_metrics(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS daily_metrics (
                date TEXT NOT NULL,
                user_id INTEGER NOT NULL,
                total_steps INTEGER,
                total_distance_meters REAL,
                active_seconds INTEGER,
                highly_active_seconds INTEGER,
                sedentary_seconds INTEGER,
                calories_total INTEGER,
                calories_active INTEGER,
                floors_climbed INTEGER,
                resting_heart_rate INTEGER,
                min_heart_rate INTEGER,
                max_heart_rate INTEGER,
                avg_stress_level INTEGER,
                max_stress_level INTEGER,
                body_battery_charged INTEGER,
                body_battery_drained INTEGER,
                body_battery_highest INTEGER,
                body_battery_lowest INTEGER,
                sleep_score INTEGER,
                total_sleep_seconds INTEGER,
                deep_sleep_seconds INTEGER,
                light_sleep_seconds INTEGER,
                rem_sleep_seconds INTEGER,
                awake_seconds INTEGER,
                hydration_ml INTEGER,
                respiration_avg REAL,
                spo2_avg REAL,
                training_readiness_score INTEGER,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (date, user_id)
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create daily_metrics table: {e}")))?;

        Ok(())
    }

    /// Merge a sparse daily patch into the stored row
    ///
    /// Attributes left as `None` keep their stored value. An empty patch is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the upsert fails
    pub async fn upsert_daily_metrics(&self, record: &DailyMetricRecord) -> AppResult<u64> {
        if record.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            r"
            INSERT INTO daily_metrics (
                date, user_id, total_steps, total_distance_meters, active_seconds,
                highly_active_seconds, sedentary_seconds, calories_total, calories_active,
                floors_climbed, resting_heart_rate, min_heart_rate, max_heart_rate,
                avg_stress_level, max_stress_level, body_battery_charged, body_battery_drained,
                body_battery_highest, body_battery_lowest, sleep_score, total_sleep_seconds,
                deep_sleep_seconds, light_sleep_seconds, rem_sleep_seconds, awake_seconds,
                hydration_ml, respiration_avg, spo2_avg, training_readiness_score, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29, ?30
            )
            ON CONFLICT(date, user_id) DO UPDATE SET
                total_steps = COALESCE(excluded.total_steps, total_steps),
                total_distance_meters = COALESCE(excluded.total_distance_meters, total_distance_meters),
                active_seconds = COALESCE(excluded.active_seconds, active_seconds),
                highly_active_seconds = COALESCE(excluded.highly_active_seconds, highly_active_seconds),
                sedentary_seconds = COALESCE(excluded.sedentary_seconds, sedentary_seconds),
                calories_total = COALESCE(excluded.calories_total, calories_total),
                calories_active = COALESCE(excluded.calories_active, calories_active),
                floors_climbed = COALESCE(excluded.floors_climbed, floors_climbed),
                resting_heart_rate = COALESCE(excluded.resting_heart_rate, resting_heart_rate),
                min_heart_rate = COALESCE(excluded.min_heart_rate, min_heart_rate),
                max_heart_rate = COALESCE(excluded.max_heart_rate, max_heart_rate),
                avg_stress_level = COALESCE(excluded.avg_stress_level, avg_stress_level),
                max_stress_level = COALESCE(excluded.max_stress_level, max_stress_level),
                body_battery_charged = COALESCE(excluded.body_battery_charged, body_battery_charged),
                body_battery_drained = COALESCE(excluded.body_battery_drained, body_battery_drained),
                body_battery_highest = COALESCE(excluded.body_battery_highest, body_battery_highest),
                body_battery_lowest = COALESCE(excluded.body_battery_lowest, body_battery_lowest),
                sleep_score = COALESCE(excluded.sleep_score, sleep_score),
                total_sleep_seconds = COALESCE(excluded.total_sleep_seconds, total_sleep_seconds),
                deep_sleep_seconds = COALESCE(excluded.deep_sleep_seconds, deep_sleep_seconds),
                light_sleep_seconds = COALESCE(excluded.light_sleep_seconds, light_sleep_seconds),
                rem_sleep_seconds = COALESCE(excluded.rem_sleep_seconds, rem_sleep_seconds),
                awake_seconds = COALESCE(excluded.awake_seconds, awake_seconds),
                hydration_ml = COALESCE(excluded.hydration_ml, hydration_ml),
                respiration_avg = COALESCE(excluded.respiration_avg, respiration_avg),
                spo2_avg = COALESCE(excluded.spo2_avg, spo2_avg),
                training_readiness_score = COALESCE(excluded.training_readiness_score, training_readiness_score),
                updated_at = excluded.updated_at
            ",
        )
        .bind(format_date(record.date))
        .bind(record.user_id)
        .bind(record.total_steps)
        .bind(record.total_distance_meters)
        .bind(record.active_seconds)
        .bind(record.highly_active_seconds)
        .bind(record.sedentary_seconds)
        .bind(record.calories_total)
        .bind(record.calories_active)
        .bind(record.floors_climbed)
        .bind(record.resting_heart_rate)
        .bind(record.min_heart_rate)
        .bind(record.max_heart_rate)
        .bind(record.avg_stress_level)
        .bind(record.max_stress_level)
        .bind(record.body_battery_charged)
        .bind(record.body_battery_drained)
        .bind(record.body_battery_highest)
        .bind(record.body_battery_lowest)
        .bind(record.sleep_score)
        .bind(record.total_sleep_seconds)
        .bind(record.deep_sleep_seconds)
        .bind(record.light_sleep_seconds)
        .bind(record.rem_sleep_seconds)
        .bind(record.awake_seconds)
        .bind(record.hydration_ml)
        .bind(record.respiration_avg)
        .bind(record.spo2_avg)
        .bind(record.training_readiness_score)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to upsert daily metrics: {e}")))?;

        Ok(result.rows_affected())
    }

    /// Stored daily metrics for one day
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored date cannot be parsed
    pub async fn get_daily_metrics(
        &self,
        date: NaiveDate,
        user_id: i64,
    ) -> AppResult<Option<DailyMetricRecord>> {
        let row = sqlx::query("SELECT * FROM daily_metrics WHERE date = ?1 AND user_id = ?2")
            .bind(format_date(date))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get daily metrics: {e}")))?;

        row.map(|row| row_to_daily(&row)).transpose()
    }

    /// Number of stored days for a user
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn count_daily_metrics(&self, user_id: i64) -> AppResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM daily_metrics WHERE user_id = ?1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count daily metrics: {e}")))?;

        Ok(row.get("total"))
    }
}

fn row_to_daily(row: &SqliteRow) -> AppResult<DailyMetricRecord> {
    let date: String = row.get("date");
    Ok(DailyMetricRecord {
        date: parse_date("daily_metrics.date", &date)?,
        user_id: row.get("user_id"),
        total_steps: row.get("total_steps"),
        total_distance_meters: row.get("total_distance_meters"),
        active_seconds: row.get("active_seconds"),
        highly_active_seconds: row.get("highly_active_seconds"),
        sedentary_seconds: row.get("sedentary_seconds"),
        calories_total: row.get("calories_total"),
        calories_active: row.get("calories_active"),
        floors_climbed: row.get("floors_climbed"),
        resting_heart_rate: row.get("resting_heart_rate"),
        min_heart_rate: row.get("min_heart_rate"),
        max_heart_rate: row.get("max_heart_rate"),
        avg_stress_level: row.get("avg_stress_level"),
        max_stress_level: row.get("max_stress_level"),
        body_battery_charged: row.get("body_battery_charged"),
        body_battery_drained: row.get("body_battery_drained"),
        body_battery_highest: row.get("body_battery_highest"),
        body_battery_lowest: row.get("body_battery_lowest"),
        sleep_score: row.get("sleep_score"),
        total_sleep_seconds: row.get("total_sleep_seconds"),
        deep_sleep_seconds: row.get("deep_sleep_seconds"),
        light_sleep_seconds: row.get("light_sleep_seconds"),
        rem_sleep_seconds: row.get("rem_sleep_seconds"),
        awake_seconds: row.get("awake_seconds"),
        hydration_ml: row.get("hydration_ml"),
        respiration_avg: row.get("respiration_avg"),
        spo2_avg: row.get("spo2_avg"),
        training_readiness_score: row.get("training_readiness_score"),
    })
}
