// ABOUTME: Activity and activity file database operations keyed by the remote activity id
// ABOUTME: Activities are sparse upserts, downloaded files are stored once and never replaced
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{parse_optional_timestamp, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{ActivityFile, ActivityRecord};
use chrono::Utc;
use sqlx::Row;

impl Database {
    pub(super) async fn migrate_activities(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS activities (
                activity_id TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL,
                activity_name TEXT,
                activity_type TEXT,
                sport_type TEXT,
                start_time_local TEXT,
                start_time_gmt TEXT,
                duration_seconds REAL,
                distance_meters REAL,
                elevation_gain_meters REAL,
                elevation_loss_meters REAL,
                avg_speed_mps REAL,
                max_speed_mps REAL,
                avg_heart_rate INTEGER,
                max_heart_rate INTEGER,
                calories INTEGER,
                avg_power_watts INTEGER,
                max_power_watts INTEGER,
                training_effect_aerobic REAL,
                training_effect_anaerobic REAL,
                start_latitude REAL,
                start_longitude REAL,
                end_latitude REAL,
                end_longitude REAL,
                manual_activity BOOLEAN,
                device_id TEXT,
                raw_json TEXT,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create activities table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_activities_user_start ON activities(user_id, start_time_gmt)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create activities index: {e}")))?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS activity_files (
                activity_id TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL,
                format TEXT NOT NULL,
                sha256 TEXT NOT NULL,
                size_bytes INTEGER NOT NULL,
                content BLOB NOT NULL,
                downloaded_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create activity_files table: {e}")))?;

        Ok(())
    }

    /// Create or merge an activity row
    ///
    /// # Errors
    ///
    /// Returns an error if the upsert fails
    pub async fn upsert_activity(&self, activity: &ActivityRecord) -> AppResult<u64> {
        let result = sqlx::query(
            r"
            INSERT INTO activities (
                activity_id, user_id, activity_name, activity_type, sport_type,
                start_time_local, start_time_gmt, duration_seconds, distance_meters,
                elevation_gain_meters, elevation_loss_meters, avg_speed_mps, max_speed_mps,
                avg_heart_rate, max_heart_rate, calories, avg_power_watts, max_power_watts,
                training_effect_aerobic, training_effect_anaerobic, start_latitude,
                start_longitude, end_latitude, end_longitude, manual_activity, device_id,
                raw_json, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28
            )
            ON CONFLICT(activity_id) DO UPDATE SET
                user_id = excluded.user_id,
                activity_name = COALESCE(excluded.activity_name, activity_name),
                activity_type = COALESCE(excluded.activity_type, activity_type),
                sport_type = COALESCE(excluded.sport_type, sport_type),
                start_time_local = COALESCE(excluded.start_time_local, start_time_local),
                start_time_gmt = COALESCE(excluded.start_time_gmt, start_time_gmt),
                duration_seconds = COALESCE(excluded.duration_seconds, duration_seconds),
                distance_meters = COALESCE(excluded.distance_meters, distance_meters),
                elevation_gain_meters = COALESCE(excluded.elevation_gain_meters, elevation_gain_meters),
                elevation_loss_meters = COALESCE(excluded.elevation_loss_meters, elevation_loss_meters),
                avg_speed_mps = COALESCE(excluded.avg_speed_mps, avg_speed_mps),
                max_speed_mps = COALESCE(excluded.max_speed_mps, max_speed_mps),
                avg_heart_rate = COALESCE(excluded.avg_heart_rate, avg_heart_rate),
                max_heart_rate = COALESCE(excluded.max_heart_rate, max_heart_rate),
                calories = COALESCE(excluded.calories, calories),
                avg_power_watts = COALESCE(excluded.avg_power_watts, avg_power_watts),
                max_power_watts = COALESCE(excluded.max_power_watts, max_power_watts),
                training_effect_aerobic = COALESCE(excluded.training_effect_aerobic, training_effect_aerobic),
                training_effect_anaerobic = COALESCE(excluded.training_effect_anaerobic, training_effect_anaerobic),
                start_latitude = COALESCE(excluded.start_latitude, start_latitude),
                start_longitude = COALESCE(excluded.start_longitude, start_longitude),
                end_latitude = COALESCE(excluded.end_latitude, end_latitude),
                end_longitude = COALESCE(excluded.end_longitude, end_longitude),
                manual_activity = COALESCE(excluded.manual_activity, manual_activity),
                device_id = COALESCE(excluded.device_id, device_id),
                raw_json = COALESCE(excluded.raw_json, raw_json),
                updated_at = excluded.updated_at
            ",
        )
        .bind(&activity.activity_id)
        .bind(activity.user_id)
        .bind(&activity.activity_name)
        .bind(&activity.activity_type)
        .bind(&activity.sport_type)
        .bind(&activity.start_time_local)
        .bind(activity.start_time_gmt.map(|ts| ts.to_rfc3339()))
        .bind(activity.duration_seconds)
        .bind(activity.distance_meters)
        .bind(activity.elevation_gain_meters)
        .bind(activity.elevation_loss_meters)
        .bind(activity.avg_speed_mps)
        .bind(activity.max_speed_mps)
        .bind(activity.avg_heart_rate)
        .bind(activity.max_heart_rate)
        .bind(activity.calories)
        .bind(activity.avg_power_watts)
        .bind(activity.max_power_watts)
        .bind(activity.training_effect_aerobic)
        .bind(activity.training_effect_anaerobic)
        .bind(activity.start_latitude)
        .bind(activity.start_longitude)
        .bind(activity.end_latitude)
        .bind(activity.end_longitude)
        .bind(activity.manual_activity)
        .bind(&activity.device_id)
        .bind(&activity.raw_json)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::database(format!(
                "Failed to upsert activity {}: {e}",
                activity.activity_id
            ))
        })?;

        Ok(result.rows_affected())
    }

    /// Stored activity by remote id
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored timestamp cannot be parsed
    pub async fn get_activity(&self, activity_id: &str) -> AppResult<Option<ActivityRecord>> {
        let row = sqlx::query("SELECT * FROM activities WHERE activity_id = ?1")
            .bind(activity_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get activity: {e}")))?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(ActivityRecord {
            activity_id: row.get("activity_id"),
            user_id: row.get("user_id"),
            activity_name: row.get("activity_name"),
            activity_type: row.get("activity_type"),
            sport_type: row.get("sport_type"),
            start_time_local: row.get("start_time_local"),
            start_time_gmt: parse_optional_timestamp(
                "activities.start_time_gmt",
                row.get("start_time_gmt"),
            )?,
            duration_seconds: row.get("duration_seconds"),
            distance_meters: row.get("distance_meters"),
            elevation_gain_meters: row.get("elevation_gain_meters"),
            elevation_loss_meters: row.get("elevation_loss_meters"),
            avg_speed_mps: row.get("avg_speed_mps"),
            max_speed_mps: row.get("max_speed_mps"),
            avg_heart_rate: row.get("avg_heart_rate"),
            max_heart_rate: row.get("max_heart_rate"),
            calories: row.get("calories"),
            avg_power_watts: row.get("avg_power_watts"),
            max_power_watts: row.get("max_power_watts"),
            training_effect_aerobic: row.get("training_effect_aerobic"),
            training_effect_anaerobic: row.get("training_effect_anaerobic"),
            start_latitude: row.get("start_latitude"),
            start_longitude: row.get("start_longitude"),
            end_latitude: row.get("end_latitude"),
            end_longitude: row.get("end_longitude"),
            manual_activity: row.get("manual_activity"),
            device_id: row.get("device_id"),
            raw_json: row.get("raw_json"),
        }))
    }

    /// Store a downloaded activity file unless one is already stored
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn insert_activity_file(&self, file: &ActivityFile) -> AppResult<u64> {
        let size_bytes = i64::try_from(file.content.len()).unwrap_or(i64::MAX);
        let result = sqlx::query(
            r"
            INSERT INTO activity_files (
                activity_id, user_id, format, sha256, size_bytes, content, downloaded_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(activity_id) DO NOTHING
            ",
        )
        .bind(&file.activity_id)
        .bind(file.user_id)
        .bind(&file.format)
        .bind(&file.sha256)
        .bind(size_bytes)
        .bind(&file.content)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::database(format!(
                "Failed to store activity file {}: {e}",
                file.activity_id
            ))
        })?;

        Ok(result.rows_affected())
    }

    /// Whether a file is already stored for the activity
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn has_activity_file(&self, activity_id: &str) -> AppResult<bool> {
        let row = sqlx::query("SELECT 1 FROM activity_files WHERE activity_id = ?1")
            .bind(activity_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to look up activity file: {e}")))?;

        Ok(row.is_some())
    }

    /// Stored digest of an activity file
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_activity_file_digest(&self, activity_id: &str) -> AppResult<Option<String>> {
        let row = sqlx::query("SELECT sha256 FROM activity_files WHERE activity_id = ?1")
            .bind(activity_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get activity file: {e}")))?;

        Ok(row.map(|row| row.get("sha256")))
    }
}
