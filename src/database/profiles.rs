// ABOUTME: User profile database operations
// ABOUTME: Maps the remote account identity onto a stable local user id
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::Database;
use crate::errors::{AppError, AppResult};
use crate::models::UserProfileRecord;
use chrono::Utc;
use sqlx::Row;

impl Database {
    pub(super) async fn migrate_profiles(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS user_profiles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                remote_user_id TEXT UNIQUE NOT NULL,
                display_name TEXT,
                full_name TEXT,
                profile_image_url TEXT,
                locale TEXT,
                timezone TEXT,
                measurement_system TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create user_profiles table: {e}")))?;

        Ok(())
    }

    /// Create or refresh a profile and return its local user id
    ///
    /// # Errors
    ///
    /// Returns an error if the upsert fails
    pub async fn upsert_user_profile(&self, profile: &UserProfileRecord) -> AppResult<i64> {
        let now = Utc::now().to_rfc3339();
        let row = sqlx::query(
            r"
            INSERT INTO user_profiles (
                remote_user_id, display_name, full_name, profile_image_url,
                locale, timezone, measurement_system, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
            ON CONFLICT(remote_user_id) DO UPDATE SET
                display_name = COALESCE(excluded.display_name, display_name),
                full_name = COALESCE(excluded.full_name, full_name),
                profile_image_url = COALESCE(excluded.profile_image_url, profile_image_url),
                locale = COALESCE(excluded.locale, locale),
                timezone = COALESCE(excluded.timezone, timezone),
                measurement_system = COALESCE(excluded.measurement_system, measurement_system),
                updated_at = excluded.updated_at
            RETURNING id
            ",
        )
        .bind(&profile.remote_user_id)
        .bind(&profile.display_name)
        .bind(&profile.full_name)
        .bind(&profile.profile_image_url)
        .bind(&profile.locale)
        .bind(&profile.timezone)
        .bind(&profile.measurement_system)
        .bind(&now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to upsert user profile: {e}")))?;

        Ok(row.get("id"))
    }

    /// Look up a profile by its remote user id
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_user_profile(
        &self,
        remote_user_id: &str,
    ) -> AppResult<Option<(i64, UserProfileRecord)>> {
        let row = sqlx::query(
            r"
            SELECT id, remote_user_id, display_name, full_name, profile_image_url,
                   locale, timezone, measurement_system
            FROM user_profiles
            WHERE remote_user_id = ?1
            ",
        )
        .bind(remote_user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get user profile: {e}")))?;

        Ok(row.map(|row| {
            (
                row.get("id"),
                UserProfileRecord {
                    remote_user_id: row.get("remote_user_id"),
                    display_name: row.get("display_name"),
                    full_name: row.get("full_name"),
                    profile_image_url: row.get("profile_image_url"),
                    locale: row.get("locale"),
                    timezone: row.get("timezone"),
                    measurement_system: row.get("measurement_system"),
                },
            )
        }))
    }
}
