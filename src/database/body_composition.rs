// ABOUTME: Body composition database operations
// ABOUTME: Weigh-ins are insert-if-absent, keyed by user and exact measurement instant
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{format_date, parse_date, parse_timestamp, Database};
use crate::errors::{AppError, AppResult};
use crate::models::BodyCompositionRecord;
use chrono::NaiveDate;
use sqlx::Row;

impl Database {
    pub(super) async fn migrate_body_composition(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS body_composition (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                measurement_time TEXT NOT NULL,
                measurement_date TEXT NOT NULL,
                weight_kg REAL,
                bmi REAL,
                body_fat_percentage REAL,
                body_water_percentage REAL,
                bone_mass_kg REAL,
                muscle_mass_kg REAL,
                physique_rating INTEGER,
                visceral_fat_rating INTEGER,
                metabolic_age INTEGER,
                source_type TEXT,
                UNIQUE (user_id, measurement_time)
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::database(format!("Failed to create body_composition table: {e}"))
        })?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_body_composition_date ON body_composition(user_id, measurement_date)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::database(format!("Failed to create body_composition index: {e}"))
        })?;

        Ok(())
    }

    /// Store a weigh-in; a re-delivered weigh-in is ignored
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn insert_body_composition(&self, weigh_in: &BodyCompositionRecord) -> AppResult<u64> {
        let result = sqlx::query(
            r"
            INSERT INTO body_composition (
                user_id, measurement_time, measurement_date, weight_kg, bmi,
                body_fat_percentage, body_water_percentage, bone_mass_kg, muscle_mass_kg,
                physique_rating, visceral_fat_rating, metabolic_age, source_type
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            ON CONFLICT(user_id, measurement_time) DO NOTHING
            ",
        )
        .bind(weigh_in.user_id)
        .bind(weigh_in.measurement_time.to_rfc3339())
        .bind(format_date(weigh_in.measurement_date))
        .bind(weigh_in.weight_kg)
        .bind(weigh_in.bmi)
        .bind(weigh_in.body_fat_percentage)
        .bind(weigh_in.body_water_percentage)
        .bind(weigh_in.bone_mass_kg)
        .bind(weigh_in.muscle_mass_kg)
        .bind(weigh_in.physique_rating)
        .bind(weigh_in.visceral_fat_rating)
        .bind(weigh_in.metabolic_age)
        .bind(&weigh_in.source_type)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to insert body composition: {e}")))?;

        Ok(result.rows_affected())
    }

    /// All weigh-ins recorded on a day, earliest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or stored values cannot be parsed
    pub async fn list_body_composition(
        &self,
        user_id: i64,
        date: NaiveDate,
    ) -> AppResult<Vec<BodyCompositionRecord>> {
        let rows = sqlx::query(
            r"
            SELECT * FROM body_composition
            WHERE user_id = ?1 AND measurement_date = ?2
            ORDER BY measurement_time ASC
            ",
        )
        .bind(user_id)
        .bind(format_date(date))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list body composition: {e}")))?;

        rows.iter()
            .map(|row| {
                let measurement_time: String = row.get("measurement_time");
                let measurement_date: String = row.get("measurement_date");
                Ok(BodyCompositionRecord {
                    user_id: row.get("user_id"),
                    measurement_time: parse_timestamp(
                        "body_composition.measurement_time",
                        &measurement_time,
                    )?,
                    measurement_date: parse_date(
                        "body_composition.measurement_date",
                        &measurement_date,
                    )?,
                    weight_kg: row.get("weight_kg"),
                    bmi: row.get("bmi"),
                    body_fat_percentage: row.get("body_fat_percentage"),
                    body_water_percentage: row.get("body_water_percentage"),
                    bone_mass_kg: row.get("bone_mass_kg"),
                    muscle_mass_kg: row.get("muscle_mass_kg"),
                    physique_rating: row.get("physique_rating"),
                    visceral_fat_rating: row.get("visceral_fat_rating"),
                    metabolic_age: row.get("metabolic_age"),
                    source_type: row.get("source_type"),
                })
            })
            .collect()
    }
}
