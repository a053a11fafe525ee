// ABOUTME: Integration tests for natural-key upserts and insert-if-absent persistence
// ABOUTME: Exercises every table against in-memory and file-backed SQLite stores
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use common::{create_test_database, init_test_logging, march, march_date};
use tempfile::TempDir;
use wellness_sync::database::Database;
use wellness_sync::errors::ErrorCode;
use wellness_sync::models::{
    ActivityFile, ActivityRecord, BodyCompositionRecord, CollectionType, DailyMetricRecord,
    IntradayMetric, IntradaySample, NormalizedRecord, RunStatus, SleepRecord, UserProfileRecord,
};

fn weigh_in(hour: u32, weight_kg: f64) -> BodyCompositionRecord {
    BodyCompositionRecord {
        user_id: 1,
        measurement_time: march(2, hour),
        measurement_date: march_date(2),
        weight_kg: Some(weight_kg),
        bmi: None,
        body_fat_percentage: Some(18.5),
        body_water_percentage: None,
        bone_mass_kg: None,
        muscle_mass_kg: None,
        physique_rating: None,
        visceral_fat_rating: None,
        metabolic_age: None,
        source_type: Some("INDEX_SCALE".to_owned()),
    }
}

#[tokio::test]
async fn test_sparse_daily_patches_merge() {
    let database = create_test_database().await;

    let steps = DailyMetricRecord {
        total_steps: Some(8_200),
        calories_total: Some(2_310),
        ..DailyMetricRecord::new(march_date(1), 1)
    };
    let heart = DailyMetricRecord {
        resting_heart_rate: Some(52),
        ..DailyMetricRecord::new(march_date(1), 1)
    };
    assert_eq!(database.upsert_daily_metrics(&steps).await.unwrap(), 1);
    assert_eq!(database.upsert_daily_metrics(&heart).await.unwrap(), 1);

    let row = database.get_daily_metrics(march_date(1), 1).await.unwrap().unwrap();
    assert_eq!(row.total_steps, Some(8_200));
    assert_eq!(row.calories_total, Some(2_310));
    assert_eq!(row.resting_heart_rate, Some(52));

    // A later value overwrites, an absent one never clears
    let revised = DailyMetricRecord {
        total_steps: Some(9_000),
        ..DailyMetricRecord::new(march_date(1), 1)
    };
    database.upsert_daily_metrics(&revised).await.unwrap();
    let row = database.get_daily_metrics(march_date(1), 1).await.unwrap().unwrap();
    assert_eq!(row.total_steps, Some(9_000));
    assert_eq!(row.resting_heart_rate, Some(52));
    assert_eq!(database.count_daily_metrics(1).await.unwrap(), 1);
}

#[tokio::test]
async fn test_empty_daily_patch_writes_nothing() {
    let database = create_test_database().await;

    let written = database
        .upsert_daily_metrics(&DailyMetricRecord::new(march_date(3), 1))
        .await
        .unwrap();

    assert_eq!(written, 0);
    assert!(database.get_daily_metrics(march_date(3), 1).await.unwrap().is_none());
}

#[tokio::test]
async fn test_daily_rows_are_per_user() {
    let database = create_test_database().await;
    let mine = DailyMetricRecord {
        total_steps: Some(100),
        ..DailyMetricRecord::new(march_date(1), 1)
    };
    let theirs = DailyMetricRecord {
        total_steps: Some(200),
        ..DailyMetricRecord::new(march_date(1), 2)
    };
    database.upsert_daily_metrics(&mine).await.unwrap();
    database.upsert_daily_metrics(&theirs).await.unwrap();

    assert_eq!(database.count_daily_metrics(1).await.unwrap(), 1);
    let row = database.get_daily_metrics(march_date(1), 2).await.unwrap().unwrap();
    assert_eq!(row.total_steps, Some(200));
}

#[tokio::test]
async fn test_intraday_samples_are_deduplicated() {
    let database = create_test_database().await;
    let sample = IntradaySample {
        user_id: 1,
        metric: IntradayMetric::Stress,
        timestamp: march(4, 10),
        value: 31.0,
    };

    assert_eq!(database.insert_intraday_sample(&sample).await.unwrap(), 1);
    // Same key with a different value is still a re-delivery
    let redelivered = IntradaySample {
        value: 45.0,
        ..sample
    };
    assert_eq!(database.insert_intraday_sample(&redelivered).await.unwrap(), 0);

    // Another metric at the same instant is a separate sample
    let battery = IntradaySample {
        metric: IntradayMetric::BodyBattery,
        ..sample
    };
    assert_eq!(database.insert_intraday_sample(&battery).await.unwrap(), 1);

    assert_eq!(
        database
            .count_intraday_samples(1, IntradayMetric::Stress, march(4, 0), march(5, 0))
            .await
            .unwrap(),
        1
    );
    assert_eq!(
        database
            .count_intraday_samples(1, IntradayMetric::Stress, march(4, 11), march(5, 0))
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn test_body_composition_keeps_first_delivery() {
    let database = create_test_database().await;

    assert_eq!(database.insert_body_composition(&weigh_in(7, 72.4)).await.unwrap(), 1);
    assert_eq!(database.insert_body_composition(&weigh_in(7, 99.9)).await.unwrap(), 0);
    assert_eq!(database.insert_body_composition(&weigh_in(19, 72.9)).await.unwrap(), 1);

    let stored = database.list_body_composition(1, march_date(2)).await.unwrap();
    let weights: Vec<Option<f64>> = stored.iter().map(|w| w.weight_kg).collect();
    assert_eq!(weights, vec![Some(72.4), Some(72.9)]);
}

#[tokio::test]
async fn test_activity_upsert_and_file_digest() {
    let database = create_test_database().await;
    let activity = ActivityRecord {
        activity_id: "12345".to_owned(),
        user_id: 1,
        activity_name: Some("Morning Run".to_owned()),
        activity_type: Some("running".to_owned()),
        start_time_gmt: Some(march(5, 6)),
        distance_meters: Some(10_012.5),
        ..ActivityRecord::default()
    };
    database.upsert_activity(&activity).await.unwrap();

    // A renamed re-delivery without distance keeps the stored distance
    let renamed = ActivityRecord {
        activity_name: Some("Tempo Run".to_owned()),
        distance_meters: None,
        ..activity.clone()
    };
    database.upsert_activity(&renamed).await.unwrap();

    let stored = database.get_activity("12345").await.unwrap().unwrap();
    assert_eq!(stored.activity_name.as_deref(), Some("Tempo Run"));
    assert_eq!(stored.distance_meters, Some(10_012.5));
    assert_eq!(stored.start_time_gmt, Some(march(5, 6)));

    let file = ActivityFile {
        activity_id: "12345".to_owned(),
        user_id: 1,
        format: "original".to_owned(),
        sha256: "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad".to_owned(),
        content: b"abc".to_vec(),
    };
    assert!(!database.has_activity_file("12345").await.unwrap());
    assert_eq!(database.insert_activity_file(&file).await.unwrap(), 1);
    assert_eq!(database.insert_activity_file(&file).await.unwrap(), 0);
    assert_eq!(
        database.get_activity_file_digest("12345").await.unwrap().as_deref(),
        Some("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
    );
}

#[tokio::test]
async fn test_sleep_upsert_by_night() {
    let database = create_test_database().await;
    let night = SleepRecord {
        calendar_date: march_date(8),
        user_id: 1,
        sleep_id: Some("777".to_owned()),
        sleep_start: Some(march(7, 22)),
        sleep_end: Some(march(8, 6)),
        deep_sleep_seconds: Some(4_800),
        overall_sleep_score: Some(81),
        ..SleepRecord::default()
    };
    database.upsert_sleep(&night).await.unwrap();

    let rescored = SleepRecord {
        calendar_date: march_date(8),
        user_id: 1,
        overall_sleep_score: Some(84),
        ..SleepRecord::default()
    };
    database.upsert_sleep(&rescored).await.unwrap();

    let stored = database.get_sleep(march_date(8), 1).await.unwrap().unwrap();
    assert_eq!(stored.overall_sleep_score, Some(84));
    assert_eq!(stored.deep_sleep_seconds, Some(4_800));
    assert_eq!(stored.sleep_end, Some(march(8, 6)));
}

#[tokio::test]
async fn test_store_record_dispatches_by_kind() {
    let database = create_test_database().await;
    let records: Vec<NormalizedRecord> = vec![
        DailyMetricRecord {
            hydration_ml: Some(2_000),
            ..DailyMetricRecord::new(march_date(9), 1)
        }
        .into(),
        IntradaySample {
            user_id: 1,
            metric: IntradayMetric::Steps,
            timestamp: march(9, 8),
            value: 340.0,
        }
        .into(),
        weigh_in(8, 70.0).into(),
    ];

    let mut written = 0;
    for record in &records {
        written += database.store_record(record).await.unwrap();
    }

    assert_eq!(written, 3);
    assert!(database.get_daily_metrics(march_date(9), 1).await.unwrap().is_some());
    assert_eq!(database.list_body_composition(1, march_date(2)).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_profile_upsert_returns_stable_id() {
    let database = create_test_database().await;
    let profile = UserProfileRecord {
        remote_user_id: "90210".to_owned(),
        display_name: Some("runner".to_owned()),
        timezone: Some("Europe/Paris".to_owned()),
        ..UserProfileRecord::default()
    };

    let first = database.upsert_user_profile(&profile).await.unwrap();
    let renamed = UserProfileRecord {
        display_name: Some("runner-2".to_owned()),
        timezone: None,
        ..profile
    };
    let second = database.upsert_user_profile(&renamed).await.unwrap();

    assert_eq!(first, second);
    let (id, stored) = database.get_user_profile("90210").await.unwrap().unwrap();
    assert_eq!(id, first);
    assert_eq!(stored.display_name.as_deref(), Some("runner-2"));
    assert_eq!(stored.timezone.as_deref(), Some("Europe/Paris"));
}

#[tokio::test]
async fn test_checkpoint_overwrites_in_place() {
    let database = create_test_database().await;
    assert!(database.get_checkpoint("last_sync_time").await.unwrap().is_none());

    database
        .set_checkpoint("last_sync_time", "2024-03-01T00:00:00+00:00")
        .await
        .unwrap();
    database
        .set_checkpoint("last_sync_time", "2024-03-02T00:00:00+00:00")
        .await
        .unwrap();

    let stored = database.get_checkpoint("last_sync_time").await.unwrap().unwrap();
    assert_eq!(stored.key, "last_sync_time");
    assert_eq!(stored.value, "2024-03-02T00:00:00+00:00");
}

#[tokio::test]
async fn test_collection_run_closes_once() {
    let database = create_test_database().await;
    let run_id = database
        .open_collection_run(CollectionType::Bulk, march(1, 0))
        .await
        .unwrap();

    let open = database.get_collection_run(run_id).await.unwrap().unwrap();
    assert_eq!(open.status, RunStatus::Running);
    assert!(open.end_time.is_none());

    database
        .close_collection_run(run_id, RunStatus::Success, 42, None, march(1, 1))
        .await
        .unwrap();
    let err = database
        .close_collection_run(run_id, RunStatus::Error, 0, Some("late"), march(1, 2))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceLocked);

    let closed = database.get_collection_run(run_id).await.unwrap().unwrap();
    assert_eq!(closed.status, RunStatus::Success);
    assert_eq!(closed.records_collected, 42);
    assert_eq!(closed.duration().map(|d| d.num_minutes()), Some(60));

    let missing = database
        .close_collection_run(run_id + 100, RunStatus::Success, 0, None, march(1, 1))
        .await
        .unwrap_err();
    assert_eq!(missing.code, ErrorCode::ResourceNotFound);
}

#[tokio::test]
async fn test_collection_run_cannot_close_as_running() {
    let database = create_test_database().await;
    let run_id = database
        .open_collection_run(CollectionType::Sync, march(1, 0))
        .await
        .unwrap();

    let err = database
        .close_collection_run(run_id, RunStatus::Running, 0, None, march(1, 1))
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::InvalidInput);
}

#[tokio::test]
async fn test_recent_runs_newest_first_and_filtered_last_run() {
    let database = create_test_database().await;
    let sync_run = database
        .open_collection_run(CollectionType::Sync, march(1, 0))
        .await
        .unwrap();
    let bulk_run = database
        .open_collection_run(CollectionType::Bulk, march(2, 0))
        .await
        .unwrap();

    let recent = database.recent_collection_runs(10).await.unwrap();
    let ids: Vec<i64> = recent.iter().map(|run| run.id).collect();
    assert_eq!(ids, vec![bulk_run, sync_run]);

    let last_sync = database
        .last_collection_run(Some(CollectionType::Sync))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(last_sync.id, sync_run);
    assert_eq!(database.recent_collection_runs(1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_file_backed_store_survives_reopen() {
    init_test_logging();
    let dir = TempDir::new().unwrap();
    let url = format!("sqlite:{}", dir.path().join("nested").join("garmin.db").display());

    {
        let database = Database::new(&url).await.unwrap();
        database
            .set_checkpoint("last_sync_time", "2024-03-05T06:00:00+00:00")
            .await
            .unwrap();
        let patch = DailyMetricRecord {
            total_steps: Some(12_000),
            ..DailyMetricRecord::new(march_date(5), 1)
        };
        database.upsert_daily_metrics(&patch).await.unwrap();
    }

    let reopened = Database::new(&url).await.unwrap();
    let checkpoint = reopened.get_checkpoint("last_sync_time").await.unwrap().unwrap();
    assert_eq!(checkpoint.value, "2024-03-05T06:00:00+00:00");
    assert_eq!(reopened.count_daily_metrics(1).await.unwrap(), 1);
}
