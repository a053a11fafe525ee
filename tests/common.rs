// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides logging, an in-memory database, a fixture data source and a fixed clock
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used
)]
//! Shared test utilities for `wellness_sync`

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::env;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, Once};
use std::time::Duration;
use tracing::Level;
use wellness_providers::payloads::{
    ActivityPayload, BodyBatteryReport, BodyCompositionPayload, DailySummaryPayload,
    HeartRatePayload, HrvPayload, HydrationPayload, RespirationPayload, SleepPayload,
    StepsBucket, StressPayload, TrainingReadinessEntry, UserProfilePayload,
};
use wellness_providers::{ProviderError, ProviderResult, RateLimitPolicy, WellnessDataSource};
use wellness_sync::config::SyncConfig;
use wellness_sync::database::Database;
use wellness_sync::sync::Clock;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => Level::TRACE,
            Ok("DEBUG") => Level::DEBUG,
            Ok("INFO") => Level::INFO,
            _ => Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Fresh in-memory store with the schema applied
pub async fn create_test_database() -> Database {
    init_test_logging();
    Database::new("sqlite::memory:").await.unwrap()
}

/// Configuration with no rate limiting and a short interval
pub fn test_config(bootstrap_days: u32) -> SyncConfig {
    SyncConfig {
        database_url: "sqlite::memory:".to_owned(),
        sync_interval: Duration::from_millis(10),
        rate_limit: RateLimitPolicy::unthrottled(),
        call_timeout: Duration::from_secs(5),
        bootstrap_days,
        bulk_days_back: 2,
        ..SyncConfig::default()
    }
}

/// `2024-03-dd` at `hour:00` UTC
pub fn march(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).single().unwrap()
}

/// `2024-03-dd`
pub fn march_date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
}

/// Failure a fixture endpoint should report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    AuthExpired,
    NotAvailable,
    NotSupported,
    Malformed,
    Timeout,
    Transient,
}

impl Failure {
    fn to_error(self, resource: &str) -> ProviderError {
        match self {
            Self::AuthExpired => ProviderError::AuthExpired {
                provider: "fixture".to_owned(),
            },
            Self::NotAvailable => ProviderError::not_available(resource),
            Self::NotSupported => ProviderError::NotSupported {
                endpoint: resource.to_owned(),
            },
            Self::Malformed => ProviderError::malformed(resource, "truncated payload"),
            Self::Timeout => ProviderError::Timeout { seconds: 5 },
            Self::Transient => ProviderError::Transient {
                status: Some(503),
                message: "service unavailable".to_owned(),
            },
        }
    }
}

#[derive(Debug, Clone)]
enum Response {
    Json(Value),
    Fail(Failure),
}

type Key = (&'static str, Option<NaiveDate>);

/// Scriptable data source serving JSON fixtures per endpoint and date
///
/// Endpoints without a fixture return an empty payload.
pub struct FixtureSource {
    profile: Mutex<Response>,
    device_sync: Mutex<Result<DateTime<Utc>, Failure>>,
    responses: Mutex<HashMap<Key, Response>>,
    files: Mutex<HashMap<String, Bytes>>,
    calls: Mutex<Vec<String>>,
    reauthentications: AtomicUsize,
}

impl Default for FixtureSource {
    fn default() -> Self {
        Self {
            profile: Mutex::new(Response::Json(json!({
                "profileId": 90_210,
                "displayName": "fixture-user",
                "fullName": "Fixture User"
            }))),
            device_sync: Mutex::new(Ok(march(11, 6))),
            responses: Mutex::new(HashMap::new()),
            files: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            reauthentications: AtomicUsize::new(0),
        }
    }
}

impl FixtureSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `json` for `endpoint` on `date` (the range start for range endpoints)
    pub fn respond(&self, endpoint: &'static str, date: NaiveDate, json: Value) {
        self.responses
            .lock()
            .unwrap()
            .insert((endpoint, Some(date)), Response::Json(json));
    }

    /// Make `endpoint` fail on `date`
    pub fn fail(&self, endpoint: &'static str, date: NaiveDate, failure: Failure) {
        self.responses
            .lock()
            .unwrap()
            .insert((endpoint, Some(date)), Response::Fail(failure));
    }

    /// Make the profile lookup fail
    pub fn fail_profile(&self, failure: Failure) {
        *self.profile.lock().unwrap() = Response::Fail(failure);
    }

    /// Remote device sync time
    pub fn set_device_sync_time(&self, instant: DateTime<Utc>) {
        *self.device_sync.lock().unwrap() = Ok(instant);
    }

    /// Make the device sync time lookup fail
    pub fn fail_device_sync(&self, failure: Failure) {
        *self.device_sync.lock().unwrap() = Err(failure);
    }

    /// Original file served for an activity
    pub fn add_file(&self, activity_id: &str, content: &'static [u8]) {
        self.files
            .lock()
            .unwrap()
            .insert(activity_id.to_owned(), Bytes::from_static(content));
    }

    /// Every call made so far, as `endpoint` or `endpoint date`
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls made to `endpoint`
    pub fn call_count(&self, endpoint: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.split(' ').next() == Some(endpoint))
            .count()
    }

    /// Number of re-authentication requests
    pub fn reauthentications(&self) -> usize {
        self.reauthentications.load(Ordering::SeqCst)
    }

    fn record(&self, endpoint: &str, date: Option<NaiveDate>) {
        let call = date.map_or_else(|| endpoint.to_owned(), |d| format!("{endpoint} {d}"));
        self.calls.lock().unwrap().push(call);
    }

    fn serve<T>(&self, endpoint: &'static str, date: NaiveDate) -> ProviderResult<T>
    where
        T: DeserializeOwned + Default,
    {
        self.record(endpoint, Some(date));
        let response = self
            .responses
            .lock()
            .unwrap()
            .get(&(endpoint, Some(date)))
            .cloned();

        match response {
            None => Ok(T::default()),
            Some(Response::Fail(failure)) => Err(failure.to_error(&format!("{endpoint} {date}"))),
            Some(Response::Json(json)) => serde_json::from_value(json)
                .map_err(|e| ProviderError::malformed(format!("{endpoint} {date}"), e.to_string())),
        }
    }
}

#[async_trait]
impl WellnessDataSource for FixtureSource {
    fn name(&self) -> &'static str {
        "fixture"
    }

    async fn user_profile(&self) -> ProviderResult<UserProfilePayload> {
        self.record("user_profile", None);
        match self.profile.lock().unwrap().clone() {
            Response::Json(json) => serde_json::from_value(json)
                .map_err(|e| ProviderError::malformed("user_profile", e.to_string())),
            Response::Fail(failure) => Err(failure.to_error("user_profile")),
        }
    }

    async fn device_last_sync_time(&self) -> ProviderResult<DateTime<Utc>> {
        self.record("device_last_sync_time", None);
        let outcome = *self.device_sync.lock().unwrap();
        outcome.map_err(|failure| failure.to_error("device_last_sync_time"))
    }

    async fn daily_summary(&self, date: NaiveDate) -> ProviderResult<DailySummaryPayload> {
        self.serve("daily_summary", date)
    }

    async fn heart_rates(&self, date: NaiveDate) -> ProviderResult<HeartRatePayload> {
        self.serve("heart_rates", date)
    }

    async fn stress(&self, date: NaiveDate) -> ProviderResult<StressPayload> {
        self.serve("stress", date)
    }

    async fn body_battery(&self, date: NaiveDate) -> ProviderResult<Vec<BodyBatteryReport>> {
        self.serve("body_battery", date)
    }

    async fn hydration(&self, date: NaiveDate) -> ProviderResult<HydrationPayload> {
        self.serve("hydration", date)
    }

    async fn training_readiness(
        &self,
        date: NaiveDate,
    ) -> ProviderResult<Vec<TrainingReadinessEntry>> {
        self.serve("training_readiness", date)
    }

    async fn sleep(&self, date: NaiveDate) -> ProviderResult<SleepPayload> {
        self.serve("sleep", date)
    }

    async fn hrv(&self, date: NaiveDate) -> ProviderResult<HrvPayload> {
        self.serve("hrv", date)
    }

    async fn respiration(&self, date: NaiveDate) -> ProviderResult<RespirationPayload> {
        self.serve("respiration", date)
    }

    async fn steps_intraday(&self, date: NaiveDate) -> ProviderResult<Vec<StepsBucket>> {
        self.serve("steps_intraday", date)
    }

    async fn activities(
        &self,
        start: NaiveDate,
        _end: NaiveDate,
    ) -> ProviderResult<Vec<ActivityPayload>> {
        self.serve("activities", start)
    }

    async fn body_composition(
        &self,
        start: NaiveDate,
        _end: NaiveDate,
    ) -> ProviderResult<BodyCompositionPayload> {
        self.serve("body_composition", start)
    }

    async fn download_activity_file(&self, activity_id: &str) -> ProviderResult<Bytes> {
        self.record("download_activity_file", None);
        self.files
            .lock()
            .unwrap()
            .get(activity_id)
            .cloned()
            .ok_or_else(|| ProviderError::not_available(format!("activity file {activity_id}")))
    }

    async fn reauthenticate(&self) -> ProviderResult<()> {
        self.record("reauthenticate", None);
        self.reauthentications.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Clock that only moves when told to
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}
