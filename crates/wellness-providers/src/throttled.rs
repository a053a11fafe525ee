// ABOUTME: Decorator that routes every data source call through the rate limiter and a timeout
// ABOUTME: Timeouts surface as ProviderError::Timeout so callers treat them like any unit failure
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, NaiveDate, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::core::WellnessDataSource;
use crate::errors::{ProviderError, ProviderResult};
use crate::payloads::{
    ActivityPayload, BodyBatteryReport, BodyCompositionPayload, DailySummaryPayload,
    HeartRatePayload, HrvPayload, HydrationPayload, RespirationPayload, SleepPayload,
    StepsBucket, StressPayload, TrainingReadinessEntry, UserProfilePayload,
};
use crate::rate_limiter::{CallClass, RateLimiter};

/// Rate-limited, time-bounded view of another data source
///
/// Calls are never retried here. A timeout is reported once and the caller
/// moves on to its next unit.
pub struct ThrottledSource {
    inner: Arc<dyn WellnessDataSource>,
    limiter: Arc<RateLimiter>,
    call_timeout: Duration,
}

impl ThrottledSource {
    /// Wrap `inner`
    #[must_use]
    pub fn new(
        inner: Arc<dyn WellnessDataSource>,
        limiter: Arc<RateLimiter>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            inner,
            limiter,
            call_timeout,
        }
    }

    async fn guarded<T, F>(&self, class: CallClass, call: F) -> ProviderResult<T>
    where
        F: Future<Output = ProviderResult<T>> + Send,
    {
        self.limiter.acquire(class).await;
        timeout(self.call_timeout, call)
            .await
            .map_err(|_| ProviderError::Timeout {
                seconds: self.call_timeout.as_secs(),
            })?
    }
}

#[async_trait]
impl WellnessDataSource for ThrottledSource {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn user_profile(&self) -> ProviderResult<UserProfilePayload> {
        self.guarded(CallClass::Json, self.inner.user_profile()).await
    }

    async fn device_last_sync_time(&self) -> ProviderResult<DateTime<Utc>> {
        self.guarded(CallClass::Json, self.inner.device_last_sync_time())
            .await
    }

    async fn daily_summary(&self, date: NaiveDate) -> ProviderResult<DailySummaryPayload> {
        self.guarded(CallClass::Json, self.inner.daily_summary(date))
            .await
    }

    async fn heart_rates(&self, date: NaiveDate) -> ProviderResult<HeartRatePayload> {
        self.guarded(CallClass::Json, self.inner.heart_rates(date))
            .await
    }

    async fn stress(&self, date: NaiveDate) -> ProviderResult<StressPayload> {
        self.guarded(CallClass::Json, self.inner.stress(date)).await
    }

    async fn body_battery(&self, date: NaiveDate) -> ProviderResult<Vec<BodyBatteryReport>> {
        self.guarded(CallClass::Json, self.inner.body_battery(date))
            .await
    }

    async fn hydration(&self, date: NaiveDate) -> ProviderResult<HydrationPayload> {
        self.guarded(CallClass::Json, self.inner.hydration(date))
            .await
    }

    async fn training_readiness(
        &self,
        date: NaiveDate,
    ) -> ProviderResult<Vec<TrainingReadinessEntry>> {
        self.guarded(CallClass::Json, self.inner.training_readiness(date))
            .await
    }

    async fn sleep(&self, date: NaiveDate) -> ProviderResult<SleepPayload> {
        self.guarded(CallClass::Json, self.inner.sleep(date)).await
    }

    async fn hrv(&self, date: NaiveDate) -> ProviderResult<HrvPayload> {
        self.guarded(CallClass::Json, self.inner.hrv(date)).await
    }

    async fn respiration(&self, date: NaiveDate) -> ProviderResult<RespirationPayload> {
        self.guarded(CallClass::Json, self.inner.respiration(date))
            .await
    }

    async fn steps_intraday(&self, date: NaiveDate) -> ProviderResult<Vec<StepsBucket>> {
        self.guarded(CallClass::Json, self.inner.steps_intraday(date))
            .await
    }

    async fn activities(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ProviderResult<Vec<ActivityPayload>> {
        self.guarded(CallClass::Json, self.inner.activities(start, end))
            .await
    }

    async fn body_composition(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ProviderResult<BodyCompositionPayload> {
        self.guarded(CallClass::Json, self.inner.body_composition(start, end))
            .await
    }

    async fn download_activity_file(&self, activity_id: &str) -> ProviderResult<Bytes> {
        self.guarded(
            CallClass::FileDownload,
            self.inner.download_activity_file(activity_id),
        )
        .await
    }

    async fn reauthenticate(&self) -> ProviderResult<()> {
        self.guarded(CallClass::Json, self.inner.reauthenticate())
            .await
    }
}
