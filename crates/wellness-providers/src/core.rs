// ABOUTME: Core data source trait with one typed method per remote metric family
// ABOUTME: Defines the capability contract the collection orchestrator needs from a client
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Remote Data Source Contract
//!
//! Every method is a fixed capability: there is no runtime probing for whether an
//! endpoint exists. A source that cannot serve a family answers with
//! [`ProviderError::NotSupported`](crate::ProviderError::NotSupported), a source
//! with nothing to report for a date answers with
//! [`ProviderError::NotAvailable`](crate::ProviderError::NotAvailable), and a
//! rejected session is always [`ProviderError::AuthExpired`](crate::ProviderError::AuthExpired).
//!
//! Session lifecycle belongs to the implementation. Callers only need
//! [`WellnessDataSource::reauthenticate`] after an auth-expired failure.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::ProviderResult;
use crate::payloads::{
    ActivityPayload, BodyBatteryReport, BodyCompositionPayload, DailySummaryPayload,
    HeartRatePayload, HrvPayload, HydrationPayload, RespirationPayload, SleepPayload,
    StepsBucket, StressPayload, TrainingReadinessEntry, UserProfilePayload,
};

/// Authentication credentials for `OAuth2` sessions
///
/// Produced by the login flow outside this service and refreshed in place by
/// [`WellnessDataSource::reauthenticate`].
#[derive(Clone, Serialize, Deserialize)]
pub struct OAuth2Credentials {
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Current access token
    pub access_token: Option<String>,
    /// Refresh token for obtaining new access tokens
    pub refresh_token: Option<String>,
    /// When the access token expires
    pub expires_at: Option<DateTime<Utc>>,
}

impl OAuth2Credentials {
    /// Whether the access token is missing or past its expiry
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.access_token.is_none() || self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }
}

impl fmt::Debug for OAuth2Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuth2Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Authenticated client able to fetch every supported metric family
#[async_trait]
pub trait WellnessDataSource: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &'static str;

    /// Account identity of the authenticated user
    async fn user_profile(&self) -> ProviderResult<UserProfilePayload>;

    /// When the user's device last uploaded data to the remote
    async fn device_last_sync_time(&self) -> ProviderResult<DateTime<Utc>>;

    /// Daily totals: steps, distance, calories, floors, activity minutes
    async fn daily_summary(&self, date: NaiveDate) -> ProviderResult<DailySummaryPayload>;

    /// Heart rate summary plus intraday `[timestamp, bpm]` tuples
    async fn heart_rates(&self, date: NaiveDate) -> ProviderResult<HeartRatePayload>;

    /// Stress summary plus intraday stress and body battery tuples
    async fn stress(&self, date: NaiveDate) -> ProviderResult<StressPayload>;

    /// Body battery daily reports
    async fn body_battery(&self, date: NaiveDate) -> ProviderResult<Vec<BodyBatteryReport>>;

    /// Water intake
    async fn hydration(&self, date: NaiveDate) -> ProviderResult<HydrationPayload>;

    /// Training readiness entries recorded on the date
    async fn training_readiness(
        &self,
        date: NaiveDate,
    ) -> ProviderResult<Vec<TrainingReadinessEntry>>;

    /// Sleep session ending on the date
    async fn sleep(&self, date: NaiveDate) -> ProviderResult<SleepPayload>;

    /// Overnight HRV readings
    async fn hrv(&self, date: NaiveDate) -> ProviderResult<HrvPayload>;

    /// Respiration samples
    async fn respiration(&self, date: NaiveDate) -> ProviderResult<RespirationPayload>;

    /// Step count buckets
    async fn steps_intraday(&self, date: NaiveDate) -> ProviderResult<Vec<StepsBucket>>;

    /// Activities started within `[start, end]`
    async fn activities(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ProviderResult<Vec<ActivityPayload>>;

    /// Weigh-ins within `[start, end]`
    async fn body_composition(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ProviderResult<BodyCompositionPayload>;

    /// Original file of one activity
    async fn download_activity_file(&self, activity_id: &str) -> ProviderResult<Bytes>;

    /// Renew the session after an auth-expired failure
    async fn reauthenticate(&self) -> ProviderResult<()>;
}
