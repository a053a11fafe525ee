// ABOUTME: Garmin Connect API client implementing the wellness data source contract
// ABOUTME: Maps HTTP statuses to provider errors and decodes each endpoint into its typed payload
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::constants::{defaults, providers};
use crate::core::{OAuth2Credentials, WellnessDataSource};
use crate::errors::{ProviderError, ProviderResult};
use crate::http_client::shared_client;
use crate::payloads::{
    ActivityPayload, BodyBatteryReport, BodyCompositionPayload, DailySummaryPayload,
    DeviceLastUsedPayload, HeartRatePayload, HrvPayload, HydrationPayload, RespirationPayload,
    SleepPayload, StepsBucket, StressPayload, TrainingReadinessEntry, UserProfilePayload,
};
use crate::utils;

/// Upper bound on activities returned by one search
const ACTIVITY_SEARCH_LIMIT: u32 = 100;

/// Garmin Connect endpoints
#[derive(Debug, Clone)]
pub struct GarminConfig {
    /// Base URL for API calls
    pub api_base_url: String,
    /// OAuth token endpoint used for refresh
    pub token_url: String,
}

impl Default for GarminConfig {
    fn default() -> Self {
        Self {
            api_base_url: defaults::GARMIN_API_BASE_URL.to_owned(),
            token_url: defaults::GARMIN_TOKEN_URL.to_owned(),
        }
    }
}

/// Map a non-success HTTP status to the provider error it represents
///
/// Returns `None` for success statuses other than `204 No Content`.
#[must_use]
pub fn classify_status(
    status: StatusCode,
    endpoint: &str,
    retry_after_secs: Option<u64>,
) -> Option<ProviderError> {
    match status {
        StatusCode::NO_CONTENT | StatusCode::NOT_FOUND => {
            Some(ProviderError::not_available(endpoint))
        }
        StatusCode::UNAUTHORIZED => Some(ProviderError::AuthExpired {
            provider: providers::GARMIN.to_owned(),
        }),
        StatusCode::FORBIDDEN => Some(ProviderError::NotSupported {
            endpoint: endpoint.to_owned(),
        }),
        StatusCode::TOO_MANY_REQUESTS => Some(ProviderError::RateLimited { retry_after_secs }),
        status if status.is_success() => None,
        status => Some(ProviderError::Transient {
            status: Some(status.as_u16()),
            message: format!("unexpected status from {endpoint}"),
        }),
    }
}

/// Garmin Connect client
pub struct GarminConnectProvider {
    config: GarminConfig,
    credentials: RwLock<Option<OAuth2Credentials>>,
    display_name: RwLock<Option<String>>,
    client: Client,
}

impl GarminConnectProvider {
    /// Create a client for an existing session
    #[must_use]
    pub fn new(config: GarminConfig, credentials: Option<OAuth2Credentials>) -> Self {
        Self {
            config,
            credentials: RwLock::new(credentials),
            display_name: RwLock::new(None),
            // Clone Arc<Client> from shared singleton
            client: shared_client().clone(),
        }
    }

    /// Current access token, or `AuthExpired` when the session cannot be used
    async fn access_token(&self) -> ProviderResult<String> {
        let credentials = self
            .credentials
            .read()
            .await
            .clone()
            .ok_or_else(|| ProviderError::Config("No Garmin credentials configured".to_owned()))?;
        if credentials.is_expired(Utc::now()) {
            return Err(ProviderError::AuthExpired {
                provider: providers::GARMIN.to_owned(),
            });
        }
        credentials
            .access_token
            .ok_or_else(|| ProviderError::Config("No Garmin access token".to_owned()))
    }

    async fn send(&self, endpoint: &str) -> ProviderResult<Response> {
        let access_token = self.access_token().await?;
        let url = format!(
            "{}/{}",
            self.config.api_base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        );
        debug!(endpoint, "Garmin API request");

        let response = self
            .client
            .get(&url)
            .bearer_auth(access_token)
            .send()
            .await?;

        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<u64>().ok());

        match classify_status(response.status(), endpoint, retry_after) {
            Some(error) => {
                if matches!(error, ProviderError::AuthExpired { .. }) {
                    warn!(endpoint, "Garmin rejected the session");
                }
                Err(error)
            }
            None => Ok(response),
        }
    }

    /// GET `endpoint` and decode the JSON body
    ///
    /// An empty or `null` body means the remote has no data for the resource.
    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> ProviderResult<T> {
        let body = self.send(endpoint).await?.text().await?;
        let trimmed = body.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return Err(ProviderError::not_available(endpoint));
        }
        serde_json::from_str(trimmed)
            .map_err(|e| ProviderError::malformed(endpoint, e.to_string()))
    }

    async fn display_name(&self) -> ProviderResult<String> {
        let cached = self.display_name.read().await.clone();
        if let Some(name) = cached {
            return Ok(name);
        }
        let profile = self.user_profile().await?;
        profile.display_name.ok_or_else(|| {
            ProviderError::malformed("userprofile-service/socialProfile", "missing displayName")
        })
    }
}

#[async_trait]
impl WellnessDataSource for GarminConnectProvider {
    fn name(&self) -> &'static str {
        providers::GARMIN
    }

    async fn user_profile(&self) -> ProviderResult<UserProfilePayload> {
        let profile: UserProfilePayload =
            self.get_json("userprofile-service/socialProfile").await?;
        if let Some(name) = &profile.display_name {
            *self.display_name.write().await = Some(name.clone());
        }
        Ok(profile)
    }

    async fn device_last_sync_time(&self) -> ProviderResult<DateTime<Utc>> {
        let endpoint = "device-service/deviceservice/mylastused";
        let payload: DeviceLastUsedPayload = self.get_json(endpoint).await?;
        payload
            .last_used_device_upload_time
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .ok_or_else(|| ProviderError::not_available(endpoint))
    }

    async fn daily_summary(&self, date: NaiveDate) -> ProviderResult<DailySummaryPayload> {
        let display_name = self.display_name().await?;
        self.get_json(&format!(
            "usersummary-service/usersummary/daily/{display_name}?calendarDate={date}"
        ))
        .await
    }

    async fn heart_rates(&self, date: NaiveDate) -> ProviderResult<HeartRatePayload> {
        let display_name = self.display_name().await?;
        self.get_json(&format!(
            "wellness-service/wellness/dailyHeartRate/{display_name}?date={date}"
        ))
        .await
    }

    async fn stress(&self, date: NaiveDate) -> ProviderResult<StressPayload> {
        self.get_json(&format!("wellness-service/wellness/dailyStress/{date}"))
            .await
    }

    async fn body_battery(&self, date: NaiveDate) -> ProviderResult<Vec<BodyBatteryReport>> {
        self.get_json(&format!(
            "wellness-service/wellness/bodyBattery/reports/daily?startDate={date}&endDate={date}"
        ))
        .await
    }

    async fn hydration(&self, date: NaiveDate) -> ProviderResult<HydrationPayload> {
        self.get_json(&format!(
            "usersummary-service/usersummary/hydration/daily/{date}"
        ))
        .await
    }

    async fn training_readiness(
        &self,
        date: NaiveDate,
    ) -> ProviderResult<Vec<TrainingReadinessEntry>> {
        self.get_json(&format!("metrics-service/metrics/trainingreadiness/{date}"))
            .await
    }

    async fn sleep(&self, date: NaiveDate) -> ProviderResult<SleepPayload> {
        let display_name = self.display_name().await?;
        self.get_json(&format!(
            "wellness-service/wellness/dailySleepData/{display_name}?date={date}&nonSleepBufferMinutes=60"
        ))
        .await
    }

    async fn hrv(&self, date: NaiveDate) -> ProviderResult<HrvPayload> {
        self.get_json(&format!("hrv-service/hrv/{date}")).await
    }

    async fn respiration(&self, date: NaiveDate) -> ProviderResult<RespirationPayload> {
        self.get_json(&format!("wellness-service/wellness/daily/respiration/{date}"))
            .await
    }

    async fn steps_intraday(&self, date: NaiveDate) -> ProviderResult<Vec<StepsBucket>> {
        let display_name = self.display_name().await?;
        self.get_json(&format!(
            "wellness-service/wellness/dailySummaryChart/{display_name}?date={date}"
        ))
        .await
    }

    async fn activities(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ProviderResult<Vec<ActivityPayload>> {
        self.get_json(&format!(
            "activitylist-service/activities/search/activities?startDate={start}&endDate={end}&start=0&limit={ACTIVITY_SEARCH_LIMIT}"
        ))
        .await
    }

    async fn body_composition(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ProviderResult<BodyCompositionPayload> {
        self.get_json(&format!(
            "weight-service/weight/dateRange?startDate={start}&endDate={end}"
        ))
        .await
    }

    async fn download_activity_file(&self, activity_id: &str) -> ProviderResult<Bytes> {
        let endpoint = format!("download-service/files/activity/{activity_id}");
        let bytes = self.send(&endpoint).await?.bytes().await?;
        if bytes.is_empty() {
            return Err(ProviderError::not_available(endpoint));
        }
        Ok(bytes)
    }

    async fn reauthenticate(&self) -> ProviderResult<()> {
        let current = self
            .credentials
            .read()
            .await
            .clone()
            .ok_or_else(|| ProviderError::Config("No Garmin credentials configured".to_owned()))?;

        let refreshed = utils::refresh_oauth_token(
            &self.client,
            &self.config.token_url,
            &current,
            "Garmin",
        )
        .await?;

        info!(expires_at = ?refreshed.expires_at, "Garmin session renewed");
        *self.credentials.write().await = Some(refreshed);
        Ok(())
    }
}
