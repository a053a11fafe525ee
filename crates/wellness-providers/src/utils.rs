// ABOUTME: Shared utilities for data source implementations
// ABOUTME: Type conversions for remote numeric fields and the OAuth2 refresh-token grant
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{TimeDelta, TimeZone, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::info;

use crate::core::OAuth2Credentials;
use crate::errors::{ProviderError, ProviderResult};

/// Type conversion utilities for remote numeric fields
pub mod conversions {
    /// Round a remote float to the nearest integer, rejecting non-finite values
    ///
    /// The remote reports counts such as calories and floors as floats.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::missing_const_for_fn
    )]
    #[must_use]
    pub fn f64_to_i64(value: f64) -> Option<i64> {
        if value.is_finite() {
            Some(value.round().clamp(i64::MIN as f64, i64::MAX as f64) as i64)
        } else {
            None
        }
    }

    /// Grams to kilograms
    #[allow(clippy::missing_const_for_fn)]
    #[must_use]
    pub fn grams_to_kg(grams: f64) -> f64 {
        grams / 1000.0
    }
}

/// Token endpoint response
#[derive(Debug, Deserialize)]
struct TokenRefreshResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    expires_at: Option<i64>,
}

/// Exchange a refresh token for a new access token
///
/// The refresh token is kept when the endpoint does not rotate it.
///
/// # Errors
///
/// Returns `AuthExpired` when the token endpoint rejects the refresh token, and a
/// network or transient error when the request itself fails.
pub async fn refresh_oauth_token(
    client: &Client,
    token_url: &str,
    credentials: &OAuth2Credentials,
    provider_name: &str,
) -> ProviderResult<OAuth2Credentials> {
    let refresh_token = credentials
        .refresh_token
        .as_deref()
        .ok_or_else(|| ProviderError::Config(format!("No {provider_name} refresh token available")))?;

    info!("Refreshing {provider_name} access token");

    let params = [
        ("client_id", credentials.client_id.as_str()),
        ("client_secret", credentials.client_secret.as_str()),
        ("grant_type", "refresh_token"),
        ("refresh_token", refresh_token),
    ];

    let response = client.post(token_url).form(&params).send().await?;

    let status = response.status();
    if matches!(status, StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED) {
        return Err(ProviderError::AuthExpired {
            provider: provider_name.to_owned(),
        });
    }
    if !status.is_success() {
        return Err(ProviderError::Transient {
            status: Some(status.as_u16()),
            message: format!("{provider_name} token refresh failed"),
        });
    }

    let token_response: TokenRefreshResponse = response.json().await?;

    let expires_at = token_response
        .expires_at
        .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
        .or_else(|| {
            token_response
                .expires_in
                .map(|secs| Utc::now() + TimeDelta::seconds(secs))
        });

    Ok(OAuth2Credentials {
        client_id: credentials.client_id.clone(),
        client_secret: credentials.client_secret.clone(),
        access_token: Some(token_response.access_token),
        refresh_token: token_response
            .refresh_token
            .or_else(|| credentials.refresh_token.clone()),
        expires_at,
    })
}

#[cfg(test)]
mod tests {
    use super::conversions::{f64_to_i64, grams_to_kg};

    #[test]
    fn test_f64_to_i64_rounds_and_rejects_nan() {
        assert_eq!(f64_to_i64(12.6), Some(13));
        assert_eq!(f64_to_i64(-0.4), Some(0));
        assert_eq!(f64_to_i64(f64::NAN), None);
        assert_eq!(f64_to_i64(f64::INFINITY), None);
    }

    #[test]
    fn test_grams_to_kg() {
        assert!((grams_to_kg(72_450.0) - 72.45).abs() < f64::EPSILON);
    }
}
