// ABOUTME: Structured error types for remote data source operations
// ABOUTME: Distinguishes fatal auth expiry from per-unit recoverable and retryable failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use thiserror::Error;

/// Failure reported by the remote data source for a single call
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The session was rejected; fatal to the whole run
    #[error("{provider} session expired or was rejected")]
    AuthExpired {
        /// Provider name
        provider: String,
    },

    /// The remote has no data for the requested resource
    #[error("no data available for {resource}")]
    NotAvailable {
        /// Resource description, e.g. `sleep 2024-03-01`
        resource: String,
    },

    /// The endpoint is not offered for the current account or device
    #[error("endpoint {endpoint} is not supported for this account")]
    NotSupported {
        /// Endpoint path
        endpoint: String,
    },

    /// Remote throttled the call
    #[error("rate limited by remote (retry after {retry_after_secs:?}s)")]
    RateLimited {
        /// Retry-After hint in seconds, when provided
        retry_after_secs: Option<u64>,
    },

    /// The call exceeded its per-call timeout
    #[error("remote call timed out after {seconds}s")]
    Timeout {
        /// Configured timeout in seconds
        seconds: u64,
    },

    /// Unexpected status or server-side failure
    #[error("remote call failed (status {status:?}): {message}")]
    Transient {
        /// HTTP status, when one was received
        status: Option<u16>,
        /// Failure detail
        message: String,
    },

    /// Connection-level failure
    #[error("network error: {0}")]
    Network(String),

    /// The payload did not have the expected shape
    #[error("malformed payload for {resource}: {reason}")]
    MalformedPayload {
        /// Resource description
        resource: String,
        /// Why decoding failed
        reason: String,
    },

    /// Client is misconfigured (missing credentials, bad URL)
    #[error("provider configuration error: {0}")]
    Config(String),
}

impl ProviderError {
    /// Shorthand for a missing-data failure
    pub fn not_available(resource: impl Into<String>) -> Self {
        Self::NotAvailable {
            resource: resource.into(),
        }
    }

    /// Shorthand for a decoding failure
    pub fn malformed(resource: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedPayload {
            resource: resource.into(),
            reason: reason.into(),
        }
    }

    /// Whether this failure must abort the run instead of skipping the unit
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::AuthExpired { .. })
    }

    /// Whether repeating the same call later could succeed
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::Timeout { .. } | Self::Transient { .. } | Self::Network(_)
        )
    }

    /// Short machine-friendly label for logs and ledger messages
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::AuthExpired { .. } => "auth_expired",
            Self::NotAvailable { .. } => "not_available",
            Self::NotSupported { .. } => "not_supported",
            Self::RateLimited { .. } => "rate_limited",
            Self::Timeout { .. } => "timeout",
            Self::Transient { .. } => "transient",
            Self::Network(_) => "network",
            Self::MalformedPayload { .. } => "malformed_payload",
            Self::Config(_) => "config",
        }
    }
}

#[cfg(feature = "provider-errors")]
impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            // reqwest does not expose the configured duration on the error
            Self::Timeout { seconds: 0 }
        } else if error.is_decode() {
            Self::MalformedPayload {
                resource: error
                    .url()
                    .map_or_else(|| "response".to_owned(), |url| url.path().to_owned()),
                reason: error.to_string(),
            }
        } else if let Some(status) = error.status() {
            Self::Transient {
                status: Some(status.as_u16()),
                message: error.to_string(),
            }
        } else {
            Self::Network(error.to_string())
        }
    }
}

/// Result type for remote data source calls
pub type ProviderResult<T> = Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_auth_expiry_is_fatal() {
        assert!(ProviderError::AuthExpired {
            provider: "garmin".to_owned()
        }
        .is_fatal());
        assert!(!ProviderError::Timeout { seconds: 30 }.is_fatal());
        assert!(!ProviderError::malformed("steps", "bad").is_fatal());
    }

    #[test]
    fn test_permanent_failures_are_not_retryable() {
        assert!(!ProviderError::not_available("sleep 2024-01-01").is_retryable());
        assert!(!ProviderError::NotSupported {
            endpoint: "/steps".to_owned()
        }
        .is_retryable());
        assert!(!ProviderError::malformed("hrv", "missing field").is_retryable());
        assert!(ProviderError::Network("reset".to_owned()).is_retryable());
        assert!(ProviderError::RateLimited {
            retry_after_secs: None
        }
        .is_retryable());
    }
}
