// ABOUTME: Unified error handling with application error codes and domain-specific error enums
// ABOUTME: Provides AppError for orchestration results plus provider and database error types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Unified Error Handling System
//!
//! Errors are raised at two seams and converted into a single top-level type:
//!
//! - [`provider::ProviderError`] for failures reported by the remote data source
//! - [`database::DatabaseError`] for failures of the local relational store
//! - [`AppError`] carries an [`ErrorCode`] and is what the orchestrator, the sync
//!   state tracker and the continuous sync loop return to their callers

/// Database error types
pub mod database;
/// Remote data source error types
pub mod provider;

pub use database::DatabaseError;
pub use provider::{ProviderError, ProviderResult};

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;

/// Standard error codes used throughout the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    // Authentication (1000-1999)
    /// The remote session is no longer valid
    #[serde(rename = "AUTH_EXPIRED")]
    AuthExpired = 1002,

    // Validation (3000-3999)
    /// Caller supplied an invalid argument
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput = 3000,

    // Resource Management (4000-4999)
    /// A requested resource does not exist
    #[serde(rename = "RESOURCE_NOT_FOUND")]
    ResourceNotFound = 4000,
    /// A resource was already finalized and cannot change
    #[serde(rename = "RESOURCE_LOCKED")]
    ResourceLocked = 4002,

    // External Services (5000-5999)
    /// The remote data source returned an error
    #[serde(rename = "EXTERNAL_SERVICE_ERROR")]
    ExternalServiceError = 5000,
    /// The remote data source could not be reached
    #[serde(rename = "EXTERNAL_SERVICE_UNAVAILABLE")]
    ExternalServiceUnavailable = 5001,
    /// The remote data source throttled us
    #[serde(rename = "EXTERNAL_RATE_LIMITED")]
    ExternalRateLimited = 5003,

    // Configuration (6000-6999)
    /// Required configuration is missing or invalid
    #[serde(rename = "CONFIG_ERROR")]
    ConfigError = 6000,

    // Internal Errors (9000-9999)
    /// Unexpected internal failure
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError = 9000,
    /// Database operation failed
    #[serde(rename = "DATABASE_ERROR")]
    DatabaseError = 9001,
    /// Data serialization/deserialization failed
    #[serde(rename = "SERIALIZATION_ERROR")]
    SerializationError = 9003,
}

impl ErrorCode {
    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::AuthExpired => "The remote session has expired and must be renewed",
            Self::InvalidInput => "The provided input is invalid",
            Self::ResourceNotFound => "The requested resource was not found",
            Self::ResourceLocked => "The resource is finalized and cannot be modified",
            Self::ExternalServiceError => "The remote data source encountered an error",
            Self::ExternalServiceUnavailable => "The remote data source is currently unavailable",
            Self::ExternalRateLimited => "The remote data source rate limit was exceeded",
            Self::ConfigError => "Configuration error encountered",
            Self::InternalError => "An internal error occurred",
            Self::DatabaseError => "Database operation failed",
            Self::SerializationError => "Data serialization/deserialization failed",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Unified error type for the application
#[derive(Debug)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Source error for error chaining
    pub source: Option<Box<dyn Error + Send + Sync>>,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Attach a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Remote session expired or was rejected
    pub fn auth_expired(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthExpired, message)
    }

    /// Invalid caller input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Resource not found
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ResourceNotFound, message)
    }

    /// Configuration problem
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Database failure
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Remote data source failure
    pub fn external_service(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ExternalServiceError, message)
    }

    /// Internal failure
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Whether this error means the remote session must be renewed before retrying
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        self.code == ErrorCode::AuthExpired
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn Error + 'static))
    }
}

impl From<ProviderError> for AppError {
    fn from(error: ProviderError) -> Self {
        let code = match &error {
            ProviderError::AuthExpired { .. } => ErrorCode::AuthExpired,
            ProviderError::RateLimited { .. } => ErrorCode::ExternalRateLimited,
            ProviderError::Network(_) | ProviderError::Timeout { .. } => {
                ErrorCode::ExternalServiceUnavailable
            }
            ProviderError::MalformedPayload { .. } => ErrorCode::SerializationError,
            ProviderError::Config(_) => ErrorCode::ConfigError,
            ProviderError::NotAvailable { .. }
            | ProviderError::NotSupported { .. }
            | ProviderError::Transient { .. } => ErrorCode::ExternalServiceError,
        };
        Self::new(code, error.to_string()).with_source(error)
    }
}

impl From<DatabaseError> for AppError {
    fn from(error: DatabaseError) -> Self {
        let code = match &error {
            DatabaseError::AlreadyClosed { .. } => ErrorCode::ResourceLocked,
            DatabaseError::NotFound { .. } => ErrorCode::ResourceNotFound,
            _ => ErrorCode::DatabaseError,
        };
        Self::new(code, error.to_string()).with_source(error)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::new(ErrorCode::SerializationError, error.to_string()).with_source(error)
    }
}

/// Result alias used across the application
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_expiry_maps_to_auth_code() {
        let error = AppError::from(ProviderError::AuthExpired {
            provider: "garmin".to_owned(),
        });
        assert!(error.is_auth_failure());
        assert!(error.source().is_some());
    }

    #[test]
    fn test_transient_failure_is_not_auth() {
        let error = AppError::from(ProviderError::Transient {
            status: Some(502),
            message: "bad gateway".to_owned(),
        });
        assert_eq!(error.code, ErrorCode::ExternalServiceError);
        assert!(!error.is_auth_failure());
    }

    #[test]
    fn test_ledger_double_close_is_locked() {
        let error = AppError::from(DatabaseError::AlreadyClosed { run_id: 7 });
        assert_eq!(error.code, ErrorCode::ResourceLocked);
        assert!(error.to_string().contains('7'));
    }
}
