// ABOUTME: Remote wellness data source implementations and call-level infrastructure
// ABOUTME: Capability trait, typed payloads, Garmin Connect client, rate limiter, and throttling
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Remote data source implementations and core abstractions.
//!
//! The collection orchestrator only ever talks to a [`WellnessDataSource`]. Every
//! metric family has one typed method on that trait, and every failure comes back
//! as a [`ProviderError`] variant the caller can match on.

// Re-export wellness-core modules so provider code can keep `use crate::errors::*`
pub use wellness_core::constants;
pub use wellness_core::errors;

/// Core data source trait and credentials
pub mod core;
/// Garmin Connect implementation
pub mod garmin;
/// Shared HTTP client for remote API calls
pub mod http_client;
/// Typed remote payloads, one per metric family
pub mod payloads;
/// Minimum-gap rate limiter with per-call-class delays
pub mod rate_limiter;
/// Rate limiting and timeout decorator for any data source
pub mod throttled;
/// Provider utility functions (token refresh, type conversion)
pub mod utils;

pub use core::{OAuth2Credentials, WellnessDataSource};
pub use garmin::{GarminConfig, GarminConnectProvider};
pub use http_client::{initialize_shared_client, shared_client};
pub use rate_limiter::{CallClass, RateLimitPolicy, RateLimiter};
pub use throttled::ThrottledSource;
pub use wellness_core::errors::provider::{ProviderError, ProviderResult};
