// ABOUTME: Minimum-gap rate limiter enforcing a configured delay between consecutive remote calls
// ABOUTME: Delay depends on the call class, with binary downloads spaced further apart than JSON calls
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};
use tracing::trace;

use crate::constants::defaults;

/// Remote quota class of a call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallClass {
    /// JSON metric endpoint
    Json,
    /// Binary file download
    FileDownload,
}

impl CallClass {
    /// Name for logs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::FileDownload => "file_download",
        }
    }
}

/// Minimum gap enforced before each call class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Gap before a JSON call
    pub json_delay: Duration,
    /// Gap before a file download
    pub download_delay: Duration,
}

impl RateLimitPolicy {
    /// Policy with explicit delays
    #[must_use]
    pub const fn new(json_delay: Duration, download_delay: Duration) -> Self {
        Self {
            json_delay,
            download_delay,
        }
    }

    /// No delay at all, for tests and local fixtures
    #[must_use]
    pub const fn unthrottled() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    /// Delay applied before a call of `class`
    #[must_use]
    pub const fn delay_for(&self, class: CallClass) -> Duration {
        match class {
            CallClass::Json => self.json_delay,
            CallClass::FileDownload => self.download_delay,
        }
    }
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(defaults::RATE_LIMIT_DELAY_MS),
            Duration::from_millis(defaults::DOWNLOAD_RATE_LIMIT_DELAY_MS),
        )
    }
}

/// Sequential rate limiter
///
/// `acquire` waits until the configured gap for the upcoming call's class has
/// elapsed since the previous call was released. The first call goes through
/// immediately. The lock is held while waiting, so concurrent callers are
/// serialized in arrival order.
#[derive(Debug)]
pub struct RateLimiter {
    policy: RateLimitPolicy,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a limiter with the given policy
    #[must_use]
    pub const fn new(policy: RateLimitPolicy) -> Self {
        Self {
            policy,
            last_call: Mutex::const_new(None),
        }
    }

    /// Policy in effect
    #[must_use]
    pub const fn policy(&self) -> RateLimitPolicy {
        self.policy
    }

    /// Block until a call of `class` may be issued
    pub async fn acquire(&self, class: CallClass) {
        let mut last_call = self.last_call.lock().await;
        if let Some(previous) = *last_call {
            let ready_at = previous + self.policy.delay_for(class);
            if ready_at > Instant::now() {
                trace!(class = class.as_str(), "Rate limiter delaying next remote call");
                sleep_until(ready_at).await;
            }
        }
        *last_call = Some(Instant::now());
    }
}
