// ABOUTME: Process-wide HTTP client shared by every remote data source
// ABOUTME: Request and connect timeouts are fixed once at startup, before the first call
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use reqwest::{Client, ClientBuilder};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::warn;

use crate::constants::defaults;

/// Connect timeout used when startup did not configure one
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Idle pooled connections are dropped after this long
const POOL_IDLE_TIMEOUT_SECS: u64 = 90;

const USER_AGENT: &str = concat!("wellness-sync/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Copy)]
struct ClientTimeouts {
    request: Duration,
    connect: Duration,
}

static CLIENT_TIMEOUTS: OnceLock<ClientTimeouts> = OnceLock::new();
static SHARED_CLIENT: OnceLock<Client> = OnceLock::new();

/// Fix the timeouts of the shared client
///
/// Only the first call has an effect, and only if no client was built yet.
pub fn initialize_shared_client(timeout_secs: u64, connect_timeout_secs: u64) {
    let applied = CLIENT_TIMEOUTS
        .set(ClientTimeouts {
            request: Duration::from_secs(timeout_secs),
            connect: Duration::from_secs(connect_timeout_secs),
        })
        .is_ok();
    if !applied || SHARED_CLIENT.get().is_some() {
        warn!("Shared HTTP client already configured, ignoring new timeouts");
    }
}

/// The shared client, built on first use
#[must_use]
pub fn shared_client() -> &'static Client {
    SHARED_CLIENT.get_or_init(|| {
        let timeouts = CLIENT_TIMEOUTS.get().copied().unwrap_or_else(|| ClientTimeouts {
            request: Duration::from_secs(defaults::CALL_TIMEOUT_SECS),
            connect: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        });

        ClientBuilder::new()
            .timeout(timeouts.request)
            .connect_timeout(timeouts.connect)
            .pool_idle_timeout(Duration::from_secs(POOL_IDLE_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to a default HTTP client");
                Client::new()
            })
    })
}
