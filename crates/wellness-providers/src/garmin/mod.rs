// ABOUTME: Garmin Connect data source module
// ABOUTME: Re-exports the provider, its configuration, and status classification
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

mod provider;

pub use provider::{classify_status, GarminConfig, GarminConnectProvider};
