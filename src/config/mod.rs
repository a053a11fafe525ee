// ABOUTME: Configuration module for the sync service
// ABOUTME: Environment-driven settings for storage, scheduling, rate limits and the remote source
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Environment variable configuration
pub mod environment;

pub use environment::SyncConfig;
