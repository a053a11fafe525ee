// ABOUTME: Synchronization layer deciding what to collect and driving collection cycles
// ABOUTME: Holds the checkpoint tracker and the single, continuous and bulk entry points
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Continuous, single-cycle and bulk entry points
pub mod service;
/// Checkpoint comparison and commit
pub mod tracker;

pub use service::{Clock, SyncCycleOutcome, SyncService, SystemClock};
pub use tracker::{SyncDecision, SyncStateTracker};
