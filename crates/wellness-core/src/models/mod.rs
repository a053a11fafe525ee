// ABOUTME: Core data models for the wellness sync service
// ABOUTME: Re-exports normalized records, metric families and collection ledger types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Data Models
//!
//! - `NormalizedRecord` and its record types are what extractors emit and the
//!   persistence layer stores
//! - `MetricFamily` names one unit of collection per date
//! - `CollectionRun` is one ledger entry

mod collection;
mod metrics;
mod records;

pub use collection::{CollectionRun, CollectionType, RunStatus};
pub use metrics::{IntradayMetric, MetricFamily};
pub use records::{
    ActivityFile, ActivityRecord, BodyCompositionRecord, DailyMetricRecord, IntradaySample,
    NormalizedRecord, SleepRecord, UserProfileRecord,
};
