// ABOUTME: Main library entry point for the wellness telemetry sync service
// ABOUTME: Collects Garmin Connect health data into a local SQLite store with an auditable ledger
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Wellness Sync
//!
//! Pulls personal health telemetry from a remote wellness platform and persists it
//! into a local relational store.
//!
//! ## Architecture
//!
//! - **Sync**: compares the local checkpoint with the remote device sync time and
//!   decides the window that needs collecting
//! - **Orchestrator**: walks the window newest day first through every selected
//!   extractor, isolating per-unit failures
//! - **Collectors**: one extractor per metric family, each a typed fetch plus a
//!   pure normalization step
//! - **Database**: natural-key upserts and insert-if-absent writes per entity
//! - **Ledger**: append-only audit trail of every collection run
//!
//! The remote client, rate limiter and payload types live in the
//! `wellness-providers` crate.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use wellness_sync::config::SyncConfig;
//! use wellness_sync::errors::AppResult;
//!
//! fn main() -> AppResult<()> {
//!     let config = SyncConfig::from_env()?;
//!     println!("{}", config.summary());
//!     Ok(())
//! }
//! ```

/// Metric extractors and the extractor registry
pub mod collectors;

/// Environment configuration
pub mod config;

/// SQLite persistence for collected records, checkpoints and the ledger
pub mod database;

/// Append-only collection run ledger
pub mod ledger;

/// Structured logging setup
pub mod logging;

/// Collection orchestrator and run statistics
pub mod orchestrator;

/// Sync state tracking and collection entry points
pub mod sync;

// Re-export wellness-core modules so crate code can keep `use crate::errors::*`
pub use wellness_core::constants;
pub use wellness_core::errors;
pub use wellness_core::models;
