// ABOUTME: Core types and constants for the wellness telemetry sync service
// ABOUTME: Foundation crate with error handling, normalized record models, and constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Wellness Core
//!
//! Foundation crate providing shared types for the wellness sync service. This crate
//! is designed to change infrequently, enabling incremental compilation benefits in
//! the workspace.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError`, `ErrorCode`, and domain-specific errors
//! - **constants**: Checkpoint keys, configuration defaults and environment variable names
//! - **models**: Normalized records, metric families and collection run ledger types

/// Unified error handling system with standard error codes
pub mod errors;

/// Application constants and configuration defaults
pub mod constants;

/// Normalized records, metric families and ledger types
pub mod models;
