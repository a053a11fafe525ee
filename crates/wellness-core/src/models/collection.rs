// ABOUTME: Collection ledger entry types with run status and collection type enumerations
// ABOUTME: A run is opened as running and closed exactly once with success or error
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::DatabaseError;

/// What triggered a collection run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionType {
    /// Window chosen by the sync state tracker
    Sync,
    /// Fixed days-back window requested by an operator
    Bulk,
}

impl CollectionType {
    /// Value stored in `collection_log.collection_type`
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sync => "sync",
            Self::Bulk => "bulk",
        }
    }
}

impl fmt::Display for CollectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollectionType {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sync" => Ok(Self::Sync),
            "bulk" => Ok(Self::Bulk),
            other => Err(DatabaseError::InvalidData {
                field: "collection_type".to_owned(),
                reason: format!("unknown collection type '{other}'"),
            }),
        }
    }
}

/// Lifecycle state of a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Opened, not yet closed
    Running,
    /// Loop completed, possibly with per-unit failures
    Success,
    /// Aborted by a fatal error
    Error,
}

impl RunStatus {
    /// Value stored in `collection_log.status`
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Success => "success",
            Self::Error => "error",
        }
    }

    /// Whether the status is a closing status
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(Self::Running),
            "success" => Ok(Self::Success),
            "error" => Ok(Self::Error),
            other => Err(DatabaseError::InvalidData {
                field: "status".to_owned(),
                reason: format!("unknown run status '{other}'"),
            }),
        }
    }
}

/// One row of the collection ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionRun {
    /// Ledger entry id
    pub id: i64,
    /// What triggered the run
    pub collection_type: CollectionType,
    /// When the run was opened
    pub start_time: DateTime<Utc>,
    /// When the run was closed
    pub end_time: Option<DateTime<Utc>>,
    /// Current status
    pub status: RunStatus,
    /// Rows inserted or updated by the run
    pub records_collected: i64,
    /// Failure summary, if any
    pub error_message: Option<String>,
}

impl CollectionRun {
    /// Wall-clock duration, once closed
    #[must_use]
    pub fn duration(&self) -> Option<TimeDelta> {
        self.end_time.map(|end| end - self.start_time)
    }
}
