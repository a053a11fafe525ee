// ABOUTME: Structured error types for the local relational store
// ABOUTME: Provides domain-specific errors with context for persistence and ledger failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use thiserror::Error;

/// Persistence layer failure
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Could not open the store at all
    #[error("failed to connect to database: {context}")]
    ConnectionFailed {
        /// Connection failure detail
        context: String,
    },

    /// Schema creation failed
    #[error("database migration failed: {context}")]
    MigrationFailed {
        /// Migration failure detail
        context: String,
    },

    /// A statement failed
    #[error("database query failed: {context}")]
    QueryError {
        /// Query failure detail
        context: String,
    },

    /// Stored data could not be decoded
    #[error("invalid stored value for {field}: {reason}")]
    InvalidData {
        /// Column or key name
        field: String,
        /// Decoding failure detail
        reason: String,
    },

    /// Requested row does not exist
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity name
        entity: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// Ledger entry already carries a terminal status
    #[error("collection run {run_id} is already closed")]
    AlreadyClosed {
        /// Ledger entry id
        run_id: i64,
    },
}

impl DatabaseError {
    /// Wrap a failing statement with context
    pub fn query(context: impl Into<String>) -> Self {
        Self::QueryError {
            context: context.into(),
        }
    }
}

#[cfg(feature = "database-errors")]
use sqlx::Error as SqlxError;

#[cfg(feature = "database-errors")]
impl From<SqlxError> for DatabaseError {
    fn from(error: SqlxError) -> Self {
        match error {
            SqlxError::PoolTimedOut | SqlxError::PoolClosed | SqlxError::Io(_) => {
                Self::ConnectionFailed {
                    context: error.to_string(),
                }
            }
            other => Self::QueryError {
                context: other.to_string(),
            },
        }
    }
}
