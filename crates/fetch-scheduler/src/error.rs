// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("invalid cron expression {0:?}: {1}")]
    InvalidCron(String, String),
    #[error("invalid fire time {0:?}: {1}")]
    InvalidTime(String, String),
    #[error("job not found: {0}")]
    NotFound(String),
    #[error("corrupt record {id}: {source}")]
    Corrupt {
        id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("database error: {0}")]
    Backend(#[source] anyhow::Error),
}

impl From<redb::Error> for SchedulerError {
    fn from(e: redb::Error) -> Self {
        SchedulerError::Backend(e.into())
    }
}

impl From<redb::DatabaseError> for SchedulerError {
    fn from(e: redb::DatabaseError) -> Self {
        SchedulerError::Backend(e.into())
    }
}

impl From<redb::TransactionError> for SchedulerError {
    fn from(e: redb::TransactionError) -> Self {
        SchedulerError::Backend(e.into())
    }
}

impl From<redb::TableError> for SchedulerError {
    fn from(e: redb::TableError) -> Self {
        SchedulerError::Backend(e.into())
    }
}

impl From<redb::CommitError> for SchedulerError {
    fn from(e: redb::CommitError) -> Self {
        SchedulerError::Backend(e.into())
    }
}

impl From<redb::StorageError> for SchedulerError {
    fn from(e: redb::StorageError) -> Self {
        SchedulerError::Backend(e.into())
    }
}
