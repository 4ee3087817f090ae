// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Durable store for scheduled jobs, backed by its own embedded
//! `redb::Database` (kept separate from the session store so the scheduler
//! can run as its own worker, per §5's "parallel workers cooperating
//! through message passing and a shared durable store").
use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use crate::error::SchedulerError;
use crate::types::ScheduledJob;

const JOBS: TableDefinition<&str, &[u8]> = TableDefinition::new("jobs");

#[derive(Clone)]
pub struct JobStore {
    db: Arc<Database>,
}

impl JobStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SchedulerError> {
        let db = Database::create(path)?;
        Self::from_database(db)
    }

    pub fn in_memory() -> Result<Self, SchedulerError> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::from_database(db)
    }

    fn from_database(db: Database) -> Result<Self, SchedulerError> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(JOBS)?;
        write_txn.commit()?;
        Ok(Self { db: Arc::new(db) })
    }

    pub fn put(&self, job: &ScheduledJob) -> Result<(), SchedulerError> {
        let bytes = serde_json::to_vec(job).map_err(|source| SchedulerError::Corrupt { id: job.id.clone(), source })?;
        let write_txn = self.db.begin_write()?;
        {
            let mut t = write_txn.open_table(JOBS)?;
            t.insert(job.id.as_str(), bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<ScheduledJob, SchedulerError> {
        let read_txn = self.db.begin_read()?;
        let t = read_txn.open_table(JOBS)?;
        match t.get(id)? {
            Some(value) => serde_json::from_slice(value.value())
                .map_err(|source| SchedulerError::Corrupt { id: id.to_string(), source }),
            None => Err(SchedulerError::NotFound(id.to_string())),
        }
    }

    pub fn remove(&self, id: &str) -> Result<(), SchedulerError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut t = write_txn.open_table(JOBS)?;
            t.remove(id)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn list(&self, session_id: Option<&str>) -> Result<Vec<ScheduledJob>, SchedulerError> {
        let read_txn = self.db.begin_read()?;
        let t = read_txn.open_table(JOBS)?;
        let mut jobs = Vec::new();
        for entry in t.iter()? {
            let (_, value) = entry?;
            let job: ScheduledJob = serde_json::from_slice(value.value())
                .map_err(|source| SchedulerError::Corrupt { id: "<list>".to_string(), source })?;
            if session_id.map_or(true, |s| s == job.session_id) {
                jobs.push(job);
            }
        }
        Ok(jobs)
    }
}
