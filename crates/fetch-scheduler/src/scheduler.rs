// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Backs `/remind`, `/schedule`, and `/cron`: one-shot and recurring jobs
//! that fire a chat message back into a session. Firing itself (handing the
//! due message to the Message Router) is the caller's job — `poll_due`
//! only tells you which jobs are ready and advances/removes them.
use std::str::FromStr;

use chrono::{DateTime, Utc};
use cron::Schedule;

use crate::error::SchedulerError;
use crate::store::JobStore;
use crate::types::{JobSpec, ScheduledJob};

pub struct Scheduler {
    store: JobStore,
}

fn parse_cron(expr: &str) -> Result<Schedule, SchedulerError> {
    Schedule::from_str(expr).map_err(|e| SchedulerError::InvalidCron(expr.to_string(), e.to_string()))
}

fn parse_fire_at(text: &str) -> Result<DateTime<Utc>, SchedulerError> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| SchedulerError::InvalidTime(text.to_string(), e.to_string()))
}

impl Scheduler {
    pub fn new(store: JobStore) -> Self {
        Self { store }
    }

    /// Create a one-shot job (`/remind`, `/schedule`) firing at `fire_at`
    /// (RFC 3339).
    pub fn create_once(
        &self,
        session_id: &str,
        message: &str,
        fire_at: &str,
        now: DateTime<Utc>,
    ) -> Result<ScheduledJob, SchedulerError> {
        let at = parse_fire_at(fire_at)?;
        let job = ScheduledJob {
            id: format!("job_{}", nanoid::nanoid!(10)),
            session_id: session_id.to_string(),
            message: message.to_string(),
            spec: JobSpec::Once { fire_at: at.to_rfc3339() },
            next_fire_at: at.to_rfc3339(),
            created_at: now.to_rfc3339(),
            last_fired_at: None,
        };
        self.store.put(&job)?;
        Ok(job)
    }

    /// Create a recurring job (`/cron`) on a standard 5 or 6-field cron
    /// expression.
    pub fn create_cron(
        &self,
        session_id: &str,
        message: &str,
        expr: &str,
        now: DateTime<Utc>,
    ) -> Result<ScheduledJob, SchedulerError> {
        let schedule = parse_cron(expr)?;
        let next = schedule
            .after(&now)
            .next()
            .ok_or_else(|| SchedulerError::InvalidCron(expr.to_string(), "no upcoming fire time".to_string()))?;
        let job = ScheduledJob {
            id: format!("job_{}", nanoid::nanoid!(10)),
            session_id: session_id.to_string(),
            message: message.to_string(),
            spec: JobSpec::Cron { expr: expr.to_string() },
            next_fire_at: next.to_rfc3339(),
            created_at: now.to_rfc3339(),
            last_fired_at: None,
        };
        self.store.put(&job)?;
        Ok(job)
    }

    pub fn cancel(&self, id: &str) -> Result<(), SchedulerError> {
        self.store.remove(id)
    }

    pub fn list(&self, session_id: Option<&str>) -> Result<Vec<ScheduledJob>, SchedulerError> {
        self.store.list(session_id)
    }

    /// Jobs whose `next_fire_at` has passed as of `now`. One-shot jobs are
    /// removed from the store; cron jobs are rescheduled to their next
    /// occurrence. Returns the jobs in the state they were in when they fired.
    pub fn poll_due(&self, now: DateTime<Utc>) -> Result<Vec<ScheduledJob>, SchedulerError> {
        let mut due = Vec::new();
        for mut job in self.store.list(None)? {
            let next_fire = parse_fire_at(&job.next_fire_at)?;
            if next_fire > now {
                continue;
            }
            let fired = ScheduledJob { last_fired_at: Some(now.to_rfc3339()), ..job.clone() };
            match &job.spec {
                JobSpec::Once { .. } => {
                    self.store.remove(&job.id)?;
                }
                JobSpec::Cron { expr } => {
                    let schedule = parse_cron(expr)?;
                    if let Some(next) = schedule.after(&now).next() {
                        job.next_fire_at = next.to_rfc3339();
                        job.last_fired_at = Some(now.to_rfc3339());
                        self.store.put(&job)?;
                    } else {
                        self.store.remove(&job.id)?;
                    }
                }
            }
            due.push(fired);
        }
        Ok(due)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        "2026-07-28T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn create_once_rejects_unparseable_time() {
        let scheduler = Scheduler::new(JobStore::in_memory().unwrap());
        assert!(scheduler.create_once("ses_1", "ping", "not-a-time", now()).is_err());
    }

    #[test]
    fn create_cron_rejects_invalid_expression() {
        let scheduler = Scheduler::new(JobStore::in_memory().unwrap());
        assert!(scheduler.create_cron("ses_1", "ping", "not a cron expr", now()).is_err());
    }

    #[test]
    fn once_job_fires_exactly_once_and_is_removed() {
        let scheduler = Scheduler::new(JobStore::in_memory().unwrap());
        let fire_at = (now() + Duration::minutes(5)).to_rfc3339();
        scheduler.create_once("ses_1", "standup", &fire_at, now()).unwrap();

        assert!(scheduler.poll_due(now()).unwrap().is_empty());

        let due = scheduler.poll_due(now() + Duration::minutes(6)).unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].message, "standup");
        assert!(scheduler.list(None).unwrap().is_empty());
    }

    #[test]
    fn cron_job_reschedules_after_firing() {
        let scheduler = Scheduler::new(JobStore::in_memory().unwrap());
        // every minute
        scheduler.create_cron("ses_1", "tick", "0 * * * * *", now()).unwrap();

        let due = scheduler.poll_due(now() + Duration::minutes(2)).unwrap();
        assert_eq!(due.len(), 1);
        let remaining = scheduler.list(None).unwrap();
        assert_eq!(remaining.len(), 1);
        let next = parse_fire_at(&remaining[0].next_fire_at).unwrap();
        assert!(next > now() + Duration::minutes(2));
    }

    #[test]
    fn cancel_removes_job() {
        let scheduler = Scheduler::new(JobStore::in_memory().unwrap());
        let fire_at = (now() + Duration::minutes(1)).to_rfc3339();
        let job = scheduler.create_once("ses_1", "x", &fire_at, now()).unwrap();
        scheduler.cancel(&job.id).unwrap();
        assert!(scheduler.list(None).unwrap().is_empty());
    }
}
