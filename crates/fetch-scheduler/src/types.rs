// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use serde::{Deserialize, Serialize};

/// `/remind` and `/schedule` both fire once at a fixed time; `/cron` repeats
/// on a cron expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JobSpec {
    Once { fire_at: String },
    Cron { expr: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledJob {
    pub id: String,
    pub session_id: String,
    pub message: String,
    pub spec: JobSpec,
    pub next_fire_at: String,
    pub created_at: String,
    pub last_fired_at: Option<String>,
}
