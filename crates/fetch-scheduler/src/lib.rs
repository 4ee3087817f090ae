// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Backs the `/remind`, `/schedule`, and `/cron` slash commands: durable
//! one-shot and recurring jobs that re-enter the session as a chat message
//! when they fire.
mod error;
mod scheduler;
mod store;
mod types;

pub use error::SchedulerError;
pub use scheduler::Scheduler;
pub use store::JobStore;
pub use types::{JobSpec, ScheduledJob};
