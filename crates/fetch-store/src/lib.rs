// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Durable persistence for sessions, threads, messages, tasks, and mode
//! state. A thin layer over `redb`: every row is a JSON blob keyed by its
//! opaque id, following the same single-table-per-entity shape the rest of
//! the workspace's storage crates use.
mod error;
mod store;
mod types;

pub use error::StoreError;
pub use store::{now_iso8601, Store};
pub use types::{
    Autonomy, FilesModified, ModeRecord, PendingApproval, Preferences, Session, StoredMessage,
    Task, TaskStatus, Thread, ThreadStatus, MAX_PROGRESS_LOG_ENTRIES,
};
