// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaskManagerError {
    #[error("task queue is full")]
    QueueFull,
    #[error("task not found: {0}")]
    NotFound(String),
    #[error("task {task_id} is not waiting on input")]
    NotWaiting { task_id: String },
    #[error(transparent)]
    Harness(#[from] fetch_harness::HarnessError),
    #[error(transparent)]
    Store(#[from] fetch_store::StoreError),
}
