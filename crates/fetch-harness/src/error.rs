// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("unknown agent {0:?}")]
    UnknownAgent(String),
    #[error("sandbox not ready")]
    SandboxUnavailable,
    #[error("failed to spawn harness child: {0}")]
    SpawnFailed(#[source] anyhow::Error),
    #[error("harness child exited nonzero ({exit_code}): {stderr_tail}")]
    Crash { exit_code: i32, stderr_tail: String },
    #[error("harness produced no output for {0}ms")]
    Timeout(u64),
}

impl From<fetch_sandbox::SandboxError> for HarnessError {
    fn from(e: fetch_sandbox::SandboxError) -> Self {
        match e {
            fetch_sandbox::SandboxError::Unavailable => HarnessError::SandboxUnavailable,
            other => HarnessError::SpawnFailed(other.into()),
        }
    }
}
