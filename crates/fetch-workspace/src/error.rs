// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("invalid workspace name {0:?}: must match [A-Za-z0-9][A-Za-z0-9._-]*")]
    InvalidName(String),
    #[error("workspace not found: {0}")]
    NotFound(String),
    #[error("cannot delete the active workspace: {0}")]
    ActiveWorkspace(String),
    #[error(transparent)]
    Sandbox(#[from] fetch_sandbox::SandboxError),
    #[error("sandbox command failed: {0}")]
    Command(String),
}
