// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Seam traits for capabilities that live in crates this crate does not
//! depend on (fetch-tasks, fetch-workspace, fetch-harness, fetch-sandbox,
//! fetch-scheduler), mirroring the `WorkspacePort`/`TaskPort` pattern in
//! `fetch_tools::ports`. The binary wires concrete implementations that
//! wrap the real managers.
use async_trait::async_trait;

/// Lets the `stop` reflex cancel the session's single active task without
/// this crate depending on `fetch-tasks`.
#[async_trait]
pub trait TaskControlPort: Send + Sync {
    /// Cancels the current task for `session_id`, if any. Returns `true` if
    /// a task was actually running and got cancelled.
    async fn cancel_current(&self, session_id: &str) -> anyhow::Result<bool>;

    /// One-line human-readable status of the current task, if any.
    async fn status_line(&self, session_id: &str) -> anyhow::Result<Option<String>>;
}

/// Lets the `undo` reflex request a git reset without depending on
/// fetch-workspace/fetch-sandbox directly.
#[async_trait]
pub trait GitUndoPort: Send + Sync {
    /// Resets `workspace_id` back to `git_start_commit`. Returns a
    /// human-readable description of what was undone.
    async fn undo(&self, workspace_id: &str, git_start_commit: &str) -> anyhow::Result<String>;
}

/// Lets the `threads`/`workspace` paths of the system reflex/commands list
/// known workspaces without depending on fetch-workspace.
#[async_trait]
pub trait WorkspaceListPort: Send + Sync {
    async fn list_names(&self) -> anyhow::Result<Vec<String>>;
}

/// Lets the `scheduling` reflex and the `/remind`, `/schedule`, `/cron`
/// commands reach the scheduler without depending on fetch-scheduler.
#[async_trait]
pub trait SchedulePort: Send + Sync {
    async fn list_summaries(&self, session_id: &str) -> anyhow::Result<Vec<String>>;

    /// Creates a job from a command's raw remainder text. `kind` is one of
    /// `"remind"`, `"schedule"`, `"cron"`. Returns a confirmation string.
    async fn create(&self, session_id: &str, kind: &str, spec: &str) -> anyhow::Result<String>;
}

/// Bundle of the seam ports the router needs, wired once at startup.
#[derive(Clone)]
pub struct RouterPorts {
    pub tasks: std::sync::Arc<dyn TaskControlPort>,
    pub git: std::sync::Arc<dyn GitUndoPort>,
    pub workspaces: std::sync::Arc<dyn WorkspaceListPort>,
    pub schedule: std::sync::Arc<dyn SchedulePort>,
}
