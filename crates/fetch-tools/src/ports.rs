// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Dependency-inversion seam.
//!
//! `fetch-tools` defines the `Tool` trait and the concrete tools, but the
//! tools need to call into workspace management and task lifecycle code
//! that lives in `fetch-workspace`/`fetch-tasks` — both of which depend on
//! `fetch-tools` for the `Tool`/`ToolCall`/`ToolOutput` types. Defining the
//! capability each tool needs as a narrow trait here, and having the
//! higher-level crates implement it, avoids a dependency cycle.
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceSummary {
    pub id: String,
    pub name: String,
    pub project_type: String,
    pub git_branch: Option<String>,
    pub git_dirty: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSummary {
    pub id: String,
    pub workspace_id: String,
    pub state: String,
    pub harness: String,
    pub prompt: String,
}

/// Capability the `workspace_*` tools need from the Workspace Manager.
#[async_trait]
pub trait WorkspacePort: Send + Sync {
    async fn list(&self) -> anyhow::Result<Vec<WorkspaceSummary>>;
    async fn select(&self, id: &str) -> anyhow::Result<WorkspaceSummary>;
    async fn status(&self, id: &str) -> anyhow::Result<WorkspaceSummary>;
    async fn create(&self, name: &str, repo_url: Option<&str>) -> anyhow::Result<WorkspaceSummary>;
    async fn delete(&self, id: &str) -> anyhow::Result<()>;
}

/// Capability the `task_*` tools need from the Task Manager.
#[async_trait]
pub trait TaskPort: Send + Sync {
    async fn create(
        &self,
        workspace_id: &str,
        harness: &str,
        prompt: &str,
        timeout_ms: u64,
    ) -> anyhow::Result<TaskSummary>;
    async fn cancel(&self, task_id: &str) -> anyhow::Result<()>;
    async fn respond(&self, task_id: &str, text: &str) -> anyhow::Result<()>;
}
