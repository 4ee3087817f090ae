// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Adapts [`TaskManager`] to the narrow [`fetch_tools::ports::TaskPort`]
//! capability the `task_*` tools call through.
use std::sync::Arc;

use async_trait::async_trait;
use fetch_store::TaskStatus;
use fetch_tools::ports::{TaskPort, TaskSummary};

use crate::manager::TaskManager;

fn status_label(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "pending",
        TaskStatus::Running => "running",
        TaskStatus::WaitingInput => "waiting_input",
        TaskStatus::Completed => "completed",
        TaskStatus::Failed => "failed",
        TaskStatus::Cancelled => "cancelled",
        TaskStatus::TimedOut => "timed_out",
    }
}

/// One chat session's view of the Task Manager: fixes the session id and the
/// workspace-root the sandbox mounts checkouts under, so the `task_*` tools
/// only need to name a `workspace_id`.
pub struct TaskManagerPort {
    manager: Arc<TaskManager>,
    session_id: String,
    workspace_root: String,
}

impl TaskManagerPort {
    pub fn new(manager: Arc<TaskManager>, session_id: impl Into<String>, workspace_root: impl Into<String>) -> Self {
        Self {
            manager,
            session_id: session_id.into(),
            workspace_root: workspace_root.into(),
        }
    }
}

#[async_trait]
impl TaskPort for TaskManagerPort {
    async fn create(
        &self,
        workspace_id: &str,
        harness: &str,
        prompt: &str,
        timeout_ms: u64,
    ) -> anyhow::Result<TaskSummary> {
        let cwd = format!("{}/{workspace_id}", self.workspace_root);
        let task = self
            .manager
            .create_task(&self.session_id, workspace_id, harness, prompt, timeout_ms, &cwd)
            .await?;
        Ok(TaskSummary {
            id: task.id,
            workspace_id: task.workspace_id,
            state: status_label(task.status).to_string(),
            harness: task.agent,
            prompt: task.goal,
        })
    }

    async fn cancel(&self, task_id: &str) -> anyhow::Result<()> {
        self.manager.cancel(task_id).await?;
        Ok(())
    }

    async fn respond(&self, task_id: &str, text: &str) -> anyhow::Result<()> {
        self.manager.respond(task_id, text).await?;
        Ok(())
    }
}
