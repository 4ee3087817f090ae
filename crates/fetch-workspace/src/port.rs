// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Adapts [`WorkspaceManager`] to the narrow `fetch_tools::ports::WorkspacePort`
//! capability the `workspace_*` tools call through.
use async_trait::async_trait;
use fetch_tools::ports::{WorkspacePort, WorkspaceSummary};

use crate::manager::{project_type_label, WorkspaceManager};
use crate::types::Workspace;

fn summarize(workspace: &Workspace) -> WorkspaceSummary {
    WorkspaceSummary {
        id: workspace.id.clone(),
        name: workspace.id.clone(),
        project_type: project_type_label(workspace.project_type).to_string(),
        git_branch: workspace.git_status.as_ref().and_then(|g| g.branch.clone()),
        git_dirty: workspace.git_status.as_ref().map(|g| g.is_dirty()).unwrap_or(false),
    }
}

#[async_trait]
impl WorkspacePort for WorkspaceManager {
    async fn list(&self) -> anyhow::Result<Vec<WorkspaceSummary>> {
        Ok(self.list(false).await?.iter().map(summarize).collect())
    }

    async fn select(&self, id: &str) -> anyhow::Result<WorkspaceSummary> {
        Ok(summarize(&self.select(id).await?))
    }

    async fn status(&self, id: &str) -> anyhow::Result<WorkspaceSummary> {
        Ok(summarize(&self.get_status(Some(id)).await?))
    }

    async fn create(&self, name: &str, repo_url: Option<&str>) -> anyhow::Result<WorkspaceSummary> {
        Ok(summarize(&self.create(name, repo_url).await?))
    }

    async fn delete(&self, id: &str) -> anyhow::Result<()> {
        self.delete(id).await?;
        Ok(())
    }
}
