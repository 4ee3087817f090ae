// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::policy::ApprovalPolicy;
use crate::ports::WorkspacePort;
use crate::tool::{Tool, ToolCall, ToolOutput};

pub struct WorkspaceSelectTool {
    workspaces: Arc<dyn WorkspacePort>,
}

impl WorkspaceSelectTool {
    pub fn new(workspaces: Arc<dyn WorkspacePort>) -> Self {
        Self { workspaces }
    }
}

#[async_trait]
impl Tool for WorkspaceSelectTool {
    fn name(&self) -> &str {
        "workspace_select"
    }

    fn description(&self) -> &str {
        "Select the active workspace for subsequent task_create calls in this session."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "workspace_id": { "type": "string" } },
            "required": ["workspace_id"]
        })
    }

    fn default_policy(&self) -> ApprovalPolicy {
        ApprovalPolicy::Auto
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        let workspace_id = match call.args.get("workspace_id").and_then(Value::as_str) {
            Some(v) => v,
            None => return ToolOutput::err(&call.id, "missing required field: workspace_id"),
        };
        match self.workspaces.select(workspace_id).await {
            Ok(ws) => ToolOutput::ok(&call.id, format!("selected workspace {}", ws.id)),
            Err(e) => ToolOutput::err(&call.id, e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::WorkspaceSummary;
    use async_trait::async_trait;

    struct FakeWorkspaces;

    #[async_trait]
    impl WorkspacePort for FakeWorkspaces {
        async fn list(&self) -> anyhow::Result<Vec<WorkspaceSummary>> {
            unreachable!()
        }
        async fn select(&self, id: &str) -> anyhow::Result<WorkspaceSummary> {
            if id == "missing" {
                anyhow::bail!("no such workspace");
            }
            Ok(WorkspaceSummary {
                id: id.into(),
                name: "demo".into(),
                project_type: "rust".into(),
                git_branch: None,
                git_dirty: false,
            })
        }
        async fn status(&self, _id: &str) -> anyhow::Result<WorkspaceSummary> {
            unreachable!()
        }
        async fn create(
            &self,
            _name: &str,
            _repo_url: Option<&str>,
        ) -> anyhow::Result<WorkspaceSummary> {
            unreachable!()
        }
        async fn delete(&self, _id: &str) -> anyhow::Result<()> {
            unreachable!()
        }
    }

    #[tokio::test]
    async fn selects_known_workspace() {
        let tool = WorkspaceSelectTool::new(Arc::new(FakeWorkspaces));
        let call = ToolCall {
            id: "c".into(),
            name: "workspace_select".into(),
            args: json!({"workspace_id": "ws_1"}),
        };
        assert!(!tool.execute(&call).await.is_error);
    }

    #[tokio::test]
    async fn unknown_workspace_is_an_error() {
        let tool = WorkspaceSelectTool::new(Arc::new(FakeWorkspaces));
        let call = ToolCall {
            id: "c".into(),
            name: "workspace_select".into(),
            args: json!({"workspace_id": "missing"}),
        };
        assert!(tool.execute(&call).await.is_error);
    }
}
