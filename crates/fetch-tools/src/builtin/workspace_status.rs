// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::policy::ApprovalPolicy;
use crate::ports::WorkspacePort;
use crate::tool::{Tool, ToolCall, ToolOutput};

pub struct WorkspaceStatusTool {
    workspaces: Arc<dyn WorkspacePort>,
}

impl WorkspaceStatusTool {
    pub fn new(workspaces: Arc<dyn WorkspacePort>) -> Self {
        Self { workspaces }
    }
}

#[async_trait]
impl Tool for WorkspaceStatusTool {
    fn name(&self) -> &str {
        "workspace_status"
    }

    fn description(&self) -> &str {
        "Report the current git branch and dirty state of a workspace."
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
        match self.workspaces.status(workspace_id).await {
            Ok(ws) => match serde_json::to_string(&ws) {
                Ok(s) => ToolOutput::ok(&call.id, s),
                Err(e) => ToolOutput::err(&call.id, e.to_string()),
            },
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
        async fn select(&self, _id: &str) -> anyhow::Result<WorkspaceSummary> {
            unreachable!()
        }
        async fn status(&self, id: &str) -> anyhow::Result<WorkspaceSummary> {
            Ok(WorkspaceSummary {
                id: id.into(),
                name: "demo".into(),
                project_type: "rust".into(),
                git_branch: Some("main".into()),
                git_dirty: true,
            })
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
    async fn reports_status_as_json() {
        let tool = WorkspaceStatusTool::new(Arc::new(FakeWorkspaces));
        let call = ToolCall {
            id: "c".into(),
            name: "workspace_status".into(),
            args: json!({"workspace_id": "ws_1"}),
        };
        let out = tool.execute(&call).await;
        assert!(!out.is_error);
        assert!(out.content.contains("git_dirty"));
    }
}
