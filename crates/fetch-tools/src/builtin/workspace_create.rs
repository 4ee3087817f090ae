// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::policy::ApprovalPolicy;
use crate::ports::WorkspacePort;
use crate::tool::{Tool, ToolCall, ToolOutput};

pub struct WorkspaceCreateTool {
    workspaces: Arc<dyn WorkspacePort>,
}

impl WorkspaceCreateTool {
    pub fn new(workspaces: Arc<dyn WorkspacePort>) -> Self {
        Self { workspaces }
    }
}

#[async_trait]
impl Tool for WorkspaceCreateTool {
    fn name(&self) -> &str {
        "workspace_create"
    }

    fn description(&self) -> &str {
        "Create a new workspace, optionally cloning a repository into it inside the sandbox."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": { "type": "string" },
                "repo_url": { "type": "string" }
            },
            "required": ["name"]
        })
    }

    fn default_policy(&self) -> ApprovalPolicy {
        ApprovalPolicy::Auto
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        let name = match call.args.get("name").and_then(Value::as_str) {
            Some(v) => v,
            None => return ToolOutput::err(&call.id, "missing required field: name"),
        };
        let repo_url = call.args.get("repo_url").and_then(Value::as_str);

        match self.workspaces.create(name, repo_url).await {
            Ok(ws) => ToolOutput::ok(&call.id, format!("created workspace {}", ws.id)),
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
        async fn status(&self, _id: &str) -> anyhow::Result<WorkspaceSummary> {
            unreachable!()
        }
        async fn create(&self, name: &str, repo_url: Option<&str>) -> anyhow::Result<WorkspaceSummary> {
            Ok(WorkspaceSummary {
                id: "ws_new".into(),
                name: name.into(),
                project_type: "unknown".into(),
                git_branch: repo_url.map(|_| "main".into()),
                git_dirty: false,
            })
        }
        async fn delete(&self, _id: &str) -> anyhow::Result<()> {
            unreachable!()
        }
    }

    #[tokio::test]
    async fn creates_workspace() {
        let tool = WorkspaceCreateTool::new(Arc::new(FakeWorkspaces));
        let call = ToolCall {
            id: "c".into(),
            name: "workspace_create".into(),
            args: json!({"name": "demo"}),
        };
        let out = tool.execute(&call).await;
        assert!(!out.is_error);
        assert!(out.content.contains("ws_new"));
    }

    #[tokio::test]
    async fn missing_name_is_an_error() {
        let tool = WorkspaceCreateTool::new(Arc::new(FakeWorkspaces));
        let call = ToolCall {
            id: "c".into(),
            name: "workspace_create".into(),
            args: json!({}),
        };
        assert!(tool.execute(&call).await.is_error);
    }
}
