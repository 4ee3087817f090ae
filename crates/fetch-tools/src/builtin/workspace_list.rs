// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::policy::ApprovalPolicy;
use crate::ports::WorkspacePort;
use crate::tool::{Tool, ToolCall, ToolOutput};

pub struct WorkspaceListTool {
    workspaces: Arc<dyn WorkspacePort>,
}

impl WorkspaceListTool {
    pub fn new(workspaces: Arc<dyn WorkspacePort>) -> Self {
        Self { workspaces }
    }
}

#[async_trait]
impl Tool for WorkspaceListTool {
    fn name(&self) -> &str {
        "workspace_list"
    }

    fn description(&self) -> &str {
        "List known workspaces and their project type and git status."
    }

    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    fn default_policy(&self) -> ApprovalPolicy {
        ApprovalPolicy::Auto
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        match self.workspaces.list().await {
            Ok(list) => match serde_json::to_string(&list) {
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
            Ok(vec![WorkspaceSummary {
                id: "ws_1".into(),
                name: "demo".into(),
                project_type: "rust".into(),
                git_branch: Some("main".into()),
                git_dirty: false,
            }])
        }
        async fn select(&self, _id: &str) -> anyhow::Result<WorkspaceSummary> {
            unreachable!()
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
    async fn lists_workspaces_as_json() {
        let tool = WorkspaceListTool::new(Arc::new(FakeWorkspaces));
        let call = ToolCall {
            id: "c".into(),
            name: "workspace_list".into(),
            args: json!({}),
        };
        let out = tool.execute(&call).await;
        assert!(!out.is_error);
        assert!(out.content.contains("ws_1"));
    }
}
