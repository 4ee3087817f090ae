// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::policy::ApprovalPolicy;
use crate::ports::TaskPort;
use crate::tool::{Tool, ToolCall, ToolOutput};

pub struct TaskCancelTool {
    tasks: Arc<dyn TaskPort>,
}

impl TaskCancelTool {
    pub fn new(tasks: Arc<dyn TaskPort>) -> Self {
        Self { tasks }
    }
}

#[async_trait]
impl Tool for TaskCancelTool {
    fn name(&self) -> &str {
        "task_cancel"
    }

    fn description(&self) -> &str {
        "Cancel a running or queued task and kill its harness process."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "task_id": { "type": "string" } },
            "required": ["task_id"]
        })
    }

    fn default_policy(&self) -> ApprovalPolicy {
        ApprovalPolicy::Ask
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        let task_id = match call.args.get("task_id").and_then(Value::as_str) {
            Some(v) => v,
            None => return ToolOutput::err(&call.id, "missing required field: task_id"),
        };
        match self.tasks.cancel(task_id).await {
            Ok(()) => ToolOutput::ok(&call.id, format!("cancelled task {task_id}")),
            Err(e) => ToolOutput::err(&call.id, e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::TaskSummary;
    use async_trait::async_trait;

    struct FakeTasks;

    #[async_trait]
    impl TaskPort for FakeTasks {
        async fn create(
            &self,
            _w: &str,
            _h: &str,
            _p: &str,
            _t: u64,
        ) -> anyhow::Result<TaskSummary> {
            unreachable!()
        }
        async fn cancel(&self, task_id: &str) -> anyhow::Result<()> {
            if task_id == "missing" {
                anyhow::bail!("no such task");
            }
            Ok(())
        }
        async fn respond(&self, _task_id: &str, _text: &str) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn cancels_known_task() {
        let tool = TaskCancelTool::new(Arc::new(FakeTasks));
        let call = ToolCall {
            id: "c".into(),
            name: "task_cancel".into(),
            args: json!({"task_id": "tsk_1"}),
        };
        assert!(!tool.execute(&call).await.is_error);
    }

    #[tokio::test]
    async fn missing_task_id_field_is_an_error() {
        let tool = TaskCancelTool::new(Arc::new(FakeTasks));
        let call = ToolCall {
            id: "c".into(),
            name: "task_cancel".into(),
            args: json!({}),
        };
        assert!(tool.execute(&call).await.is_error);
    }

    #[tokio::test]
    async fn unknown_task_propagates_error() {
        let tool = TaskCancelTool::new(Arc::new(FakeTasks));
        let call = ToolCall {
            id: "c".into(),
            name: "task_cancel".into(),
            args: json!({"task_id": "missing"}),
        };
        assert!(tool.execute(&call).await.is_error);
    }
}
