// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::sync::Arc;

use async_trait::async_trait;
use fetch_config::clamp_timeout_ms;
use serde_json::{json, Value};

use crate::policy::ApprovalPolicy;
use crate::ports::TaskPort;
use crate::tool::{Tool, ToolCall, ToolOutput};

pub struct TaskCreateTool {
    tasks: Arc<dyn TaskPort>,
    default_harness: String,
}

impl TaskCreateTool {
    pub fn new(tasks: Arc<dyn TaskPort>, default_harness: impl Into<String>) -> Self {
        Self {
            tasks,
            default_harness: default_harness.into(),
        }
    }
}

#[async_trait]
impl Tool for TaskCreateTool {
    fn name(&self) -> &str {
        "task_create"
    }

    fn description(&self) -> &str {
        "Spawn a coding task in the selected workspace, delegated to a sandboxed harness process."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "workspace_id": { "type": "string" },
                "prompt": { "type": "string" },
                "harness": { "type": "string", "description": "Which coding-assistant CLI to use; defaults to the configured default" },
                "timeout_ms": { "type": "integer", "minimum": 1000, "maximum": 1800000 }
            },
            "required": ["workspace_id", "prompt"]
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
        let prompt = match call.args.get("prompt").and_then(Value::as_str) {
            Some(v) => v,
            None => return ToolOutput::err(&call.id, "missing required field: prompt"),
        };
        let harness = call
            .args
            .get("harness")
            .and_then(Value::as_str)
            .unwrap_or(&self.default_harness);
        let timeout_ms = clamp_timeout_ms(
            call.args
                .get("timeout_ms")
                .and_then(Value::as_u64)
                .unwrap_or(300_000),
        );

        match self
            .tasks
            .create(workspace_id, harness, prompt, timeout_ms)
            .await
        {
            Ok(task) => ToolOutput::ok(
                &call.id,
                format!("created task {} ({}) on {}", task.id, task.state, harness),
            ),
            Err(e) => ToolOutput::err(&call.id, e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::TaskSummary;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeTasks {
        fail: bool,
        seen_timeout: Mutex<Option<u64>>,
    }

    #[async_trait]
    impl TaskPort for FakeTasks {
        async fn create(
            &self,
            workspace_id: &str,
            harness: &str,
            prompt: &str,
            timeout_ms: u64,
        ) -> anyhow::Result<TaskSummary> {
            *self.seen_timeout.lock().unwrap() = Some(timeout_ms);
            if self.fail {
                anyhow::bail!("boom");
            }
            Ok(TaskSummary {
                id: "tsk_1".into(),
                workspace_id: workspace_id.into(),
                state: "pending".into(),
                harness: harness.into(),
                prompt: prompt.into(),
            })
        }
        async fn cancel(&self, _task_id: &str) -> anyhow::Result<()> {
            Ok(())
        }
        async fn respond(&self, _task_id: &str, _text: &str) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn creates_task_with_clamped_timeout() {
        let tasks = Arc::new(FakeTasks {
            fail: false,
            seen_timeout: Mutex::new(None),
        });
        let tool = TaskCreateTool::new(tasks.clone(), "harness-a");
        let call = ToolCall {
            id: "c".into(),
            name: "task_create".into(),
            args: json!({"workspace_id": "ws_1", "prompt": "fix the bug", "timeout_ms": 10}),
        };
        let out = tool.execute(&call).await;
        assert!(!out.is_error);
        assert_eq!(*tasks.seen_timeout.lock().unwrap(), Some(1_000));
    }

    #[tokio::test]
    async fn missing_prompt_is_an_error() {
        let tasks = Arc::new(FakeTasks {
            fail: false,
            seen_timeout: Mutex::new(None),
        });
        let tool = TaskCreateTool::new(tasks, "harness-a");
        let call = ToolCall {
            id: "c".into(),
            name: "task_create".into(),
            args: json!({"workspace_id": "ws_1"}),
        };
        assert!(tool.execute(&call).await.is_error);
    }

    #[tokio::test]
    async fn propagates_port_failure() {
        let tasks = Arc::new(FakeTasks {
            fail: true,
            seen_timeout: Mutex::new(None),
        });
        let tool = TaskCreateTool::new(tasks, "harness-a");
        let call = ToolCall {
            id: "c".into(),
            name: "task_create".into(),
            args: json!({"workspace_id": "ws_1", "prompt": "x"}),
        };
        assert!(tool.execute(&call).await.is_error);
    }
}
