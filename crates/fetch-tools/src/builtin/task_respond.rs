// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Feed a user's reply into a task waiting on a harness question
//! (`waiting_input` state). Writes to the harness child's stdin.
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::policy::ApprovalPolicy;
use crate::ports::TaskPort;
use crate::tool::{Tool, ToolCall, ToolOutput};

pub struct TaskRespondTool {
    tasks: Arc<dyn TaskPort>,
}

impl TaskRespondTool {
    pub fn new(tasks: Arc<dyn TaskPort>) -> Self {
        Self { tasks }
    }
}

#[async_trait]
impl Tool for TaskRespondTool {
    fn name(&self) -> &str {
        "task_respond"
    }

    fn description(&self) -> &str {
        "Answer a question a waiting task's harness process asked, resuming it."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "task_id": { "type": "string" },
                "text": { "type": "string" }
            },
            "required": ["task_id", "text"]
        })
    }

    fn default_policy(&self) -> ApprovalPolicy {
        ApprovalPolicy::Auto
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        let task_id = match call.args.get("task_id").and_then(Value::as_str) {
            Some(v) => v,
            None => return ToolOutput::err(&call.id, "missing required field: task_id"),
        };
        let text = match call.args.get("text").and_then(Value::as_str) {
            Some(v) => v,
            None => return ToolOutput::err(&call.id, "missing required field: text"),
        };
        match self.tasks.respond(task_id, text).await {
            Ok(()) => ToolOutput::ok(&call.id, format!("sent reply to task {task_id}")),
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
        async fn cancel(&self, _task_id: &str) -> anyhow::Result<()> {
            unreachable!()
        }
        async fn respond(&self, task_id: &str, text: &str) -> anyhow::Result<()> {
            if text.is_empty() {
                anyhow::bail!("empty reply");
            }
            let _ = task_id;
            Ok(())
        }
    }

    #[tokio::test]
    async fn sends_reply() {
        let tool = TaskRespondTool::new(Arc::new(FakeTasks));
        let call = ToolCall {
            id: "c".into(),
            name: "task_respond".into(),
            args: json!({"task_id": "tsk_1", "text": "yes, proceed"}),
        };
        assert!(!tool.execute(&call).await.is_error);
    }

    #[tokio::test]
    async fn missing_text_is_an_error() {
        let tool = TaskRespondTool::new(Arc::new(FakeTasks));
        let call = ToolCall {
            id: "c".into(),
            name: "task_respond".into(),
            args: json!({"task_id": "tsk_1"}),
        };
        assert!(tool.execute(&call).await.is_error);
    }
}
