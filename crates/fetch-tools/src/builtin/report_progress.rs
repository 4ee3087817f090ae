// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Let a running task narrate its own progress to the user. Throttled at
//! the session layer (`PROGRESS_THROTTLE`), not here — the tool always
//! forwards the event and trusts the consumer to rate-limit.
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::mpsc::UnboundedSender;

use crate::events::ToolEvent;
use crate::policy::ApprovalPolicy;
use crate::tool::{Tool, ToolCall, ToolOutput};

pub struct ReportProgressTool {
    events: UnboundedSender<ToolEvent>,
}

impl ReportProgressTool {
    pub fn new(events: UnboundedSender<ToolEvent>) -> Self {
        Self { events }
    }
}

#[async_trait]
impl Tool for ReportProgressTool {
    fn name(&self) -> &str {
        "report_progress"
    }

    fn description(&self) -> &str {
        "Send a short progress update about a running task back to the user."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "task_id": { "type": "string" },
                "message": { "type": "string" }
            },
            "required": ["task_id", "message"]
        })
    }

    fn default_policy(&self) -> ApprovalPolicy {
        ApprovalPolicy::Auto
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        let task_id = match call.args.get("task_id").and_then(Value::as_str) {
            Some(v) => v.to_string(),
            None => return ToolOutput::err(&call.id, "missing required field: task_id"),
        };
        let message = match call.args.get("message").and_then(Value::as_str) {
            Some(v) => v.to_string(),
            None => return ToolOutput::err(&call.id, "missing required field: message"),
        };

        let _ = self
            .events
            .send(ToolEvent::ProgressReported { task_id, message });
        ToolOutput::ok(&call.id, "progress reported")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::sync::mpsc::unbounded_channel;

    #[tokio::test]
    async fn forwards_progress_event() {
        let (tx, mut rx) = unbounded_channel();
        let tool = ReportProgressTool::new(tx);
        let call = ToolCall {
            id: "c".into(),
            name: "report_progress".into(),
            args: json!({"task_id": "tsk_1", "message": "50% done"}),
        };
        let out = tool.execute(&call).await;
        assert!(!out.is_error);
        match rx.try_recv().unwrap() {
            ToolEvent::ProgressReported { task_id, message } => {
                assert_eq!(task_id, "tsk_1");
                assert_eq!(message, "50% done");
            }
            _ => panic!("wrong event"),
        }
    }

    #[tokio::test]
    async fn missing_message_is_an_error() {
        let (tx, _rx) = unbounded_channel();
        let tool = ReportProgressTool::new(tx);
        let call = ToolCall {
            id: "c".into(),
            name: "report_progress".into(),
            args: json!({"task_id": "tsk_1"}),
        };
        let out = tool.execute(&call).await;
        assert!(out.is_error);
    }
}
