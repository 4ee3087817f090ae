// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Ask the user a yes/no (or free-text) question and suspend.
//!
//! Unlike the blocking `AskQuestionTool` this is grounded on, the call does
//! not wait for an answer on an in-process channel — a restart between the
//! question and the reply must not lose the pending state. The tool records
//! the question on the session (via `ToolEvent::ApprovalRequested`) and
//! returns immediately; the Router treats the next inbound message from the
//! user as the answer.
use async_trait::async_trait;
use nanoid::nanoid;
use serde_json::{json, Value};
use tokio::sync::mpsc::UnboundedSender;

use crate::events::ToolEvent;
use crate::policy::ApprovalPolicy;
use crate::tool::{Tool, ToolCall, ToolOutput};

pub struct AskUserTool {
    events: UnboundedSender<ToolEvent>,
}

impl AskUserTool {
    pub fn new(events: UnboundedSender<ToolEvent>) -> Self {
        Self { events }
    }
}

#[async_trait]
impl Tool for AskUserTool {
    fn name(&self) -> &str {
        "ask_user"
    }

    fn description(&self) -> &str {
        "Ask the user a question and wait for their reply on the next message. \
         Use for approvals or clarifications that block further progress."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "question": { "type": "string", "description": "The question to show the user" }
            },
            "required": ["question"]
        })
    }

    fn default_policy(&self) -> ApprovalPolicy {
        ApprovalPolicy::Auto
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        let question = match call.args.get("question").and_then(Value::as_str) {
            Some(q) if !q.trim().is_empty() => q.to_string(),
            _ => return ToolOutput::err(&call.id, "missing required field: question"),
        };

        let approval_id = format!("apr_{}", nanoid!(10));
        let _ = self.events.send(ToolEvent::ApprovalRequested {
            approval_id: approval_id.clone(),
            question: question.clone(),
        });

        ToolOutput::ok(
            &call.id,
            format!("waiting for the user's reply to: {question}"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::sync::mpsc::unbounded_channel;

    fn call(args: Value) -> ToolCall {
        ToolCall {
            id: "c1".into(),
            name: "ask_user".into(),
            args,
        }
    }

    #[tokio::test]
    async fn emits_approval_requested_event() {
        let (tx, mut rx) = unbounded_channel();
        let tool = AskUserTool::new(tx);
        let out = tool.execute(&call(json!({"question": "deploy now?"}))).await;
        assert!(!out.is_error);
        let ev = rx.try_recv().unwrap();
        match ev {
            ToolEvent::ApprovalRequested { question, .. } => assert_eq!(question, "deploy now?"),
            _ => panic!("wrong event"),
        }
    }

    #[tokio::test]
    async fn missing_question_is_an_error() {
        let (tx, _rx) = unbounded_channel();
        let tool = AskUserTool::new(tx);
        let out = tool.execute(&call(json!({}))).await;
        assert!(out.is_error);
    }

    #[tokio::test]
    async fn blank_question_is_rejected() {
        let (tx, _rx) = unbounded_channel();
        let tool = AskUserTool::new(tx);
        let out = tool.execute(&call(json!({"question": "   "}))).await;
        assert!(out.is_error);
    }
}
