// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use serde::{Deserialize, Serialize};

/// One message in the conversation sent to the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Set on assistant messages that invoked tools.
    #[serde(default)]
    pub tool_calls: Vec<ToolCallRequest>,
    /// Set on tool-result messages; must match a `ToolCallRequest::id` from
    /// the preceding assistant message.
    #[serde(default)]
    pub tool_call_id: Option<String>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    /// Crude token estimate (4 chars/token), used for the session window
    /// gate and compaction trigger. Not calibrated against any specific
    /// tokenizer — good enough to decide "are we close to the limit".
    pub fn approx_tokens(&self) -> usize {
        (self.content.len() / 4).max(if self.content.is_empty() { 0 } else { 1 })
    }

    pub fn as_text(&self) -> Option<&str> {
        if self.content.is_empty() {
            None
        } else {
            Some(&self.content)
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A tool the model may call, described as a JSON Schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// A tool invocation the model requested.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// A single completion request. The LM client is treated as an external
/// collaborator: this crate only defines the wire-level request/reply shape
/// and one driver that speaks it, not a multi-provider abstraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
    pub tools: Vec<ToolSchema>,
    pub max_tokens: u32,
}

/// The model's reply: either a text answer, one or more tool calls, or both
/// (some providers emit a short text alongside tool calls).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CompletionReply {
    pub text: String,
    pub tool_calls: Vec<ToolCallRequest>,
}

impl CompletionReply {
    pub fn is_tool_call(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_has_no_tool_calls() {
        let m = Message::user("hi");
        assert_eq!(m.role, Role::User);
        assert!(m.tool_calls.is_empty());
    }

    #[test]
    fn tool_result_carries_call_id() {
        let m = Message::tool_result("call_1", "done");
        assert_eq!(m.tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn reply_with_tool_calls_reports_is_tool_call() {
        let reply = CompletionReply {
            text: String::new(),
            tool_calls: vec![ToolCallRequest {
                id: "1".into(),
                name: "workspace_list".into(),
                arguments: serde_json::json!({}),
            }],
        };
        assert!(reply.is_tool_call());
    }

    #[test]
    fn reply_with_only_text_is_not_tool_call() {
        let reply = CompletionReply {
            text: "hello".into(),
            tool_calls: Vec::new(),
        };
        assert!(!reply.is_tool_call());
    }
}
