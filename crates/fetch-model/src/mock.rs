// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::provider::ModelProvider;
use crate::types::{CompletionReply, CompletionRequest, Role, ToolCallRequest};

/// Deterministic mock provider. Echoes the last user message back as the
/// assistant reply — used when `model.provider = "mock"` and in tests that
/// don't care about the reply content.
#[derive(Default)]
pub struct MockProvider;

#[async_trait]
impl ModelProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, req: CompletionRequest) -> anyhow::Result<CompletionReply> {
        let last_user = req
            .messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or("[no input]");
        Ok(CompletionReply {
            text: format!("MOCK: {last_user}"),
            tool_calls: Vec::new(),
        })
    }
}

/// A pre-scripted mock provider. Each call to `complete` pops the next
/// reply from the front of the queue, letting tests drive an exact sequence
/// of tool calls and text replies without network access.
pub struct ScriptedMockProvider {
    scripts: Arc<Mutex<Vec<CompletionReply>>>,
    /// The last request seen by this provider, for test assertions.
    pub last_request: Arc<Mutex<Option<CompletionRequest>>>,
}

impl ScriptedMockProvider {
    pub fn new(scripts: Vec<CompletionReply>) -> Self {
        Self {
            scripts: Arc::new(Mutex::new(scripts)),
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    pub fn always_text(reply: impl Into<String>) -> Self {
        Self::new(vec![CompletionReply {
            text: reply.into(),
            tool_calls: Vec::new(),
        }])
    }

    pub fn tool_then_text(
        tool_id: impl Into<String>,
        tool_name: impl Into<String>,
        args: serde_json::Value,
        final_text: impl Into<String>,
    ) -> Self {
        Self::new(vec![
            CompletionReply {
                text: String::new(),
                tool_calls: vec![ToolCallRequest {
                    id: tool_id.into(),
                    name: tool_name.into(),
                    arguments: args,
                }],
            },
            CompletionReply {
                text: final_text.into(),
                tool_calls: Vec::new(),
            },
        ])
    }
}

#[async_trait]
impl ModelProvider for ScriptedMockProvider {
    fn name(&self) -> &str {
        "scripted-mock"
    }

    async fn complete(&self, req: CompletionRequest) -> anyhow::Result<CompletionReply> {
        *self.last_request.lock().unwrap() = Some(req);
        let mut scripts = self.scripts.lock().unwrap();
        if scripts.is_empty() {
            Ok(CompletionReply {
                text: "[no more scripts]".into(),
                tool_calls: Vec::new(),
            })
        } else {
            Ok(scripts.remove(0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Message;

    fn req(msg: &str) -> CompletionRequest {
        CompletionRequest {
            messages: vec![Message::user(msg)],
            tools: Vec::new(),
            max_tokens: 100,
        }
    }

    #[tokio::test]
    async fn mock_echoes_last_user_message() {
        let p = MockProvider;
        let reply = p.complete(req("hi")).await.unwrap();
        assert!(reply.text.contains("MOCK: hi"));
    }

    #[tokio::test]
    async fn scripted_single_text_reply() {
        let p = ScriptedMockProvider::always_text("hello world");
        let reply = p.complete(req("hi")).await.unwrap();
        assert_eq!(reply.text, "hello world");
    }

    #[tokio::test]
    async fn scripted_tool_then_text_two_rounds() {
        let p = ScriptedMockProvider::tool_then_text(
            "call-1",
            "workspace_list",
            serde_json::json!({}),
            "done",
        );
        let first = p.complete(req("hi")).await.unwrap();
        assert!(first.is_tool_call());
        let second = p.complete(req("hi")).await.unwrap();
        assert_eq!(second.text, "done");
    }

    #[tokio::test]
    async fn scripted_fallback_when_scripts_exhausted() {
        let p = ScriptedMockProvider::new(vec![]);
        let reply = p.complete(req("hi")).await.unwrap();
        assert!(reply.text.contains("no more scripts"));
    }

    #[tokio::test]
    async fn scripted_records_last_request() {
        let p = ScriptedMockProvider::always_text("ok");
        let _ = p.complete(req("remember this")).await.unwrap();
        let last = p.last_request.lock().unwrap();
        assert_eq!(last.as_ref().unwrap().messages[0].content, "remember this");
    }
}
