// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! A single generic driver for OpenAI-compatible `/v1/chat/completions`
//! endpoints (OpenAI itself, Groq, OpenRouter, Ollama, vLLM, LM Studio, ...).
//! Trimmed from a much larger multi-provider driver set: one wire format,
//! non-streaming, Bearer auth only — local proxies needing a different auth
//! style can still be reached by pointing `base_url` at their own Bearer-
//! compatible front door.

use anyhow::Context;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::ModelError;
use crate::provider::ModelProvider;
use crate::types::{CompletionReply, CompletionRequest, Role, ToolCallRequest};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAICompatProvider {
    model: String,
    api_key: Option<String>,
    chat_url: String,
    client: reqwest::Client,
}

impl OpenAICompatProvider {
    pub fn new(model: impl Into<String>, api_key: Option<String>, base_url: Option<&str>) -> Self {
        let base = base_url.unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/');
        Self {
            model: model.into(),
            api_key,
            chat_url: format!("{base}/chat/completions"),
            client: reqwest::Client::new(),
        }
    }

    fn request_body(&self, req: &CompletionRequest) -> Value {
        let messages: Vec<Value> = req
            .messages
            .iter()
            .map(|m| {
                let role = match m.role {
                    Role::System => "system",
                    Role::User => "user",
                    Role::Assistant => "assistant",
                    Role::Tool => "tool",
                };
                let mut obj = json!({ "role": role, "content": m.content });
                if let Some(tool_call_id) = &m.tool_call_id {
                    obj["tool_call_id"] = json!(tool_call_id);
                }
                if !m.tool_calls.is_empty() {
                    obj["tool_calls"] = json!(m
                        .tool_calls
                        .iter()
                        .map(|tc| json!({
                            "id": tc.id,
                            "type": "function",
                            "function": { "name": tc.name, "arguments": tc.arguments.to_string() },
                        }))
                        .collect::<Vec<_>>());
                }
                obj
            })
            .collect();

        let tools: Vec<Value> = req
            .tools
            .iter()
            .map(|t| {
                json!({
                    "type": "function",
                    "function": {
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.parameters,
                    }
                })
            })
            .collect();

        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": req.max_tokens,
        });
        if !tools.is_empty() {
            body["tools"] = json!(tools);
        }
        body
    }

    fn parse_reply(&self, body: &Value) -> anyhow::Result<CompletionReply> {
        let choice = body
            .get("choices")
            .and_then(|c| c.get(0))
            .context("response missing choices[0]")?;
        let message = choice.get("message").context("choice missing message")?;

        let text = message
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();

        let tool_calls = message
            .get("tool_calls")
            .and_then(Value::as_array)
            .map(|calls| {
                calls
                    .iter()
                    .filter_map(|c| {
                        let id = c.get("id")?.as_str()?.to_string();
                        let function = c.get("function")?;
                        let name = function.get("name")?.as_str()?.to_string();
                        let raw_args = function.get("arguments")?.as_str().unwrap_or("{}");
                        let arguments =
                            serde_json::from_str(raw_args).unwrap_or(Value::Object(Default::default()));
                        Some(ToolCallRequest { id, name, arguments })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(CompletionReply { text, tool_calls })
    }
}

#[async_trait::async_trait]
impl ModelProvider for OpenAICompatProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, req: CompletionRequest) -> anyhow::Result<CompletionReply> {
        let body = self.request_body(&req);
        debug!(url = %self.chat_url, model = %self.model, "sending completion request");

        let mut builder = self.client.post(&self.chat_url).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(ModelError::Transport)?;
        let status = response.status();
        let payload: Value = response
            .json()
            .await
            .context("parsing completion response as JSON")?;

        if !status.is_success() {
            return Err(ModelError::Http {
                status: status.as_u16(),
                body: payload.to_string(),
            }
            .into());
        }

        self.parse_reply(&payload)
    }
}
