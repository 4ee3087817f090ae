// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use async_trait::async_trait;

use crate::types::{CompletionReply, CompletionRequest};

/// The LM client external collaborator, reduced to the one call the agent
/// loop needs: given a conversation and a tool list, return a text reply or
/// a set of tool calls. No streaming — the orchestrator core treats a model
/// turn as a single request/response.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Human-readable provider name for logging.
    fn name(&self) -> &str;

    async fn complete(&self, req: CompletionRequest) -> anyhow::Result<CompletionReply>;
}
