// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use fetch_config::AgentMode;
use fetch_tools::ToolCall;

/// Events emitted by the agent loop during a single turn. Non-streaming: a
/// model turn is one request/response, so there is no delta/chunk variant,
/// only the complete text once it arrives.
#[derive(Debug, Clone)]
pub enum AgentEvent {
    /// The model requested a tool call.
    ToolCallStarted(ToolCall),
    /// A tool call finished.
    ToolCallFinished {
        call_id: String,
        tool_name: String,
        output: String,
        is_error: bool,
    },
    /// Context was compacted; before/after token counts for the UI.
    ContextCompacted { tokens_before: usize, tokens_after: usize },
    /// The agent finished processing the current user turn with this reply.
    TurnComplete(String),
    /// A recoverable error occurred; surfaced as one mode-prefixed chat line.
    Error(String),
    /// The mode changed.
    ModeChanged(AgentMode),
    /// `ask_user` requested confirmation; the session now has a pendingApproval.
    ApprovalRequested { approval_id: String, question: String },
    /// `report_progress` was called for a running task.
    Progress { task_id: String, message: String },
}
