// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use fetch_config::AgentMode;

/// Events emitted by tools to communicate state changes back to the agent
/// loop, which translates them into session/mode mutations and outbound
/// chat messages.
#[derive(Debug, Clone)]
pub enum ToolEvent {
    /// The mode state machine should transition (emitted by task
    /// lifecycle tools and `ask_user`).
    ModeChanged(AgentMode),
    /// `report_progress` was called; forward as a throttled chat update.
    ProgressReported { task_id: String, message: String },
    /// `ask_user` requested confirmation. The session records this as
    /// `pendingApproval`; the Router interprets the NEXT inbound message
    /// as the answer rather than blocking the tool call itself.
    ApprovalRequested {
        approval_id: String,
        question: String,
    },
}
