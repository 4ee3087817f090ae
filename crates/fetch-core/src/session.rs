// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! In-memory session state for one thread of conversation: the rolling
//! message window, the current mode, and any outstanding approval the next
//! inbound message must resolve before anything else runs.

use fetch_config::AgentMode;
use fetch_model::Message;
use nanoid::nanoid;
use serde::{Deserialize, Serialize};

/// An `ask_user` call waiting on the next human reply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingApproval {
    pub approval_id: String,
    pub question: String,
}

/// Conversation state for one thread. Owns the message window and token
/// accounting; persistence and thread/session bookkeeping live in
/// `fetch-store`, which serializes this type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub thread_id: String,
    pub messages: Vec<Message>,
    pub token_count: usize,
    pub max_tokens: usize,
    pub mode: AgentMode,
    pub pending_approval: Option<PendingApproval>,
}

impl Session {
    pub fn new(thread_id: impl Into<String>, max_tokens: usize) -> Self {
        Self {
            id: format!("ses_{}", nanoid!(12)),
            thread_id: thread_id.into(),
            messages: Vec::new(),
            token_count: 0,
            max_tokens,
            mode: AgentMode::default(),
            pending_approval: None,
        }
    }

    pub fn push(&mut self, msg: Message) {
        self.token_count += msg.approx_tokens();
        self.messages.push(msg);
    }

    pub fn push_many(&mut self, msgs: impl IntoIterator<Item = Message>) {
        for m in msgs {
            self.push(m);
        }
    }

    /// Fraction of `max_tokens` currently used (can exceed 1.0 before
    /// compaction runs).
    pub fn context_fraction(&self) -> f32 {
        if self.max_tokens == 0 {
            return 0.0;
        }
        (self.token_count as f32) / (self.max_tokens as f32)
    }

    pub fn is_near_limit(&self, threshold: f32) -> bool {
        self.context_fraction() >= threshold
    }

    /// Recalculate token count from scratch (call after compaction).
    pub fn recalculate_tokens(&mut self) {
        self.token_count = self.messages.iter().map(Message::approx_tokens).sum();
    }

    /// Replace the message list and recalculate token count.
    pub fn replace_messages(&mut self, messages: Vec<Message>) {
        self.messages = messages;
        self.recalculate_tokens();
    }

    pub fn set_pending_approval(&mut self, approval_id: impl Into<String>, question: impl Into<String>) {
        self.pending_approval = Some(PendingApproval {
            approval_id: approval_id.into(),
            question: question.into(),
        });
    }

    pub fn take_pending_approval(&mut self) -> Option<PendingApproval> {
        self.pending_approval.take()
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
