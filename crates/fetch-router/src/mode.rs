// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Mode state machine (§7). Mode is process-wide, not per-conversation: it
//! is persisted as a singleton row via [`fetch_store::Store::get_mode`] /
//! `set_mode`, matching the rest of this core's single-active-session
//! design (single-slot task queue, one shared tool-event channel).
use std::sync::Arc;

use fetch_config::AgentMode;
use fetch_store::{now_iso8601, ModeRecord, Store};
use tracing::info;

use crate::error::RouterError;

/// Returns `true` if transitioning from `from` to `to` is permitted.
fn transition_allowed(from: AgentMode, to: AgentMode) -> bool {
    use AgentMode::*;
    if from == to {
        return true;
    }
    match (from, to) {
        (Listening, Working) => true,
        (Listening, Waiting) => true,
        (Listening, Guarding) => true,
        (Listening, Resting) => true,
        (Working, Listening) => true,
        (Working, Waiting) => true,
        (Working, Guarding) => true,
        (Waiting, Listening) => true,
        (Waiting, Working) => true,
        (Guarding, Listening) => true,
        (Guarding, Working) => true,
        (Resting, Listening) => true,
        _ => false,
    }
}

/// Wraps the durable singleton mode row with the transition table and
/// logging (§7).
pub struct ModeManager {
    store: Arc<Store>,
}

impl ModeManager {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub fn current(&self) -> Result<AgentMode, RouterError> {
        Ok(self.store.get_mode()?.mode)
    }

    /// Validates and persists a transition, returning the new mode. Any
    /// activity while Resting wakes the core back to Listening.
    pub fn transition(&self, to: AgentMode) -> Result<AgentMode, RouterError> {
        let record = self.store.get_mode()?;
        let from = record.mode;
        if !transition_allowed(from, to) {
            return Err(RouterError::InvalidModeTransition {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        if from == to {
            return Ok(to);
        }
        let updated = ModeRecord {
            mode: to,
            since: now_iso8601(),
            previous: Some(from),
            transition_count: record.transition_count + 1,
        };
        self.store.set_mode(&updated)?;
        info!(from = %from, to = %to, "mode transition");
        Ok(to)
    }

    /// Wakes from Resting on any inbound activity; otherwise a no-op.
    pub fn wake_if_resting(&self) -> Result<AgentMode, RouterError> {
        let current = self.current()?;
        if current == AgentMode::Resting {
            self.transition(AgentMode::Listening)
        } else {
            Ok(current)
        }
    }
}
