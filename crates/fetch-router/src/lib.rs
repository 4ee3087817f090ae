// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Message Router, Reflex Registry, Command Parser, and Mode Manager
//! (§4.1, §4.2, §4.3, §4.9): everything that decides whether an inbound
//! chat message becomes a reflex reply, a slash command, or an agent turn.
mod backoff;
mod builtin_reflexes;
mod command;
mod dedup;
mod error;
mod mode;
mod ports;
mod rate_limit;
mod reflex;
mod router;

pub use backoff::ReconnectBackoff;
pub use builtin_reflexes::register_builtins;
pub use command::{CommandOutcome, CommandParser};
pub use dedup::DedupCache;
pub use error::RouterError;
pub use mode::ModeManager;
pub use ports::{GitUndoPort, RouterPorts, SchedulePort, TaskControlPort, WorkspaceListPort};
pub use rate_limit::RateLimiter;
pub use reflex::{Reflex, ReflexAction, ReflexCategory, ReflexContext, ReflexHandler, ReflexOutcome, ReflexRegistry};
pub use router::MessageRouter;

/// Builds a [`ReflexRegistry`] with every built-in reflex registered.
pub fn default_reflex_registry() -> ReflexRegistry {
    let mut registry = ReflexRegistry::new();
    register_builtins(&mut registry);
    registry
}
