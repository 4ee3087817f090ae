// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
mod agent;
mod compact;
mod events;
mod prompts;
mod runtime_context;
mod session;

pub use agent::{Agent, ProgressSink};
pub use compact::{emergency_compact, needs_clarification, needs_compaction, smart_truncate};
pub use events::AgentEvent;
pub use prompts::{system_prompt, SessionContext};
pub use runtime_context::{AgentRuntimeContext, Skill};
pub use session::{PendingApproval, Session};
