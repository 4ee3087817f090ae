// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Message Router (§4.1): the single entry point a transport adapter calls
//! for every inbound chat message.
use std::sync::{Arc, Mutex};

use fetch_config::{AgentMode, Config};
use fetch_core::{Agent, ProgressSink, Skill};
use fetch_model::Role;
use fetch_store::Store;
use fetch_tools::{ToolCall, ToolRegistry};
use tracing::{info, warn};

use crate::command::CommandParser;
use crate::dedup::DedupCache;
use crate::mode::ModeManager;
use crate::ports::RouterPorts;
use crate::rate_limit::RateLimiter;
use crate::reflex::{ReflexAction, ReflexContext, ReflexRegistry};

const ACCEPT_TOKENS: &[&str] = &["yes", "y", "ok", "confirm"];
const DENY_TOKENS: &[&str] = &["no", "n", "cancel", "stop"];

/// Normalizes input, deduplicates, rate-limits, and dispatches to a reflex,
/// a slash command, or the agent loop (§4.1).
pub struct MessageRouter {
    store: Arc<Store>,
    mode: ModeManager,
    dedup: Mutex<DedupCache>,
    rate_limiter: Mutex<RateLimiter>,
    reflexes: ReflexRegistry,
    commands: CommandParser,
    ports: RouterPorts,
    tools: Arc<ToolRegistry>,
    skills: Vec<Skill>,
}

impl MessageRouter {
    pub fn new(
        store: Arc<Store>,
        config: &Config,
        reflexes: ReflexRegistry,
        ports: RouterPorts,
        tools: Arc<ToolRegistry>,
        skills: Vec<Skill>,
    ) -> Self {
        Self {
            mode: ModeManager::new(store.clone()),
            dedup: Mutex::new(DedupCache::new(config.dedup_ttl_ms)),
            rate_limiter: Mutex::new(RateLimiter::new(config.rate_limit_max, config.rate_limit_window_ms)),
            reflexes,
            commands: CommandParser::new(),
            ports,
            tools,
            skills,
            store,
        }
    }

    /// Processes one message for `user_id`. Returns the chat lines to send
    /// back, each already prefixed with the current mode glyph. An empty
    /// vector means the message was a silent duplicate.
    pub async fn handle_message(
        &self,
        user_id: &str,
        text: &str,
        agent: &mut Agent,
        progress: Option<&dyn ProgressSink>,
    ) -> anyhow::Result<Vec<String>> {
        if self.dedup.lock().unwrap().check_and_record(user_id, text) {
            return Ok(Vec::new());
        }

        if !self.rate_limiter.lock().unwrap().check(user_id) {
            let glyph = self.mode.current()?.glyph();
            return Ok(vec![format!("{glyph} rate limited, retry shortly")]);
        }

        let mut session = self.store.get_or_create_session(user_id)?;
        self.store.touch_session(&session.id)?;
        self.mode.wake_if_resting()?;

        let trimmed = text.trim();
        let mut lines: Vec<String> = Vec::new();
        let mut handled_here = false;

        if trimmed.starts_with('/') {
            let ctx = ReflexContext {
                user_id,
                text: trimmed,
                session: &session,
                store: &self.store,
                mode: self.mode.current()?,
                tools: &self.tools,
                skills: &self.skills,
                ports: &self.ports,
            };
            let outcome = self.commands.dispatch(trimmed, &ctx).await;
            if outcome.handled {
                handled_here = true;
                self.apply_action(outcome.action.as_ref(), &mut session, agent)?;
                lines.extend(outcome.responses);
            }
        }

        if !handled_here {
            if let Some(reflex) = self.reflexes.find(trimmed) {
                let ctx = ReflexContext {
                    user_id,
                    text: trimmed,
                    session: &session,
                    store: &self.store,
                    mode: self.mode.current()?,
                    tools: &self.tools,
                    skills: &self.skills,
                    ports: &self.ports,
                };
                let outcome = reflex.handler.handle(&ctx).await;
                if outcome.matched {
                    self.apply_action(outcome.action.as_ref(), &mut session, agent)?;
                    if let Some(response) = outcome.response {
                        lines.push(response);
                    }
                    if !outcome.continue_processing {
                        handled_here = true;
                    }
                }
            }
        }

        if !handled_here {
            let current_mode = self.mode.current()?;
            if current_mode == AgentMode::Waiting {
                if let Some(pending) = session.pending_approval.clone() {
                    let answer = self.resolve_pending_approval(&mut session, &pending, trimmed).await?;
                    lines.push(answer);
                    handled_here = true;
                }
            }
        }

        if !handled_here {
            let reply = agent.turn(text, progress).await?;
            lines.push(reply);
            self.mode.transition(agent.mode())?;
            if let Some(pending) = agent.session_mut().take_pending_approval() {
                let stored = fetch_store::PendingApproval {
                    tool_name: "ask_user".to_string(),
                    args: serde_json::json!({ "approval_id": pending.approval_id }),
                    description: pending.question,
                    diff: None,
                };
                self.store.set_pending_approval(&session.id, Some(stored.clone()))?;
                session.pending_approval = Some(stored);
            }
        }

        let glyph = self.mode.current()?.glyph();
        let lines: Vec<String> = lines
            .into_iter()
            .map(|l| if l.starts_with(glyph) { l } else { format!("{glyph} {l}") })
            .collect();

        if let Err(e) = self.persist_turn(&session, text, &lines) {
            warn!(error = %e, "failed to persist conversation turn");
        }

        Ok(lines)
    }

    /// Resolves a stored pending approval against a yes/no answer (§4.1 step
    /// 7). `ask_user` questions carry no tool to re-run on accept — the
    /// question was only ever meant to surface to the user, not to be
    /// re-invoked — so they resolve to a plain acknowledgement. Any other
    /// `tool_name` is a dangerous-write-tool proposal: accepting re-executes
    /// the stored call.
    async fn resolve_pending_approval(
        &self,
        session: &mut fetch_store::Session,
        pending: &fetch_store::PendingApproval,
        text: &str,
    ) -> anyhow::Result<String> {
        let lower = text.trim().to_lowercase();
        if ACCEPT_TOKENS.contains(&lower.as_str()) {
            self.store.set_pending_approval(&session.id, None)?;
            session.pending_approval = None;
            self.mode.transition(AgentMode::Listening)?;
            if pending.tool_name == "ask_user" {
                info!(question = %pending.description, "approval accepted for ask_user question");
                return Ok(format!("got it — proceeding on: {}", pending.description));
            }
            let call = ToolCall {
                id: "approval".to_string(),
                name: pending.tool_name.clone(),
                args: pending.args.clone(),
            };
            let output = self.tools.execute(&call).await;
            info!(tool = %pending.tool_name, "approved pending write tool");
            Ok(output.content)
        } else if DENY_TOKENS.contains(&lower.as_str()) {
            self.store.set_pending_approval(&session.id, None)?;
            session.pending_approval = None;
            self.mode.transition(AgentMode::Listening)?;
            Ok("cancelled.".to_string())
        } else {
            Ok(format!("please respond yes or no: {}", pending.description))
        }
    }

    fn apply_action(
        &self,
        action: Option<&ReflexAction>,
        session: &mut fetch_store::Session,
        agent: &mut Agent,
    ) -> anyhow::Result<()> {
        match action {
            Some(ReflexAction::Stop) => {}
            Some(ReflexAction::Undo) => {}
            Some(ReflexAction::Clear) => {
                self.store.clear_active_thread(&session.id)?;
                session.active_files.clear();
                agent.session_mut().replace_messages(Vec::new());
            }
            Some(ReflexAction::Pause) => {
                self.mode.transition(AgentMode::Resting)?;
            }
            Some(ReflexAction::Resume) => {
                self.mode.transition(AgentMode::Listening)?;
            }
            Some(ReflexAction::SetMode(mode)) => {
                self.mode.transition(*mode)?;
            }
            None => {}
        }
        Ok(())
    }

    fn persist_turn(&self, session: &fetch_store::Session, user_text: &str, responses: &[String]) -> anyhow::Result<()> {
        self.store.add_message(&session.active_thread_id, Role::User, user_text, None, None)?;
        for response in responses {
            self.store.add_message(&session.active_thread_id, Role::Assistant, response.as_str(), None, None)?;
        }
        Ok(())
    }
}
