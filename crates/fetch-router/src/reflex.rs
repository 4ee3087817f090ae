// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Reflex Registry (§4.2): a sorted list of deterministic, non-LM handlers.
//! First match by descending priority wins.
use std::sync::Arc;

use async_trait::async_trait;
use fetch_config::AgentMode;
use fetch_core::Skill;
use fetch_tools::ToolRegistry;
use regex::Regex;

use crate::ports::RouterPorts;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReflexCategory {
    Safety,
    Info,
    Meta,
    System,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReflexAction {
    Stop,
    Undo,
    Clear,
    Pause,
    Resume,
    SetMode(AgentMode),
}

/// Everything a reflex handler needs to decide and respond, borrowed for
/// the duration of one `handle_message` call.
pub struct ReflexContext<'a> {
    pub user_id: &'a str,
    pub text: &'a str,
    pub session: &'a fetch_store::Session,
    pub store: &'a fetch_store::Store,
    pub mode: AgentMode,
    pub tools: &'a ToolRegistry,
    pub skills: &'a [Skill],
    pub ports: &'a RouterPorts,
}

#[derive(Debug, Default, Clone)]
pub struct ReflexOutcome {
    pub matched: bool,
    pub response: Option<String>,
    pub action: Option<ReflexAction>,
    /// When true, the router still invokes the agent afterwards with this
    /// response prepended, instead of returning it alone.
    pub continue_processing: bool,
}

impl ReflexOutcome {
    pub fn respond(text: impl Into<String>) -> Self {
        Self { matched: true, response: Some(text.into()), action: None, continue_processing: false }
    }

    pub fn with_action(text: impl Into<String>, action: ReflexAction) -> Self {
        Self { matched: true, response: Some(text.into()), action: Some(action), continue_processing: false }
    }

    pub fn no_match() -> Self {
        Self::default()
    }
}

#[async_trait]
pub trait ReflexHandler: Send + Sync {
    async fn handle(&self, ctx: &ReflexContext<'_>) -> ReflexOutcome;
}

pub struct Reflex {
    pub name: &'static str,
    pub triggers: Vec<&'static str>,
    pub patterns: Vec<Regex>,
    pub priority: i32,
    pub category: ReflexCategory,
    pub handler: Arc<dyn ReflexHandler>,
}

impl Reflex {
    fn triggers_on(&self, trimmed_lower: &str) -> bool {
        self.triggers.iter().any(|t| t.eq_ignore_ascii_case(trimmed_lower))
            || self.patterns.iter().any(|p| p.is_match(trimmed_lower))
    }
}

/// Sorted by descending priority; first matching reflex wins (§4.2).
pub struct ReflexRegistry {
    reflexes: Vec<Reflex>,
}

impl ReflexRegistry {
    pub fn new() -> Self {
        Self { reflexes: Vec::new() }
    }

    pub fn register(&mut self, reflex: Reflex) {
        let pos = self.reflexes.partition_point(|r| r.priority >= reflex.priority);
        self.reflexes.insert(pos, reflex);
    }

    pub fn find(&self, text: &str) -> Option<&Reflex> {
        let trimmed_lower = text.trim().to_lowercase();
        self.reflexes.iter().find(|r| r.triggers_on(&trimmed_lower))
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.reflexes.iter().map(|r| r.name).collect()
    }
}

impl Default for ReflexRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysMatch;

    #[async_trait]
    impl ReflexHandler for AlwaysMatch {
        async fn handle(&self, _ctx: &ReflexContext<'_>) -> ReflexOutcome {
            ReflexOutcome::respond("handled")
        }
    }

    fn reflex(name: &'static str, priority: i32, trigger: &'static str) -> Reflex {
        Reflex {
            name,
            triggers: vec![trigger],
            patterns: vec![],
            priority,
            category: ReflexCategory::Info,
            handler: Arc::new(AlwaysMatch),
        }
    }

    #[test]
    fn higher_priority_reflex_is_checked_first() {
        let mut registry = ReflexRegistry::new();
        registry.register(reflex("low", 10, "x"));
        registry.register(reflex("high", 90, "x"));
        let found = registry.find("x").unwrap();
        assert_eq!(found.name, "high");
    }

    #[test]
    fn matching_is_case_insensitive_and_trims_whitespace() {
        let mut registry = ReflexRegistry::new();
        registry.register(reflex("greet", 10, "hi"));
        assert!(registry.find("  HI  ").is_some());
    }

    #[test]
    fn no_match_returns_none() {
        let mut registry = ReflexRegistry::new();
        registry.register(reflex("greet", 10, "hi"));
        assert!(registry.find("goodbye").is_none());
    }

    #[test]
    fn pattern_triggers_also_match() {
        let mut registry = ReflexRegistry::new();
        registry.register(Reflex {
            name: "status-like",
            triggers: vec![],
            patterns: vec![Regex::new(r"^status\b").unwrap()],
            priority: 10,
            category: ReflexCategory::Info,
            handler: Arc::new(AlwaysMatch),
        });
        assert!(registry.find("status please").is_some());
    }
}
