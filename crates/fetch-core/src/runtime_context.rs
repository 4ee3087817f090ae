// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Runtime context for an agent session.
//!
//! Separate from [`fetch_config::Config`], which holds only config-file
//! fields. [`AgentRuntimeContext`] carries values detected or injected at
//! construction time: the active workspace, discovered skills, and prompt
//! overrides.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A skill available to the agent loop's discover-then-activate step.
///
/// `triggers` are matched case-insensitively, substring, against the raw
/// user text; a match inlines `body` into the system prompt for this turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    pub id: String,
    pub description: String,
    pub triggers: Vec<String>,
    pub body: String,
}

impl Skill {
    pub fn matches(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.triggers
            .iter()
            .any(|t| lower.contains(&t.to_lowercase()))
    }
}

/// Environment-detected context injected into an agent at construction time.
#[derive(Debug, Default, Clone)]
pub struct AgentRuntimeContext {
    /// Absolute path to the active workspace root.
    pub workspace_root: Option<PathBuf>,
    /// Pre-formatted git context block (branch, dirty status, ahead/behind).
    pub git_context_note: Option<String>,
    /// Name and state of the task currently running, if any.
    pub active_task_note: Option<String>,
    /// Contents of the workspace context file (`.fetch/context.md`, `AGENTS.md`, ...).
    pub project_context_file: Option<String>,
    /// Text appended to the default system prompt.
    pub append_system_prompt: Option<String>,
    /// Full system prompt override. When set, replaces the generated prompt entirely.
    pub system_prompt_override: Option<String>,
    /// Skills available for this turn's discover-then-activate step.
    pub skills: Vec<Skill>,
}

impl AgentRuntimeContext {
    /// Skills whose triggers match `text`, in declaration order.
    pub fn activated_skills(&self, text: &str) -> Vec<&Skill> {
        self.skills.iter().filter(|s| s.matches(text)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skill(id: &str, triggers: &[&str]) -> Skill {
        Skill {
            id: id.into(),
            description: format!("{id} description"),
            triggers: triggers.iter().map(|s| s.to_string()).collect(),
            body: format!("{id} body"),
        }
    }

    #[test]
    fn skill_matches_is_case_insensitive() {
        let s = skill("deploy", &["Deploy Now"]);
        assert!(s.matches("please deploy now please"));
    }

    #[test]
    fn activated_skills_filters_by_trigger() {
        let ctx = AgentRuntimeContext {
            skills: vec![skill("deploy", &["deploy"]), skill("debug", &["stack trace"])],
            ..Default::default()
        };
        let hits = ctx.activated_skills("please deploy the app");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "deploy");
    }

    #[test]
    fn activated_skills_empty_when_no_trigger_matches() {
        let ctx = AgentRuntimeContext {
            skills: vec![skill("deploy", &["deploy"])],
            ..Default::default()
        };
        assert!(ctx.activated_skills("what is the weather").is_empty());
    }
}
