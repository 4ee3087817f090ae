// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use chrono::Local;

use fetch_config::AgentMode;

use crate::runtime_context::{AgentRuntimeContext, Skill};

/// Session-level facts injected into the prompt alongside the mode and the
/// skill catalog: active workspace, active task, active files.
#[derive(Debug, Default, Clone)]
pub struct SessionContext {
    pub active_workspace: Option<String>,
    pub active_task: Option<String>,
    pub active_files: Vec<String>,
}

mod guidelines {
    pub fn general() -> &'static str {
        "- Be concise and precise. Use tools instead of guessing.\n\
         - Never describe what a tool would do — call it."
    }

    pub fn mode(mode: super::AgentMode) -> &'static str {
        use super::AgentMode::*;
        match mode {
            Listening => "You are listening for the next request. Accept any input.",
            Working => "A task is running in the background. New task requests queue behind it; \
                        keep replies short and route task-specific follow-ups through task_respond.",
            Waiting => "A confirmation is pending. The next user message may be interpreted as a \
                        yes/no answer to the pending question rather than a new request.",
            Guarding => "A dangerous proposal is pending. Only accept yes/no; re-prompt on anything else.",
            Resting => "No recent activity. Keep responses minimal until new input arrives.",
        }
    }
}

fn identity_block() -> String {
    "You are Fetch, an agentic chat assistant. You route messages to tools and, for \
     substantial coding work, hand off to background coding tasks running in a sandbox."
        .to_string()
}

fn session_context_block(ctx: &SessionContext) -> String {
    let mut lines = vec![format!("- Time: {}", Local::now().to_rfc3339())];
    lines.push(format!(
        "- Active workspace: {}",
        ctx.active_workspace.as_deref().unwrap_or("none")
    ));
    lines.push(format!(
        "- Active task: {}",
        ctx.active_task.as_deref().unwrap_or("none")
    ));
    if ctx.active_files.is_empty() {
        lines.push("- Active files: none".to_string());
    } else {
        lines.push(format!("- Active files: {}", ctx.active_files.join(", ")));
    }
    format!("## Session\n{}", lines.join("\n"))
}

fn skills_summary_block(skills: &[Skill]) -> Option<String> {
    if skills.is_empty() {
        return None;
    }
    let mut out = String::from("## Skills\n<available_skills>\n");
    for s in skills {
        out.push_str(&format!(
            "  <skill id=\"{}\">{}</skill>\n",
            s.id, s.description
        ));
    }
    out.push_str("</available_skills>");
    Some(out)
}

fn activated_skills_block(skills: &[&Skill]) -> Option<String> {
    if skills.is_empty() {
        return None;
    }
    let mut out = String::new();
    for s in skills {
        out.push_str(&format!(
            "<activated_skill id=\"{}\">\n{}\n</activated_skill>\n",
            s.id, s.body
        ));
    }
    Some(out)
}

/// Assemble the system prompt for one turn: identity, mode instruction,
/// session context, skill catalog, any skills activated by `user_text`, and
/// an operator-provided appendix.
///
/// Returns `ctx.system_prompt_override` verbatim (plus the appendix) when set.
pub fn system_prompt(
    mode: AgentMode,
    user_text: &str,
    session: &SessionContext,
    ctx: &AgentRuntimeContext,
) -> String {
    if let Some(override_prompt) = &ctx.system_prompt_override {
        let mut out = override_prompt.clone();
        if let Some(appendix) = &ctx.append_system_prompt {
            out.push_str("\n\n");
            out.push_str(appendix);
        }
        return out;
    }

    let mut sections = vec![
        identity_block(),
        format!("## Mode: {} {}\n{}", mode.glyph(), mode, guidelines::mode(mode)),
        session_context_block(session),
        format!("## Guidelines\n{}", guidelines::general()),
    ];

    if let Some(block) = skills_summary_block(&ctx.skills) {
        sections.push(block);
    }
    if let Some(block) = activated_skills_block(&ctx.activated_skills(user_text)) {
        sections.push(block);
    }
    if let Some(file) = &ctx.project_context_file {
        sections.push(format!("## Project context\n{file}"));
    }
    if let Some(git) = &ctx.git_context_note {
        sections.push(format!("## Git\n{git}"));
    }
    if let Some(task_note) = &ctx.active_task_note {
        sections.push(format!("## Background task\n{task_note}"));
    }
    if let Some(appendix) = &ctx.append_system_prompt {
        sections.push(appendix.clone());
    }

    sections.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_includes_mode_glyph_and_session_context() {
        let session = SessionContext {
            active_workspace: Some("demo".into()),
            active_task: None,
            active_files: vec![],
        };
        let ctx = AgentRuntimeContext::default();
        let prompt = system_prompt(AgentMode::Working, "hi", &session, &ctx);
        assert!(prompt.contains("🔵"));
        assert!(prompt.contains("Active workspace: demo"));
    }

    #[test]
    fn prompt_omits_skills_section_when_empty() {
        let ctx = AgentRuntimeContext::default();
        let prompt = system_prompt(AgentMode::Listening, "hi", &SessionContext::default(), &ctx);
        assert!(!prompt.contains("<available_skills>"));
    }

    #[test]
    fn prompt_lists_skills_and_activates_matching_ones() {
        let ctx = AgentRuntimeContext {
            skills: vec![Skill {
                id: "deploy".into(),
                description: "Deploy the active workspace.".into(),
                triggers: vec!["deploy".into()],
                body: "Run the deploy playbook before reporting success.".into(),
            }],
            ..Default::default()
        };
        let prompt = system_prompt(
            AgentMode::Listening,
            "please deploy this",
            &SessionContext::default(),
            &ctx,
        );
        assert!(prompt.contains("<available_skills>"));
        assert!(prompt.to_lowercase().contains("deploy the active workspace"));
        assert!(prompt.contains("<activated_skill id=\"deploy\">"));
    }

    #[test]
    fn override_prompt_replaces_generated_sections() {
        let ctx = AgentRuntimeContext {
            system_prompt_override: Some("custom prompt".into()),
            append_system_prompt: Some("extra".into()),
            ..Default::default()
        };
        let prompt = system_prompt(AgentMode::Listening, "hi", &SessionContext::default(), &ctx);
        assert_eq!(prompt, "custom prompt\n\nextra");
    }
}
