// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Built-in reflex handlers (§4.2) plus their registration helper.
use async_trait::async_trait;
use tracing::warn;

use crate::reflex::{Reflex, ReflexAction, ReflexCategory, ReflexContext, ReflexHandler, ReflexOutcome, ReflexRegistry};

struct HelpReflex;

#[async_trait]
impl ReflexHandler for HelpReflex {
    async fn handle(&self, _ctx: &ReflexContext<'_>) -> ReflexOutcome {
        ReflexOutcome::respond(
            "Commands: /workspace, /thread, /skill(s), /tool(s), /add, /drop, /files, /clear, \
             /remind, /schedule, /cron, /identity. Say 'stop' to cancel the active task, \
             'undo' to reset the workspace to where this session started, 'status' for the \
             current task and mode.",
        )
    }
}

struct StatusReflex;

#[async_trait]
impl ReflexHandler for StatusReflex {
    async fn handle(&self, ctx: &ReflexContext<'_>) -> ReflexOutcome {
        let task_line = match ctx.ports.tasks.status_line(&ctx.session.id).await {
            Ok(Some(line)) => line,
            Ok(None) => "no active task".to_string(),
            Err(e) => {
                warn!(error = %e, "status reflex failed to read task state");
                "no active task".to_string()
            }
        };
        let workspace = ctx.session.active_workspace_id.as_deref().unwrap_or("none");
        ReflexOutcome::respond(format!(
            "mode={mode} workspace={workspace} task={task}",
            mode = ctx.mode,
            workspace = workspace,
            task = task_line
        ))
    }
}

struct StopReflex;

#[async_trait]
impl ReflexHandler for StopReflex {
    async fn handle(&self, ctx: &ReflexContext<'_>) -> ReflexOutcome {
        match ctx.ports.tasks.cancel_current(&ctx.session.id).await {
            Ok(true) => ReflexOutcome::with_action("cancelling the active task.", ReflexAction::Stop),
            Ok(false) => ReflexOutcome::respond("there is no active task to stop."),
            Err(e) => ReflexOutcome::respond(format!("could not cancel task: {e}")),
        }
    }
}

struct UndoReflex;

#[async_trait]
impl ReflexHandler for UndoReflex {
    async fn handle(&self, ctx: &ReflexContext<'_>) -> ReflexOutcome {
        let Some(workspace_id) = ctx.session.active_workspace_id.as_deref() else {
            return ReflexOutcome::respond("no active workspace to undo in.");
        };
        let Some(start_commit) = ctx.session.git_start_commit.as_deref() else {
            return ReflexOutcome::respond("nothing to undo: no starting commit recorded for this session.");
        };
        match ctx.ports.git.undo(workspace_id, start_commit).await {
            Ok(desc) => ReflexOutcome::with_action(desc, ReflexAction::Undo),
            Err(e) => ReflexOutcome::respond(format!("undo failed: {e}")),
        }
    }
}

struct ClearReflex;

#[async_trait]
impl ReflexHandler for ClearReflex {
    async fn handle(&self, _ctx: &ReflexContext<'_>) -> ReflexOutcome {
        ReflexOutcome::with_action("cleared the conversation.", ReflexAction::Clear)
    }
}

struct WhoamiReflex;

#[async_trait]
impl ReflexHandler for WhoamiReflex {
    async fn handle(&self, ctx: &ReflexContext<'_>) -> ReflexOutcome {
        ReflexOutcome::respond(format!("you are {}.", ctx.user_id))
    }
}

struct IdentityReflex;

#[async_trait]
impl ReflexHandler for IdentityReflex {
    async fn handle(&self, _ctx: &ReflexContext<'_>) -> ReflexOutcome {
        ReflexOutcome::respond(
            "I'm Fetch: I route your messages to reflexes, slash commands, or a tool-using \
             agent that delegates coding work to a sandboxed harness.",
        )
    }
}

struct ThreadsReflex;

#[async_trait]
impl ReflexHandler for ThreadsReflex {
    async fn handle(&self, ctx: &ReflexContext<'_>) -> ReflexOutcome {
        match ctx.store.list_threads(&ctx.session.id) {
            Ok(threads) if threads.is_empty() => ReflexOutcome::respond("no threads yet."),
            Ok(threads) => {
                let lines: Vec<String> = threads
                    .iter()
                    .map(|t| {
                        let marker = if t.id == ctx.session.active_thread_id { "*" } else { " " };
                        format!("{marker} {} ({:?})", t.title, t.status)
                    })
                    .collect();
                ReflexOutcome::respond(lines.join("\n"))
            }
            Err(e) => ReflexOutcome::respond(format!("could not list threads: {e}")),
        }
    }
}

struct SkillsReflex;

#[async_trait]
impl ReflexHandler for SkillsReflex {
    async fn handle(&self, ctx: &ReflexContext<'_>) -> ReflexOutcome {
        if ctx.skills.is_empty() {
            return ReflexOutcome::respond("no skills loaded.");
        }
        let lines: Vec<String> = ctx.skills.iter().map(|s| format!("{}: {}", s.id, s.description)).collect();
        ReflexOutcome::respond(lines.join("\n"))
    }
}

struct ToolsReflex;

#[async_trait]
impl ReflexHandler for ToolsReflex {
    async fn handle(&self, ctx: &ReflexContext<'_>) -> ReflexOutcome {
        let names = ctx.tools.names_for_mode(ctx.mode);
        if names.is_empty() {
            ReflexOutcome::respond("no tools available in the current mode.")
        } else {
            ReflexOutcome::respond(names.join(", "))
        }
    }
}

struct SchedulingReflex;

#[async_trait]
impl ReflexHandler for SchedulingReflex {
    async fn handle(&self, ctx: &ReflexContext<'_>) -> ReflexOutcome {
        match ctx.ports.schedule.list_summaries(&ctx.session.id).await {
            Ok(jobs) if jobs.is_empty() => ReflexOutcome::respond("no reminders or scheduled jobs."),
            Ok(jobs) => ReflexOutcome::respond(jobs.join("\n")),
            Err(e) => ReflexOutcome::respond(format!("could not list scheduled jobs: {e}")),
        }
    }
}

/// Not named in §4.2's reflex list, but required by the literal "hi" →
/// zero-LM-calls scenario: a dedicated, lowest-priority info reflex for
/// casual greetings.
struct GreetingReflex;

#[async_trait]
impl ReflexHandler for GreetingReflex {
    async fn handle(&self, _ctx: &ReflexContext<'_>) -> ReflexOutcome {
        ReflexOutcome::respond("hello! say 'help' to see what I can do.")
    }
}

struct PauseReflex;

#[async_trait]
impl ReflexHandler for PauseReflex {
    async fn handle(&self, _ctx: &ReflexContext<'_>) -> ReflexOutcome {
        ReflexOutcome::with_action("resting; say 'resume' to wake me.", ReflexAction::Pause)
    }
}

struct ResumeReflex;

#[async_trait]
impl ReflexHandler for ResumeReflex {
    async fn handle(&self, _ctx: &ReflexContext<'_>) -> ReflexOutcome {
        ReflexOutcome::with_action("back and listening.", ReflexAction::Resume)
    }
}

/// Registers every built-in reflex (§4.2 plus the greeting supplement) at
/// its specified priority and category.
pub fn register_builtins(registry: &mut ReflexRegistry) {
    registry.register(Reflex {
        name: "stop",
        triggers: vec!["stop", "cancel", "abort"],
        patterns: vec![],
        priority: 100,
        category: ReflexCategory::Safety,
        handler: std::sync::Arc::new(StopReflex),
    });
    registry.register(Reflex {
        name: "undo",
        triggers: vec!["undo", "revert"],
        patterns: vec![],
        priority: 95,
        category: ReflexCategory::Safety,
        handler: std::sync::Arc::new(UndoReflex),
    });
    registry.register(Reflex {
        name: "clear",
        triggers: vec!["clear", "reset conversation"],
        patterns: vec![],
        priority: 90,
        category: ReflexCategory::Safety,
        handler: std::sync::Arc::new(ClearReflex),
    });
    registry.register(Reflex {
        name: "pause",
        triggers: vec!["pause", "rest", "go to sleep"],
        patterns: vec![],
        priority: 85,
        category: ReflexCategory::Safety,
        handler: std::sync::Arc::new(PauseReflex),
    });
    registry.register(Reflex {
        name: "resume",
        triggers: vec!["resume", "wake up"],
        patterns: vec![],
        priority: 80,
        category: ReflexCategory::Safety,
        handler: std::sync::Arc::new(ResumeReflex),
    });
    registry.register(Reflex {
        name: "help",
        triggers: vec!["help", "commands", "?"],
        patterns: vec![],
        priority: 10,
        category: ReflexCategory::Info,
        handler: std::sync::Arc::new(HelpReflex),
    });
    registry.register(Reflex {
        name: "status",
        triggers: vec!["status"],
        patterns: vec![],
        priority: 10,
        category: ReflexCategory::Info,
        handler: std::sync::Arc::new(StatusReflex),
    });
    registry.register(Reflex {
        name: "whoami",
        triggers: vec!["whoami", "who am i"],
        patterns: vec![],
        priority: 10,
        category: ReflexCategory::Meta,
        handler: std::sync::Arc::new(WhoamiReflex),
    });
    registry.register(Reflex {
        name: "identity",
        triggers: vec!["identity", "who are you"],
        patterns: vec![],
        priority: 5,
        category: ReflexCategory::Meta,
        handler: std::sync::Arc::new(IdentityReflex),
    });
    registry.register(Reflex {
        name: "threads",
        triggers: vec!["threads", "list threads"],
        patterns: vec![],
        priority: 5,
        category: ReflexCategory::Meta,
        handler: std::sync::Arc::new(ThreadsReflex),
    });
    registry.register(Reflex {
        name: "skills",
        triggers: vec!["skills", "skill"],
        patterns: vec![],
        priority: 10,
        category: ReflexCategory::System,
        handler: std::sync::Arc::new(SkillsReflex),
    });
    registry.register(Reflex {
        name: "tools",
        triggers: vec!["tools", "tool"],
        patterns: vec![],
        priority: 10,
        category: ReflexCategory::System,
        handler: std::sync::Arc::new(ToolsReflex),
    });
    registry.register(Reflex {
        name: "scheduling",
        triggers: vec!["reminders", "scheduled jobs", "schedule"],
        patterns: vec![],
        priority: 10,
        category: ReflexCategory::System,
        handler: std::sync::Arc::new(SchedulingReflex),
    });
    registry.register(Reflex {
        name: "greeting",
        triggers: vec!["hi", "hello", "hey", "yo"],
        patterns: vec![],
        priority: 1,
        category: ReflexCategory::Info,
        handler: std::sync::Arc::new(GreetingReflex),
    });
}
