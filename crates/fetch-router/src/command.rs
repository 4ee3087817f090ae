// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Command Parser (§4.3): dispatches a raw slash line to one of the
//! built-in command handlers. Unhandled commands fall through to the agent.
use fetch_tools::ToolCall;
use tracing::warn;

use crate::reflex::{ReflexAction, ReflexContext};

#[derive(Debug, Default, Clone)]
pub struct CommandOutcome {
    pub handled: bool,
    pub responses: Vec<String>,
    pub action: Option<ReflexAction>,
}

impl CommandOutcome {
    fn handled(responses: Vec<String>) -> Self {
        Self { handled: true, responses, action: None }
    }

    fn unhandled() -> Self {
        Self::default()
    }

    fn one(text: impl Into<String>) -> Self {
        Self::handled(vec![text.into()])
    }
}

pub struct CommandParser;

impl CommandParser {
    pub fn new() -> Self {
        Self
    }

    /// `line` is the full raw text, including the leading `/`.
    pub async fn dispatch(&self, line: &str, ctx: &ReflexContext<'_>) -> CommandOutcome {
        let trimmed = line.trim();
        let mut parts = trimmed.splitn(2, char::is_whitespace);
        let cmd = parts.next().unwrap_or("").to_lowercase();
        let args = parts.next().unwrap_or("").trim();

        match cmd.as_str() {
            "/add" => self.add(args, ctx).await,
            "/drop" => self.drop(args, ctx).await,
            "/files" => self.files(ctx),
            "/clear" => CommandOutcome {
                handled: true,
                responses: vec!["cleared the conversation.".to_string()],
                action: Some(ReflexAction::Clear),
            },
            "/workspace" => self.workspace(args, ctx).await,
            "/thread" => self.thread(args, ctx).await,
            "/skill" | "/skills" => self.skills(ctx),
            "/tool" | "/tools" => self.tools(ctx),
            "/remind" => self.schedule("remind", args, ctx).await,
            "/schedule" => self.schedule("schedule", args, ctx).await,
            "/cron" => self.schedule("cron", args, ctx).await,
            "/identity" => CommandOutcome::one(
                "I'm Fetch: I route your messages to reflexes, slash commands, or a \
                 tool-using agent that delegates coding work to a sandboxed harness.",
            ),
            _ => CommandOutcome::unhandled(),
        }
    }

    async fn add(&self, args: &str, ctx: &ReflexContext<'_>) -> CommandOutcome {
        if args.is_empty() {
            return CommandOutcome::one("usage: /add <path>");
        }
        match ctx.store.add_active_file(&ctx.session.id, args) {
            Ok(()) => CommandOutcome::one(format!("added {args} to active files.")),
            Err(e) => {
                warn!(error = %e, "failed to add active file");
                CommandOutcome::one(format!("could not add {args}: {e}"))
            }
        }
    }

    async fn drop(&self, args: &str, ctx: &ReflexContext<'_>) -> CommandOutcome {
        if args.is_empty() {
            return CommandOutcome::one("usage: /drop <path>");
        }
        match ctx.store.remove_active_file(&ctx.session.id, args) {
            Ok(()) => CommandOutcome::one(format!("dropped {args} from active files.")),
            Err(e) => CommandOutcome::one(format!("could not drop {args}: {e}")),
        }
    }

    fn files(&self, ctx: &ReflexContext<'_>) -> CommandOutcome {
        if ctx.session.active_files.is_empty() {
            CommandOutcome::one("no active files.")
        } else {
            CommandOutcome::one(ctx.session.active_files.join("\n"))
        }
    }

    async fn workspace(&self, args: &str, ctx: &ReflexContext<'_>) -> CommandOutcome {
        let mut parts = args.splitn(2, char::is_whitespace);
        let sub = parts.next().unwrap_or("").to_lowercase();
        let rest = parts.next().unwrap_or("").trim();
        match sub.as_str() {
            "" | "list" => match ctx.ports.workspaces.list_names().await {
                Ok(names) if names.is_empty() => CommandOutcome::one("no workspaces."),
                Ok(names) => CommandOutcome::one(names.join(", ")),
                Err(e) => CommandOutcome::one(format!("could not list workspaces: {e}")),
            },
            "select" if !rest.is_empty() => {
                self.run_tool(ctx, "workspace_select", serde_json::json!({ "workspace_id": rest })).await
            }
            "create" if !rest.is_empty() => {
                self.run_tool(ctx, "workspace_create", serde_json::json!({ "name": rest })).await
            }
            "delete" if !rest.is_empty() => {
                self.run_tool(ctx, "workspace_delete", serde_json::json!({ "workspace_id": rest })).await
            }
            _ => CommandOutcome::one("usage: /workspace [list|select <id>|create <name>|delete <id>]"),
        }
    }

    async fn thread(&self, args: &str, ctx: &ReflexContext<'_>) -> CommandOutcome {
        let mut parts = args.splitn(2, char::is_whitespace);
        let sub = parts.next().unwrap_or("").to_lowercase();
        let rest = parts.next().unwrap_or("").trim();
        match sub.as_str() {
            "" | "list" => match ctx.store.list_threads(&ctx.session.id) {
                Ok(threads) if threads.is_empty() => CommandOutcome::one("no threads yet."),
                Ok(threads) => {
                    let lines: Vec<String> = threads.iter().map(|t| t.title.clone()).collect();
                    CommandOutcome::one(lines.join("\n"))
                }
                Err(e) => CommandOutcome::one(format!("could not list threads: {e}")),
            },
            "new" => {
                let title = if rest.is_empty() { "untitled" } else { rest };
                match ctx.store.create_thread(&ctx.session.id, title) {
                    Ok(thread) => CommandOutcome::one(format!("created thread {}.", thread.title)),
                    Err(e) => CommandOutcome::one(format!("could not create thread: {e}")),
                }
            }
            "switch" if !rest.is_empty() => {
                let mut session = ctx.session.clone();
                session.active_thread_id = rest.to_string();
                match ctx.store.update_session(&session) {
                    Ok(()) => CommandOutcome::one(format!("switched to thread {rest}.")),
                    Err(e) => CommandOutcome::one(format!("could not switch thread: {e}")),
                }
            }
            _ => CommandOutcome::one("usage: /thread [list|new <title>|switch <id>]"),
        }
    }

    fn skills(&self, ctx: &ReflexContext<'_>) -> CommandOutcome {
        if ctx.skills.is_empty() {
            CommandOutcome::one("no skills loaded.")
        } else {
            let lines: Vec<String> = ctx.skills.iter().map(|s| format!("{}: {}", s.id, s.description)).collect();
            CommandOutcome::one(lines.join("\n"))
        }
    }

    fn tools(&self, ctx: &ReflexContext<'_>) -> CommandOutcome {
        let names = ctx.tools.names_for_mode(ctx.mode);
        if names.is_empty() {
            CommandOutcome::one("no tools available in the current mode.")
        } else {
            CommandOutcome::one(names.join(", "))
        }
    }

    async fn schedule(&self, kind: &str, args: &str, ctx: &ReflexContext<'_>) -> CommandOutcome {
        if args.is_empty() {
            return CommandOutcome::one(format!("usage: /{kind} <spec>"));
        }
        match ctx.ports.schedule.create(&ctx.session.id, kind, args).await {
            Ok(confirmation) => CommandOutcome::one(confirmation),
            Err(e) => CommandOutcome::one(format!("could not schedule: {e}")),
        }
    }

    async fn run_tool(&self, ctx: &ReflexContext<'_>, name: &str, args: serde_json::Value) -> CommandOutcome {
        let call = ToolCall { id: "router".to_string(), name: name.to_string(), args };
        let output = ctx.tools.execute(&call).await;
        CommandOutcome { handled: true, responses: vec![output.content], action: None }
    }
}

impl Default for CommandParser {
    fn default() -> Self {
        Self::new()
    }
}
