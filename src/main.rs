// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
mod cli;

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use cli::{Cli, Commands, ConfigCommands};
use fetch_core::{Agent, AgentRuntimeContext};
use fetch_harness::HarnessEngine;
use fetch_router::{default_reflex_registry, GitUndoPort, MessageRouter, RouterPorts, SchedulePort, TaskControlPort, WorkspaceListPort};
use fetch_sandbox::{ContainerRuntime, ExecOptions, Sandbox};
use fetch_scheduler::{JobStore, Scheduler};
use fetch_store::Store;
use fetch_tasks::{TaskManager, TaskManagerPort};
use fetch_tools::{
    AskUserTool, ReportProgressTool, TaskCancelTool, TaskCreateTool, TaskRespondTool, ToolEvent, ToolRegistry,
    WorkspaceCreateTool, WorkspaceDeleteTool, WorkspaceListTool, WorkspaceSelectTool, WorkspaceStatusTool,
};
use fetch_workspace::WorkspaceManager;

/// Adapts [`TaskManager`] to the router's capability for the `stop`/`status`
/// reflexes, without `fetch-router` depending on `fetch-tasks`.
struct RouterTaskControl {
    tasks: Arc<TaskManager>,
    store: Arc<Store>,
}

#[async_trait]
impl TaskControlPort for RouterTaskControl {
    async fn cancel_current(&self, session_id: &str) -> anyhow::Result<bool> {
        let session = self.store.get_session(session_id)?;
        let Some(task_id) = session.active_task_id else {
            return Ok(false);
        };
        match self.tasks.cancel(&task_id).await {
            Ok(()) => Ok(true),
            Err(e) => {
                warn!(error = %e, task_id, "cancel_current failed");
                Ok(false)
            }
        }
    }

    async fn status_line(&self, session_id: &str) -> anyhow::Result<Option<String>> {
        let session = self.store.get_session(session_id)?;
        let Some(task_id) = session.active_task_id else {
            return Ok(None);
        };
        let task = self.store.get_task(&task_id)?;
        Ok(Some(format!("{} ({:?})", task.id, task.status)))
    }
}

/// Resets a workspace's checkout back to the commit recorded at session
/// start, via a `git reset --hard` run through the sandbox.
struct RouterGitUndo {
    sandbox: Arc<Sandbox>,
    workspace_root: String,
}

#[async_trait]
impl GitUndoPort for RouterGitUndo {
    async fn undo(&self, workspace_id: &str, git_start_commit: &str) -> anyhow::Result<String> {
        let cwd = format!("{}/{workspace_id}", self.workspace_root);
        let opts = ExecOptions { cwd: Some(cwd), ..Default::default() };
        let result = self
            .sandbox
            .exec("git", &["reset".to_string(), "--hard".to_string(), git_start_commit.to_string()], opts)
            .await?;
        if result.exit_code != 0 {
            anyhow::bail!("git reset failed: {}", result.stderr);
        }
        Ok(format!("reset {workspace_id} to {git_start_commit}."))
    }
}

struct RouterWorkspaceList {
    workspaces: Arc<WorkspaceManager>,
}

#[async_trait]
impl WorkspaceListPort for RouterWorkspaceList {
    async fn list_names(&self) -> anyhow::Result<Vec<String>> {
        Ok(self.workspaces.list(false).await?.into_iter().map(|w| w.id).collect())
    }
}

/// Backs `/remind`, `/schedule`, and `/cron`. `kind == "cron"` parses `spec`
/// as a cron expression; anything else parses `spec` as an RFC 3339
/// instant, with the raw command text becoming the message that fires back
/// into the session.
struct RouterSchedule {
    scheduler: Arc<Scheduler>,
}

#[async_trait]
impl SchedulePort for RouterSchedule {
    async fn list_summaries(&self, session_id: &str) -> anyhow::Result<Vec<String>> {
        let jobs = self.scheduler.list(Some(session_id))?;
        Ok(jobs
            .into_iter()
            .map(|j| format!("{} next={} \"{}\"", j.id, j.next_fire_at, j.message))
            .collect())
    }

    async fn create(&self, session_id: &str, kind: &str, spec: &str) -> anyhow::Result<String> {
        let now = chrono::Utc::now();
        let job = if kind == "cron" {
            self.scheduler.create_cron(session_id, spec, spec, now)?
        } else {
            self.scheduler.create_once(session_id, spec, spec, now)?
        };
        Ok(format!("scheduled {} for {}.", job.id, job.next_fire_at))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Commands::Config { command: ConfigCommands::Show } => {
            let config = fetch_config::load(cli.config.as_deref())?;
            println!("{}", serde_yaml::to_string(&config).unwrap_or_default());
            Ok(())
        }
        Commands::Completions { shell } => {
            cli::print_completions(*shell);
            Ok(())
        }
        Commands::Serve { thread } => run_serve(&cli, thread).await,
    }
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

fn data_dir() -> anyhow::Result<std::path::PathBuf> {
    let base = dirs::data_dir().context("could not resolve a data directory for this platform")?;
    let dir = base.join("fetch");
    std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    Ok(dir)
}

async fn run_serve(cli: &Cli, thread: &str) -> anyhow::Result<()> {
    let config = Arc::new(fetch_config::load(cli.config.as_deref())?);

    let store = Arc::new(Store::open(data_dir()?.join("store.redb"))?);
    let scheduler_store = JobStore::open(data_dir()?.join("scheduler.redb"))?;
    let scheduler = Arc::new(Scheduler::new(scheduler_store));

    let runtime = if config.sandbox.container == "podman" {
        ContainerRuntime::Podman
    } else {
        ContainerRuntime::Docker
    };
    let sandbox = Arc::new(Sandbox::with_runtime(config.sandbox.container.clone(), runtime));
    if !sandbox.is_ready().await {
        warn!(container = %config.sandbox.container, "sandbox container not reachable; harness-backed tools will fail");
    }

    let workspaces = Arc::new(WorkspaceManager::new(
        sandbox.clone(),
        config.sandbox.workspace_root.clone(),
        config.workspace_cache_ttl_ms,
        config.git_timeout_ms,
    ));

    let engine = Arc::new(HarnessEngine::new(sandbox.clone()));

    let (tool_events_tx, tool_events_rx) = mpsc::unbounded_channel::<ToolEvent>();

    let task_manager = TaskManager::new(store.clone(), engine, tool_events_tx.clone());
    task_manager.recover_on_start().await?;

    let session = store.get_or_create_session("local")?;
    store.touch_session(&session.id)?;

    let task_port = Arc::new(TaskManagerPort::new(task_manager.clone(), session.id.clone(), config.sandbox.workspace_root.clone()));

    let mut tools = ToolRegistry::new();
    tools.register(WorkspaceListTool::new(workspaces.clone()));
    tools.register(WorkspaceSelectTool::new(workspaces.clone()));
    tools.register(WorkspaceStatusTool::new(workspaces.clone()));
    tools.register(WorkspaceCreateTool::new(workspaces.clone()));
    tools.register(WorkspaceDeleteTool::new(workspaces.clone()));
    tools.register(TaskCreateTool::new(task_port.clone(), "auto"));
    tools.register(TaskCancelTool::new(task_port.clone()));
    tools.register(TaskRespondTool::new(task_port.clone()));
    tools.register(AskUserTool::new(tool_events_tx.clone()));
    tools.register(ReportProgressTool::new(tool_events_tx.clone()));
    let tools = Arc::new(tools);

    let ports = RouterPorts {
        tasks: Arc::new(RouterTaskControl { tasks: task_manager.clone(), store: store.clone() }),
        git: Arc::new(RouterGitUndo { sandbox: sandbox.clone(), workspace_root: config.sandbox.workspace_root.clone() }),
        workspaces: Arc::new(RouterWorkspaceList { workspaces: workspaces.clone() }),
        schedule: Arc::new(RouterSchedule { scheduler: scheduler.clone() }),
    };

    let skills: Vec<fetch_core::Skill> = Vec::new();
    let router = MessageRouter::new(store.clone(), config.as_ref(), default_reflex_registry(), ports, tools.clone(), skills.clone());

    let model = Arc::<dyn fetch_model::ModelProvider>::from(fetch_model::from_config(&config.model)?);
    let runtime_ctx = AgentRuntimeContext {
        workspace_root: Some(std::path::PathBuf::from(&config.sandbox.workspace_root)),
        skills,
        ..Default::default()
    };
    let mut agent = Agent::new(
        thread.to_string(),
        model,
        tools,
        config.clone(),
        runtime_ctx,
        tool_events_rx,
        config.compaction_max_tokens * 4,
    );

    info!(thread, "fetch serving local smoke-test session; reading chat lines from stdin");

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        let replies = router.handle_message("local", &line, &mut agent, None).await?;
        let mut stdout = io::stdout();
        for reply in replies {
            writeln!(stdout, "{reply}")?;
        }
        stdout.flush()?;
    }

    Ok(())
}
