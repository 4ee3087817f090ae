// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! The Harness Execution Engine: spawns a CLI child inside the sandbox for
//! one task, streams its output through an [`OutputParser`], pauses on
//! questions, and enforces the timeout/kill policy.
use std::sync::Arc;
use std::time::Duration;

use fetch_sandbox::{Sandbox, SpawnOptions};
use tokio::io::AsyncBufReadExt;
use tokio::sync::{mpsc, Mutex};

use crate::adapter::HarnessAdapter;
use crate::error::HarnessError;
use crate::events::{HarnessEvent, ParsedEvent};
use crate::parser::OutputParser;
use crate::registry::AdapterRegistry;

const KILL_GRACE_PERIOD: Duration = Duration::from_secs(2);

/// A live harness run. The caller drains `events` for lifecycle updates and
/// calls `respond`/`cancel` to drive it.
pub struct HarnessHandle {
    pub task_id: String,
    pub events: mpsc::UnboundedReceiver<HarnessEvent>,
    stdin_tx: mpsc::UnboundedSender<StdinCommand>,
}

enum StdinCommand {
    Respond(String),
    Cancel,
}

impl HarnessHandle {
    /// Write `adapter.formatResponse(text)` to the child's stdin and resume
    /// event dispatch.
    pub fn respond(&self, text: &str) {
        let _ = self.stdin_tx.send(StdinCommand::Respond(text.to_string()));
    }

    /// Terminate gracefully then forcibly after the grace period.
    pub fn cancel(&self) {
        let _ = self.stdin_tx.send(StdinCommand::Cancel);
    }

    /// Split into the event receiver (to be drained directly by a pump loop,
    /// without holding any lock across the `.await`) and a cheaply clonable
    /// [`HarnessController`] for sending `respond`/`cancel` commands.
    pub fn split(self) -> (mpsc::UnboundedReceiver<HarnessEvent>, HarnessController) {
        (self.events, HarnessController { task_id: self.task_id, stdin_tx: self.stdin_tx })
    }
}

/// A clonable handle for driving a harness run without holding its event
/// receiver.
#[derive(Clone)]
pub struct HarnessController {
    pub task_id: String,
    stdin_tx: mpsc::UnboundedSender<StdinCommand>,
}

impl HarnessController {
    pub fn respond(&self, text: &str) {
        let _ = self.stdin_tx.send(StdinCommand::Respond(text.to_string()));
    }

    pub fn cancel(&self) {
        let _ = self.stdin_tx.send(StdinCommand::Cancel);
    }
}

pub struct HarnessEngine {
    sandbox: Arc<Sandbox>,
    registry: Arc<AdapterRegistry>,
}

impl HarnessEngine {
    pub fn new(sandbox: Arc<Sandbox>) -> Self {
        Self { sandbox, registry: Arc::new(AdapterRegistry::default()) }
    }

    /// Spawn `agent` against `goal` in `cwd`, returning a handle streaming
    /// lifecycle events back to the caller (usually the Task Manager).
    pub async fn execute(
        &self,
        task_id: &str,
        agent: &str,
        goal: &str,
        cwd: &str,
        timeout_ms: u64,
    ) -> Result<HarnessHandle, HarnessError> {
        let adapter = self.registry.resolve(agent)?;
        let config = adapter.build_config(goal, cwd, timeout_ms);

        let mut process = self
            .sandbox
            .spawn(
                &config.command,
                &config.args,
                SpawnOptions { cwd: Some(config.cwd.clone()), env: config.env.clone() },
            )
            .await?;

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (stdin_tx, mut stdin_rx) = mpsc::unbounded_channel::<StdinCommand>();

        let _ = event_tx.send(HarnessEvent::Started { task_id: task_id.to_string() });

        let timeout = Duration::from_millis(timeout_ms);
        let parser = Arc::new(Mutex::new(OutputParser::new()));
        let paused = Arc::new(std::sync::atomic::AtomicBool::new(false));

        tokio::spawn(async move {
            let mut stdout_lines = process.stdout.take().expect("stdout piped").lines();
            let mut stderr_lines = process.stderr.take().expect("stderr piped").lines();
            let mut all_events: Vec<ParsedEvent> = Vec::new();

            loop {
                tokio::select! {
                    line = stdout_lines.next_line() => {
                        match line {
                            Ok(Some(l)) => {
                                handle_line(&l, &adapter, &parser, &paused, &event_tx, &mut all_events).await;
                                if paused.load(std::sync::atomic::Ordering::Relaxed) {
                                    if drain_until_resume(&mut stdin_rx, &mut process, &adapter, &paused).await {
                                        let _ = event_tx.send(HarnessEvent::Cancelled);
                                        return;
                                    }
                                }
                            }
                            Ok(None) => break,
                            Err(_) => break,
                        }
                    }
                    line = stderr_lines.next_line() => {
                        if let Ok(Some(l)) = line {
                            handle_line(&l, &adapter, &parser, &paused, &event_tx, &mut all_events).await;
                        }
                    }
                    cmd = stdin_rx.recv() => {
                        match cmd {
                            Some(StdinCommand::Cancel) => {
                                kill_with_grace(&mut process).await;
                                let _ = event_tx.send(HarnessEvent::Cancelled);
                                return;
                            }
                            Some(StdinCommand::Respond(_)) => {} // no question pending; ignore
                            None => {}
                        }
                    }
                    _ = tokio::time::sleep(timeout) => {
                        kill_with_grace(&mut process).await;
                        let _ = event_tx.send(HarnessEvent::Timeout);
                        return;
                    }
                }
            }

            let mut parser_guard = parser.lock().await;
            let tail = parser_guard.finish(adapter.as_ref());
            drop(parser_guard);
            all_events.extend(tail);

            let status = process.child.wait().await;
            let files_modified = adapter.extract_file_operations(&all_events);
            let full_output = parser.lock().await.rolling_buffer().to_string();
            let summary = adapter.extract_summary(&full_output);

            match status {
                Ok(exit_status) if exit_status.success() => {
                    let _ = event_tx.send(HarnessEvent::Completed {
                        exit_code: 0,
                        output: full_output,
                        files_modified,
                        summary,
                    });
                }
                Ok(exit_status) => {
                    let code = exit_status.code().unwrap_or(-1);
                    let stderr_tail = tail_lines(&full_output, 20);
                    let _ = event_tx.send(HarnessEvent::Failed {
                        error: format!("exit {code}: {stderr_tail}"),
                    });
                }
                Err(e) => {
                    let _ = event_tx.send(HarnessEvent::Failed { error: e.to_string() });
                }
            }
        });

        Ok(HarnessHandle { task_id: task_id.to_string(), events: event_rx, stdin_tx })
    }
}

async fn handle_line(
    line: &str,
    adapter: &Arc<dyn HarnessAdapter>,
    parser: &Arc<Mutex<OutputParser>>,
    paused: &Arc<std::sync::atomic::AtomicBool>,
    event_tx: &mpsc::UnboundedSender<HarnessEvent>,
    all_events: &mut Vec<ParsedEvent>,
) {
    let events = {
        let mut guard = parser.lock().await;
        guard.feed(&format!("{line}\n"), adapter.as_ref())
    };
    for ev in events {
        match &ev {
            ParsedEvent::Line(l) => {
                let _ = event_tx.send(HarnessEvent::Output(l.clone()));
            }
            ParsedEvent::Progress(p) => {
                let _ = event_tx.send(HarnessEvent::Progress(p.clone()));
            }
            ParsedEvent::Question(q) => {
                paused.store(true, std::sync::atomic::Ordering::Relaxed);
                let _ = event_tx.send(HarnessEvent::Question(q.clone()));
            }
            ParsedEvent::Error(e) => {
                let _ = event_tx.send(HarnessEvent::Failed { error: e.clone() });
            }
            ParsedEvent::FileOp { .. } | ParsedEvent::Complete => {}
        }
        all_events.push(ev);
    }
}

/// While paused on a question, block reading further stdout/stderr and wait
/// only for a `respond`/`cancel` command. Returns `true` if cancelled, so the
/// caller can emit a single `Cancelled` event and stop the pump loop.
async fn drain_until_resume(
    stdin_rx: &mut mpsc::UnboundedReceiver<StdinCommand>,
    process: &mut fetch_sandbox::SpawnedProcess,
    adapter: &Arc<dyn HarnessAdapter>,
    paused: &Arc<std::sync::atomic::AtomicBool>,
) -> bool {
    while let Some(cmd) = stdin_rx.recv().await {
        match cmd {
            StdinCommand::Respond(text) => {
                let bytes = adapter.format_response(&text);
                if let Some(stdin) = process.stdin.as_mut() {
                    use tokio::io::AsyncWriteExt;
                    let _ = stdin.write_all(&bytes).await;
                    let _ = stdin.flush().await;
                }
                paused.store(false, std::sync::atomic::Ordering::Relaxed);
                return false;
            }
            StdinCommand::Cancel => {
                kill_with_grace(process).await;
                return true;
            }
        }
    }
    false
}

async fn kill_with_grace(process: &mut fetch_sandbox::SpawnedProcess) {
    #[cfg(unix)]
    if let Some(pid) = process.child.id() {
        unsafe {
            libc::kill(pid as i32, libc::SIGTERM);
        }
        tokio::time::sleep(KILL_GRACE_PERIOD).await;
    }
    let _ = process.kill().await;
}

fn tail_lines(full_output: &str, n: usize) -> String {
    full_output.lines().rev().take(n).collect::<Vec<_>>().into_iter().rev().collect::<Vec<_>>().join("\n")
}
