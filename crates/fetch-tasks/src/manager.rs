// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Task Manager + Queue: a single-slot runner (at most one task executing
//! per process) backed by a bounded pending queue. Every transition writes
//! through to [`fetch_store::Store`]; the live harness controller for the
//! current task exists only in memory, per the ownership rule that harness
//! execution is owned by the task but never persisted.
use std::collections::VecDeque;
use std::sync::Arc;

use fetch_harness::{HarnessController, HarnessEngine, HarnessEvent};
use fetch_store::{FilesModified as StoreFilesModified, Store, Task, TaskStatus};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::TaskManagerError;

const MAX_QUEUE_DEPTH: usize = 10;

#[derive(Debug, Clone)]
pub struct QueuedTask {
    pub id: String,
    pub agent: String,
    pub goal: String,
    pub timeout_ms: u64,
    pub cwd: String,
}

pub struct TaskManager {
    store: Arc<Store>,
    engine: Arc<HarnessEngine>,
    tool_events: tokio::sync::mpsc::UnboundedSender<fetch_tools::ToolEvent>,
    current: Mutex<Option<HarnessController>>,
    queue: Mutex<VecDeque<QueuedTask>>,
}

impl TaskManager {
    pub fn new(
        store: Arc<Store>,
        engine: Arc<HarnessEngine>,
        tool_events: tokio::sync::mpsc::UnboundedSender<fetch_tools::ToolEvent>,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            engine,
            tool_events,
            current: Mutex::new(None),
            queue: Mutex::new(VecDeque::new()),
        })
    }

    /// Restart-resume: prune terminal tasks, mark any orphaned non-terminal
    /// task as failed since its child process is gone.
    pub async fn recover_on_start(&self) -> Result<(), TaskManagerError> {
        let pruned = self.store.prune_terminal_tasks()?;
        info!(pruned, "pruned terminal tasks on startup");

        for mut task in self.store.list_nonterminal_tasks()? {
            warn!(task_id = %task.id, "marking orphaned task failed: process restarted");
            task.status = TaskStatus::Failed;
            task.error = Some("process restarted".to_string());
            task.ended_at = Some(fetch_store::now_iso8601());
            self.store.put_task(&task)?;
        }
        Ok(())
    }

    pub async fn create_task(
        &self,
        session_id: &str,
        workspace_id: &str,
        agent: &str,
        goal: &str,
        timeout_ms: u64,
        cwd: &str,
    ) -> Result<Task, TaskManagerError> {
        let id = format!("tsk_{}", nanoid::nanoid!(10));
        let now = fetch_store::now_iso8601();
        let task = Task {
            id: id.clone(),
            session_id: session_id.to_string(),
            goal: goal.to_string(),
            agent: agent.to_string(),
            workspace_id: workspace_id.to_string(),
            status: TaskStatus::Pending,
            created_at: now,
            started_at: None,
            ended_at: None,
            pending_question: None,
            progress_log: Vec::new(),
            files_modified: StoreFilesModified::default(),
            exit_code: None,
            summary: None,
            error: None,
            timeout_ms,
            harness_id: None,
        };
        self.store.put_task(&task)?;

        let mut current = self.current.lock().await;
        if current.is_some() {
            let mut queue = self.queue.lock().await;
            if queue.len() >= MAX_QUEUE_DEPTH {
                return Err(TaskManagerError::QueueFull);
            }
            queue.push_back(QueuedTask {
                id: id.clone(),
                agent: agent.to_string(),
                goal: goal.to_string(),
                timeout_ms,
                cwd: cwd.to_string(),
            });
            return Ok(task);
        }

        self.spawn_now(&mut current, &task.id, agent, goal, timeout_ms, cwd).await?;
        Ok(task)
    }

    async fn spawn_now(
        self: &Arc<Self>,
        current: &mut Option<HarnessController>,
        task_id: &str,
        agent: &str,
        goal: &str,
        timeout_ms: u64,
        cwd: &str,
    ) -> Result<(), TaskManagerError> {
        let handle = self.engine.execute(task_id, agent, goal, cwd, timeout_ms).await?;
        let (events, controller) = handle.split();

        let mut task = self.store.get_task(task_id)?;
        task.status = TaskStatus::Running;
        task.started_at = Some(fetch_store::now_iso8601());
        self.store.put_task(&task)?;

        *current = Some(controller);
        self.pump_events(task_id.to_string(), events);
        Ok(())
    }

    /// Drain harness events for `task_id` into store transitions and
    /// `ToolEvent`s, then advance the queue. Owns the event receiver
    /// directly so this never blocks on `current`'s lock.
    fn pump_events(
        self: &Arc<Self>,
        task_id: String,
        mut events: tokio::sync::mpsc::UnboundedReceiver<HarnessEvent>,
    ) {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if this.apply_event(&task_id, event).await {
                    break;
                }
            }
            this.advance_queue().await;
        });
    }

    async fn apply_event(&self, task_id: &str, event: HarnessEvent) -> bool {
        let mut task = match self.store.get_task(task_id) {
            Ok(t) => t,
            Err(_) => return true,
        };

        let mut terminal = false;
        match event {
            HarnessEvent::Started { .. } => {}
            HarnessEvent::Output(line) => {
                task.push_progress(line);
            }
            HarnessEvent::Progress(message) => {
                task.push_progress(message.clone());
                let _ = self.tool_events.send(fetch_tools::ToolEvent::ProgressReported {
                    task_id: task_id.to_string(),
                    message,
                });
            }
            HarnessEvent::Question(text) => {
                task.status = TaskStatus::WaitingInput;
                task.pending_question = Some(text.clone());
                let _ = self.tool_events.send(fetch_tools::ToolEvent::ProgressReported {
                    task_id: task_id.to_string(),
                    message: format!("question: {text}"),
                });
            }
            HarnessEvent::Completed { exit_code, output: _, files_modified, summary } => {
                task.status = TaskStatus::Completed;
                task.exit_code = Some(exit_code);
                task.files_modified = StoreFilesModified {
                    created: files_modified.created,
                    modified: files_modified.modified,
                    deleted: files_modified.deleted,
                };
                task.summary = Some(summary);
                task.ended_at = Some(fetch_store::now_iso8601());
                terminal = true;
            }
            HarnessEvent::Failed { error } => {
                task.status = TaskStatus::Failed;
                task.error = Some(error);
                task.ended_at = Some(fetch_store::now_iso8601());
                terminal = true;
            }
            HarnessEvent::Cancelled => {
                task.status = TaskStatus::Cancelled;
                task.ended_at = Some(fetch_store::now_iso8601());
                terminal = true;
            }
            HarnessEvent::Timeout => {
                task.status = TaskStatus::TimedOut;
                task.error = Some("no output before timeout".to_string());
                task.ended_at = Some(fetch_store::now_iso8601());
                terminal = true;
            }
        }

        let _ = self.store.put_task(&task);
        terminal
    }

    async fn advance_queue(self: &Arc<Self>) {
        let mut current = self.current.lock().await;
        *current = None;

        let next = self.queue.lock().await.pop_front();
        if let Some(queued) = next {
            if let Err(e) = self
                .spawn_now(&mut current, &queued.id, &queued.agent, &queued.goal, queued.timeout_ms, &queued.cwd)
                .await
            {
                warn!(task_id = %queued.id, error = %e, "failed to dequeue task");
                if let Ok(mut task) = self.store.get_task(&queued.id) {
                    task.status = TaskStatus::Failed;
                    task.error = Some(e.to_string());
                    task.ended_at = Some(fetch_store::now_iso8601());
                    let _ = self.store.put_task(&task);
                }
            }
        }
    }

    /// Id of the task currently occupying the single execution slot, if any.
    pub async fn current_task_id(&self) -> Option<String> {
        self.current.lock().await.as_ref().map(|c| c.task_id.clone())
    }

    pub async fn cancel(&self, task_id: &str) -> Result<(), TaskManagerError> {
        let current = self.current.lock().await;
        if let Some(controller) = current.as_ref() {
            if controller.task_id == task_id {
                controller.cancel();
                drop(current);
                return Ok(());
            }
        }
        drop(current);

        let mut queue = self.queue.lock().await;
        if let Some(pos) = queue.iter().position(|q| q.id == task_id) {
            queue.remove(pos);
            let mut task = self.store.get_task(task_id)?;
            task.status = TaskStatus::Cancelled;
            task.ended_at = Some(fetch_store::now_iso8601());
            self.store.put_task(&task)?;
            Ok(())
        } else {
            Err(TaskManagerError::NotFound(task_id.to_string()))
        }
    }

    pub async fn respond(&self, task_id: &str, text: &str) -> Result<(), TaskManagerError> {
        let mut task = self.store.get_task(task_id)?;
        if task.status != TaskStatus::WaitingInput {
            return Err(TaskManagerError::NotWaiting { task_id: task_id.to_string() });
        }
        let current = self.current.lock().await;
        match current.as_ref() {
            Some(controller) if controller.task_id == task_id => {
                controller.respond(text);
                drop(current);
                task.status = TaskStatus::Running;
                task.pending_question = None;
                self.store.put_task(&task)?;
                Ok(())
            }
            _ => Err(TaskManagerError::NotFound(task_id.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_queue_depth_is_positive() {
        assert!(MAX_QUEUE_DEPTH > 0);
    }
}
