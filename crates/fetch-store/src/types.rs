// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use fetch_config::AgentMode;
use fetch_model::Role;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Autonomy {
    Manual,
    Guided,
    Full,
}

impl Default for Autonomy {
    fn default() -> Self {
        Autonomy::Guided
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub autonomy: Autonomy,
    pub verbose: bool,
    pub auto_commit: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingApproval {
    pub tool_name: String,
    pub args: serde_json::Value,
    pub description: String,
    pub diff: Option<String>,
}

/// Durable per-user session. Owns threads (which own messages) and tracks
/// the single active task, if any. Created on first message; never deleted
/// — `/clear` wipes messages and active files but keeps the row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub created_at: String,
    pub last_activity_at: String,
    pub preferences: Preferences,
    pub active_workspace_id: Option<String>,
    pub active_task_id: Option<String>,
    pub pending_approval: Option<PendingApproval>,
    pub active_thread_id: String,
    pub git_start_commit: Option<String>,
    pub active_files: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreadStatus {
    Active,
    Paused,
    Archived,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    pub session_id: String,
    pub title: String,
    pub status: ThreadStatus,
    pub created_at: String,
    pub updated_at: String,
    pub summary: Option<String>,
}

/// A single stored chat message. Append-only; ordered by `timestamp` within
/// a thread (enforced by [`crate::Store::add_message`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: String,
    pub thread_id: String,
    pub role: Role,
    pub content: String,
    pub tool_call_id: Option<String>,
    pub name: Option<String>,
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    WaitingInput,
    Completed,
    Failed,
    Cancelled,
    TimedOut,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Completed
                | TaskStatus::Failed
                | TaskStatus::Cancelled
                | TaskStatus::TimedOut
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilesModified {
    pub created: Vec<String>,
    pub modified: Vec<String>,
    pub deleted: Vec<String>,
}

/// A coding job delegated to a single harness execution. Mutated only by
/// the Task Manager and the Harness Engine; the progress log is a bounded
/// ring of at most 100 entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub session_id: String,
    pub goal: String,
    pub agent: String,
    pub workspace_id: String,
    pub status: TaskStatus,
    pub created_at: String,
    pub started_at: Option<String>,
    pub ended_at: Option<String>,
    pub pending_question: Option<String>,
    pub progress_log: Vec<String>,
    pub files_modified: FilesModified,
    pub exit_code: Option<i32>,
    pub summary: Option<String>,
    pub error: Option<String>,
    pub timeout_ms: u64,
    pub harness_id: Option<String>,
}

pub const MAX_PROGRESS_LOG_ENTRIES: usize = 100;

impl Task {
    /// Append to the progress ring, evicting the oldest entry once full.
    pub fn push_progress(&mut self, entry: impl Into<String>) {
        if self.progress_log.len() >= MAX_PROGRESS_LOG_ENTRIES {
            self.progress_log.remove(0);
        }
        self.progress_log.push(entry.into());
    }
}

/// Singleton mode row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeRecord {
    pub mode: AgentMode,
    pub since: String,
    pub previous: Option<AgentMode>,
    pub transition_count: u64,
}

impl Default for ModeRecord {
    fn default() -> Self {
        Self {
            mode: AgentMode::default(),
            since: crate::now_iso8601(),
            previous: None,
            transition_count: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_progress_ring_evicts_oldest_when_full() {
        let mut task = Task {
            id: "tsk_1".into(),
            session_id: "ses_1".into(),
            goal: "g".into(),
            agent: "auto".into(),
            workspace_id: "ws_1".into(),
            status: TaskStatus::Running,
            created_at: "now".into(),
            started_at: None,
            ended_at: None,
            pending_question: None,
            progress_log: Vec::new(),
            files_modified: FilesModified::default(),
            exit_code: None,
            summary: None,
            error: None,
            timeout_ms: 300_000,
            harness_id: None,
        };
        for i in 0..(MAX_PROGRESS_LOG_ENTRIES + 5) {
            task.push_progress(format!("step {i}"));
        }
        assert_eq!(task.progress_log.len(), MAX_PROGRESS_LOG_ENTRIES);
        assert_eq!(task.progress_log[0], "step 5");
    }

    #[test]
    fn terminal_statuses_are_recognized() {
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
        assert!(TaskStatus::Cancelled.is_terminal());
        assert!(TaskStatus::TimedOut.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::WaitingInput.is_terminal());
    }
}
