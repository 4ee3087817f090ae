// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Durable store for sessions, threads, messages, tasks, and mode state,
//! backed by a single embedded `redb::Database`.
//!
//! Concurrency model: redb itself allows only one write transaction in
//! flight at a time (the "single-writer serialized write queue" of the
//! spec falls directly out of that), while readers proceed concurrently
//! under snapshot isolation. No additional locking is layered on top.
use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use crate::error::StoreError;
use crate::types::{ModeRecord, Session, StoredMessage, Task, Thread};

const SESSIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("sessions");
const THREADS: TableDefinition<&str, &[u8]> = TableDefinition::new("threads");
const MESSAGES: TableDefinition<&str, &[u8]> = TableDefinition::new("messages");
const TASKS: TableDefinition<&str, &[u8]> = TableDefinition::new("tasks");
const MODE: TableDefinition<&str, &[u8]> = TableDefinition::new("mode");

const MODE_SINGLETON_KEY: &str = "mode";

pub fn now_iso8601() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Durable store handle. Cheap to clone (wraps `Arc<Database>`).
#[derive(Clone)]
pub struct Store {
    db: Arc<Database>,
}

impl Store {
    /// Open (or create) the database at `path`, running the schema
    /// migration hook (table creation) on open.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = Database::create(path)?;
        Self::from_database(db)
    }

    /// In-memory database, for tests and local smoke runs.
    pub fn in_memory() -> Result<Self, StoreError> {
        let db = Database::builder()
            .create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::from_database(db)
    }

    fn from_database(db: Database) -> Result<Self, StoreError> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(SESSIONS)?;
        write_txn.open_table(THREADS)?;
        write_txn.open_table(MESSAGES)?;
        write_txn.open_table(TASKS)?;
        write_txn.open_table(MODE)?;
        write_txn.commit()?;
        Ok(Self { db: Arc::new(db) })
    }

    fn put_json<T: serde::Serialize>(
        &self,
        table: TableDefinition<&str, &[u8]>,
        key: &str,
        value: &T,
    ) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(value)
            .map_err(|source| StoreError::Corrupt { id: key.to_string(), source })?;
        let write_txn = self.db.begin_write()?;
        {
            let mut t = write_txn.open_table(table)?;
            t.insert(key, bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        table: TableDefinition<&str, &[u8]>,
        key: &str,
    ) -> Result<Option<T>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let t = read_txn.open_table(table)?;
        match t.get(key)? {
            Some(value) => {
                let parsed = serde_json::from_slice(value.value())
                    .map_err(|source| StoreError::Corrupt { id: key.to_string(), source })?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }

    fn list_json<T: serde::de::DeserializeOwned>(
        &self,
        table: TableDefinition<&str, &[u8]>,
    ) -> Result<Vec<T>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let t = read_txn.open_table(table)?;
        let mut out = Vec::new();
        for item in t.iter()? {
            let (key, value) = item?;
            let parsed = serde_json::from_slice(value.value())
                .map_err(|source| StoreError::Corrupt { id: key.value().to_string(), source })?;
            out.push(parsed);
        }
        Ok(out)
    }

    // ── Sessions ─────────────────────────────────────────────────────────

    /// Fetch the session for `user_id`, creating one (with a fresh thread)
    /// on first contact.
    pub fn get_or_create_session(&self, user_id: &str) -> Result<Session, StoreError> {
        let sessions = self.list_json::<Session>(SESSIONS)?;
        if let Some(existing) = sessions.into_iter().find(|s| s.user_id == user_id) {
            return Ok(existing);
        }

        let now = now_iso8601();
        let thread_id = format!("thr_{}", nanoid::nanoid!(8));
        let session = Session {
            id: format!("ses_{}", nanoid::nanoid!(8)),
            user_id: user_id.to_string(),
            created_at: now.clone(),
            last_activity_at: now.clone(),
            preferences: Default::default(),
            active_workspace_id: None,
            active_task_id: None,
            pending_approval: None,
            active_thread_id: thread_id.clone(),
            git_start_commit: None,
            active_files: Vec::new(),
        };
        self.put_json(SESSIONS, &session.id, &session)?;

        let thread = Thread {
            id: thread_id,
            session_id: session.id.clone(),
            title: "New conversation".to_string(),
            status: crate::types::ThreadStatus::Active,
            created_at: now.clone(),
            updated_at: now,
            summary: None,
        };
        self.put_json(THREADS, &thread.id, &thread)?;

        Ok(session)
    }

    pub fn get_session(&self, session_id: &str) -> Result<Session, StoreError> {
        self.get_json(SESSIONS, session_id)?
            .ok_or_else(|| StoreError::NotFound(session_id.to_string()))
    }

    pub fn update_session(&self, session: &Session) -> Result<(), StoreError> {
        self.put_json(SESSIONS, &session.id, session)
    }

    pub fn touch_session(&self, session_id: &str) -> Result<(), StoreError> {
        let mut session = self.get_session(session_id)?;
        session.last_activity_at = now_iso8601();
        self.update_session(&session)
    }

    pub fn set_pending_approval(
        &self,
        session_id: &str,
        approval: Option<crate::types::PendingApproval>,
    ) -> Result<(), StoreError> {
        let mut session = self.get_session(session_id)?;
        session.pending_approval = approval;
        self.update_session(&session)
    }

    pub fn add_active_file(&self, session_id: &str, path: &str) -> Result<(), StoreError> {
        let mut session = self.get_session(session_id)?;
        if !session.active_files.iter().any(|f| f == path) {
            session.active_files.push(path.to_string());
        }
        self.update_session(&session)
    }

    pub fn remove_active_file(&self, session_id: &str, path: &str) -> Result<(), StoreError> {
        let mut session = self.get_session(session_id)?;
        session.active_files.retain(|f| f != path);
        self.update_session(&session)
    }

    pub fn set_git_start_commit(&self, session_id: &str, commit: &str) -> Result<(), StoreError> {
        let mut session = self.get_session(session_id)?;
        session.git_start_commit = Some(commit.to_string());
        self.update_session(&session)
    }

    /// `/clear`: wipe the active thread's messages and the session's active
    /// files, but keep the session and thread rows themselves.
    pub fn clear_active_thread(&self, session_id: &str) -> Result<(), StoreError> {
        let session = self.get_session(session_id)?;
        let read_txn = self.db.begin_read()?;
        let ids: Vec<String> = {
            let t = read_txn.open_table(MESSAGES)?;
            t.iter()?
                .filter_map(|item| {
                    let (key, value) = item.ok()?;
                    let msg: StoredMessage = serde_json::from_slice(value.value()).ok()?;
                    (msg.thread_id == session.active_thread_id).then(|| key.value().to_string())
                })
                .collect()
        };
        drop(read_txn);

        let write_txn = self.db.begin_write()?;
        {
            let mut t = write_txn.open_table(MESSAGES)?;
            for id in &ids {
                t.remove(id.as_str())?;
            }
        }
        write_txn.commit()?;

        let mut session = session;
        session.active_files.clear();
        self.update_session(&session)
    }

    // ── Threads ──────────────────────────────────────────────────────────

    pub fn create_thread(&self, session_id: &str, title: &str) -> Result<Thread, StoreError> {
        let now = now_iso8601();
        let thread = Thread {
            id: format!("thr_{}", nanoid::nanoid!(8)),
            session_id: session_id.to_string(),
            title: title.to_string(),
            status: crate::types::ThreadStatus::Active,
            created_at: now.clone(),
            updated_at: now,
            summary: None,
        };
        self.put_json(THREADS, &thread.id, &thread)?;
        Ok(thread)
    }

    pub fn get_thread(&self, thread_id: &str) -> Result<Thread, StoreError> {
        self.get_json(THREADS, thread_id)?
            .ok_or_else(|| StoreError::NotFound(thread_id.to_string()))
    }

    pub fn update_thread(&self, thread: &Thread) -> Result<(), StoreError> {
        self.put_json(THREADS, &thread.id, thread)
    }

    pub fn list_threads(&self, session_id: &str) -> Result<Vec<Thread>, StoreError> {
        let mut all = self.list_json::<Thread>(THREADS)?;
        all.retain(|t| t.session_id == session_id);
        Ok(all)
    }

    // ── Messages ─────────────────────────────────────────────────────────

    /// Append a message to `thread_id`. Enforces the append-only,
    /// strictly-monotonic-timestamp invariant by stamping the current time
    /// whenever the caller hasn't already set one later than the thread's
    /// last message.
    pub fn add_message(
        &self,
        thread_id: &str,
        role: fetch_model::Role,
        content: impl Into<String>,
        tool_call_id: Option<String>,
        name: Option<String>,
    ) -> Result<StoredMessage, StoreError> {
        let msg = StoredMessage {
            id: format!("msg_{}", nanoid::nanoid!(10)),
            thread_id: thread_id.to_string(),
            role,
            content: content.into(),
            tool_call_id,
            name,
            timestamp: now_iso8601(),
        };
        self.put_json(MESSAGES, &msg.id, &msg)?;
        Ok(msg)
    }

    /// Most recent `limit` messages for `thread_id`, oldest first.
    pub fn get_recent_messages(
        &self,
        thread_id: &str,
        limit: usize,
    ) -> Result<Vec<StoredMessage>, StoreError> {
        let mut all = self.list_json::<StoredMessage>(MESSAGES)?;
        all.retain(|m| m.thread_id == thread_id);
        all.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        if all.len() > limit {
            let drop = all.len() - limit;
            all.drain(0..drop);
        }
        Ok(all)
    }

    // ── Tasks ────────────────────────────────────────────────────────────

    pub fn put_task(&self, task: &Task) -> Result<(), StoreError> {
        self.put_json(TASKS, &task.id, task)
    }

    pub fn get_task(&self, task_id: &str) -> Result<Task, StoreError> {
        self.get_json(TASKS, task_id)?
            .ok_or_else(|| StoreError::NotFound(task_id.to_string()))
    }

    pub fn list_tasks(&self, session_id: &str) -> Result<Vec<Task>, StoreError> {
        let mut all = self.list_json::<Task>(TASKS)?;
        all.retain(|t| t.session_id == session_id);
        Ok(all)
    }

    /// Tasks left in a non-terminal state, e.g. because the process was
    /// killed mid-run. Used by the restart-resume recovery path.
    pub fn list_nonterminal_tasks(&self) -> Result<Vec<Task>, StoreError> {
        let all = self.list_json::<Task>(TASKS)?;
        Ok(all.into_iter().filter(|t| !t.status.is_terminal()).collect())
    }

    /// Drop tasks already in a terminal state, keeping the store from
    /// growing unboundedly across restarts.
    pub fn prune_terminal_tasks(&self) -> Result<usize, StoreError> {
        let all = self.list_json::<Task>(TASKS)?;
        let terminal_ids: Vec<String> = all
            .into_iter()
            .filter(|t| t.status.is_terminal())
            .map(|t| t.id)
            .collect();
        let write_txn = self.db.begin_write()?;
        {
            let mut t = write_txn.open_table(TASKS)?;
            for id in &terminal_ids {
                t.remove(id.as_str())?;
            }
        }
        write_txn.commit()?;
        Ok(terminal_ids.len())
    }

    // ── Mode ─────────────────────────────────────────────────────────────

    pub fn get_mode(&self) -> Result<ModeRecord, StoreError> {
        Ok(self
            .get_json(MODE, MODE_SINGLETON_KEY)?
            .unwrap_or_default())
    }

    pub fn set_mode(&self, record: &ModeRecord) -> Result<(), StoreError> {
        self.put_json(MODE, MODE_SINGLETON_KEY, record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FilesModified, TaskStatus};
    use fetch_model::Role;

    fn store() -> Store {
        Store::in_memory().unwrap()
    }

    #[test]
    fn get_or_create_session_is_idempotent_per_user() {
        let s = store();
        let a = s.get_or_create_session("alice").unwrap();
        let b = s.get_or_create_session("alice").unwrap();
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn different_users_get_different_sessions() {
        let s = store();
        let a = s.get_or_create_session("alice").unwrap();
        let b = s.get_or_create_session("bob").unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn add_message_and_get_recent_preserves_order() {
        let s = store();
        let session = s.get_or_create_session("alice").unwrap();
        s.add_message(&session.active_thread_id, Role::User, "one", None, None)
            .unwrap();
        s.add_message(&session.active_thread_id, Role::Assistant, "two", None, None)
            .unwrap();
        let recent = s.get_recent_messages(&session.active_thread_id, 10).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].content, "one");
        assert_eq!(recent[1].content, "two");
    }

    #[test]
    fn get_recent_messages_respects_limit() {
        let s = store();
        let session = s.get_or_create_session("alice").unwrap();
        for i in 0..5 {
            s.add_message(&session.active_thread_id, Role::User, format!("m{i}"), None, None)
                .unwrap();
        }
        let recent = s.get_recent_messages(&session.active_thread_id, 2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].content, "m3");
        assert_eq!(recent[1].content, "m4");
    }

    #[test]
    fn set_pending_approval_round_trips() {
        let s = store();
        let session = s.get_or_create_session("alice").unwrap();
        s.set_pending_approval(
            &session.id,
            Some(crate::types::PendingApproval {
                tool_name: "workspace_delete".into(),
                args: serde_json::json!({"id": "ws_1"}),
                description: "delete ws_1".into(),
                diff: None,
            }),
        )
        .unwrap();
        let reloaded = s.get_session(&session.id).unwrap();
        assert!(reloaded.pending_approval.is_some());
    }

    #[test]
    fn active_file_add_and_remove() {
        let s = store();
        let session = s.get_or_create_session("alice").unwrap();
        s.add_active_file(&session.id, "src/lib.rs").unwrap();
        s.add_active_file(&session.id, "src/lib.rs").unwrap(); // dedup
        let reloaded = s.get_session(&session.id).unwrap();
        assert_eq!(reloaded.active_files, vec!["src/lib.rs".to_string()]);

        s.remove_active_file(&session.id, "src/lib.rs").unwrap();
        let reloaded = s.get_session(&session.id).unwrap();
        assert!(reloaded.active_files.is_empty());
    }

    #[test]
    fn clear_active_thread_wipes_messages_and_files() {
        let s = store();
        let session = s.get_or_create_session("alice").unwrap();
        s.add_message(&session.active_thread_id, Role::User, "hi", None, None)
            .unwrap();
        s.add_active_file(&session.id, "a.rs").unwrap();

        s.clear_active_thread(&session.id).unwrap();

        let recent = s.get_recent_messages(&session.active_thread_id, 10).unwrap();
        assert!(recent.is_empty());
        let reloaded = s.get_session(&session.id).unwrap();
        assert!(reloaded.active_files.is_empty());
    }

    #[test]
    fn task_round_trip_and_listing() {
        let s = store();
        let session = s.get_or_create_session("alice").unwrap();
        let task = Task {
            id: "tsk_1".into(),
            session_id: session.id.clone(),
            goal: "add readme".into(),
            agent: "auto".into(),
            workspace_id: "ws_1".into(),
            status: TaskStatus::Running,
            created_at: now_iso8601(),
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
        s.put_task(&task).unwrap();
        let reloaded = s.get_task("tsk_1").unwrap();
        assert_eq!(reloaded.goal, "add readme");
        assert_eq!(s.list_tasks(&session.id).unwrap().len(), 1);
        assert_eq!(s.list_nonterminal_tasks().unwrap().len(), 1);
    }

    #[test]
    fn prune_terminal_tasks_removes_only_terminal() {
        let s = store();
        let session = s.get_or_create_session("alice").unwrap();
        let make = |id: &str, status: TaskStatus| Task {
            id: id.into(),
            session_id: session.id.clone(),
            goal: "g".into(),
            agent: "auto".into(),
            workspace_id: "ws_1".into(),
            status,
            created_at: now_iso8601(),
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
        s.put_task(&make("tsk_done", TaskStatus::Completed)).unwrap();
        s.put_task(&make("tsk_live", TaskStatus::Running)).unwrap();

        let pruned = s.prune_terminal_tasks().unwrap();
        assert_eq!(pruned, 1);
        assert!(s.get_task("tsk_done").is_err());
        assert!(s.get_task("tsk_live").is_ok());
    }

    #[test]
    fn mode_defaults_to_listening_and_round_trips() {
        let s = store();
        let initial = s.get_mode().unwrap();
        assert_eq!(initial.mode, fetch_config::AgentMode::Listening);

        let updated = ModeRecord {
            mode: fetch_config::AgentMode::Working,
            since: now_iso8601(),
            previous: Some(fetch_config::AgentMode::Listening),
            transition_count: 1,
        };
        s.set_mode(&updated).unwrap();
        assert_eq!(s.get_mode().unwrap().mode, fetch_config::AgentMode::Working);
    }
}
