// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Per-entry cache of [`Workspace`] metadata with a TTL, per §5: "the
//! workspace cache is guarded by a per-entry lock; the manager emits an
//! event on mutation so stale readers can invalidate."
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::types::Workspace;

struct Entry {
    workspace: Workspace,
    fetched_at: Instant,
}

pub struct WorkspaceCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, Entry>>,
}

impl WorkspaceCache {
    pub fn new(ttl_ms: u64) -> Self {
        Self { ttl: Duration::from_millis(ttl_ms), entries: Mutex::new(HashMap::new()) }
    }

    pub fn get(&self, id: &str) -> Option<Workspace> {
        let entries = self.entries.lock().unwrap();
        entries.get(id).and_then(|e| {
            if e.fetched_at.elapsed() < self.ttl {
                Some(e.workspace.clone())
            } else {
                None
            }
        })
    }

    pub fn put(&self, workspace: Workspace) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(workspace.id.clone(), Entry { workspace, fetched_at: Instant::now() });
    }

    pub fn invalidate(&self, id: &str) {
        self.entries.lock().unwrap().remove(id);
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProjectType;

    fn ws(id: &str) -> Workspace {
        Workspace { id: id.into(), path: format!("/workspace/{id}"), project_type: ProjectType::Unknown, git_status: None, is_active: false }
    }

    #[test]
    fn put_then_get_returns_entry_within_ttl() {
        let cache = WorkspaceCache::new(60_000);
        cache.put(ws("a"));
        assert!(cache.get("a").is_some());
    }

    #[test]
    fn expired_entry_is_not_returned() {
        let cache = WorkspaceCache::new(0);
        cache.put(ws("a"));
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get("a").is_none());
    }

    #[test]
    fn invalidate_removes_entry() {
        let cache = WorkspaceCache::new(60_000);
        cache.put(ws("a"));
        cache.invalidate("a");
        assert!(cache.get("a").is_none());
    }
}
