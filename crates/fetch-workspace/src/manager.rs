// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! The Workspace Manager: discovers project directories under the sandbox
//! workspace root, detects project type, reports git status, and can
//! scaffold or delete a workspace.
use std::sync::{Arc, Mutex};

use fetch_sandbox::{ExecOptions, Sandbox};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::info;

use crate::cache::WorkspaceCache;
use crate::detect::detect_project_type;
use crate::error::WorkspaceError;
use crate::git::fetch_git_status;
use crate::types::{ProjectType, Workspace};

static VALID_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").unwrap());

pub struct WorkspaceManager {
    sandbox: Arc<Sandbox>,
    root: String,
    git_timeout_ms: u64,
    cache: WorkspaceCache,
    active_id: Mutex<Option<String>>,
}

impl WorkspaceManager {
    pub fn new(sandbox: Arc<Sandbox>, root: impl Into<String>, cache_ttl_ms: u64, git_timeout_ms: u64) -> Self {
        Self {
            sandbox,
            root: root.into(),
            git_timeout_ms,
            cache: WorkspaceCache::new(cache_ttl_ms),
            active_id: Mutex::new(None),
        }
    }

    fn validate_name(name: &str) -> Result<(), WorkspaceError> {
        if VALID_NAME.is_match(name) {
            Ok(())
        } else {
            Err(WorkspaceError::InvalidName(name.to_string()))
        }
    }

    fn path_for(&self, id: &str) -> String {
        format!("{}/{id}", self.root)
    }

    fn is_active(&self, id: &str) -> bool {
        self.active_id.lock().unwrap().as_deref() == Some(id)
    }

    async fn discover_names(&self) -> Result<Vec<String>, WorkspaceError> {
        let args = [
            self.root.clone(),
            "-mindepth".to_string(),
            "1".to_string(),
            "-maxdepth".to_string(),
            "1".to_string(),
            "-type".to_string(),
            "d".to_string(),
            "-printf".to_string(),
            "%f\\n".to_string(),
        ];
        let result = self.sandbox.exec("find", &args, ExecOptions::default()).await?;
        if result.exit_code != 0 {
            return Err(WorkspaceError::Command(result.stderr));
        }
        Ok(result.stdout.lines().filter(|l| !l.is_empty()).map(str::to_string).collect())
    }

    async fn load(&self, id: &str) -> Workspace {
        let path = self.path_for(id);
        let project_type = detect_project_type(&self.sandbox, &path).await;
        let git_status = fetch_git_status(&self.sandbox, &path, self.git_timeout_ms).await;
        Workspace { id: id.to_string(), path, project_type, git_status, is_active: self.is_active(id) }
    }

    /// List all workspaces under the sandbox root. Cached entries are reused
    /// unless `force_refresh` is set or the TTL has expired.
    pub async fn list(&self, force_refresh: bool) -> Result<Vec<Workspace>, WorkspaceError> {
        if force_refresh {
            self.cache.clear();
        }
        let names = self.discover_names().await?;
        let mut workspaces = Vec::with_capacity(names.len());
        for name in names {
            if let Some(cached) = self.cache.get(&name) {
                workspaces.push(cached);
                continue;
            }
            let workspace = self.load(&name).await;
            self.cache.put(workspace.clone());
            workspaces.push(workspace);
        }
        Ok(workspaces)
    }

    pub async fn select(&self, id: &str) -> Result<Workspace, WorkspaceError> {
        let workspace = self.get_status(Some(id)).await?;
        *self.active_id.lock().unwrap() = Some(id.to_string());
        self.cache.invalidate(id);
        info!(workspace_id = id, "workspace:selected");
        Ok(Workspace { is_active: true, ..workspace })
    }

    /// Status for `id`, or the active workspace if `id` is `None`.
    pub async fn get_status(&self, id: Option<&str>) -> Result<Workspace, WorkspaceError> {
        let id = match id {
            Some(id) => id.to_string(),
            None => self.active_id.lock().unwrap().clone().ok_or_else(|| WorkspaceError::NotFound("<active>".to_string()))?,
        };
        if !self.discover_names().await?.contains(&id) {
            return Err(WorkspaceError::NotFound(id));
        }
        let workspace = self.load(&id).await;
        self.cache.put(workspace.clone());
        Ok(workspace)
    }

    /// Scaffold a new workspace. `repo_url` present clones that repository;
    /// absent, an empty directory with `git init` is created.
    pub async fn create(&self, name: &str, repo_url: Option<&str>) -> Result<Workspace, WorkspaceError> {
        Self::validate_name(name)?;
        let path = self.path_for(name);

        if let Some(url) = repo_url {
            let result = self
                .sandbox
                .exec("git", &["clone".to_string(), url.to_string(), path.clone()], ExecOptions::default())
                .await?;
            if result.exit_code != 0 {
                return Err(WorkspaceError::Command(result.stderr));
            }
        } else {
            let mkdir = self.sandbox.exec("mkdir", &["-p".to_string(), path.clone()], ExecOptions::default()).await?;
            if mkdir.exit_code != 0 {
                return Err(WorkspaceError::Command(mkdir.stderr));
            }
            let opts = ExecOptions { cwd: Some(path.clone()), ..Default::default() };
            let init = self.sandbox.exec("git", &["init".to_string()], opts).await?;
            if init.exit_code != 0 {
                return Err(WorkspaceError::Command(init.stderr));
            }
        }

        info!(workspace_id = name, cloned = repo_url.is_some(), "workspace:created");
        let workspace = self.load(name).await;
        self.cache.put(workspace.clone());
        Ok(workspace)
    }

    pub async fn delete(&self, id: &str) -> Result<(), WorkspaceError> {
        if self.is_active(id) {
            return Err(WorkspaceError::ActiveWorkspace(id.to_string()));
        }
        let path = self.path_for(id);
        let result = self.sandbox.exec("rm", &["-rf".to_string(), path], ExecOptions::default()).await?;
        if result.exit_code != 0 {
            return Err(WorkspaceError::Command(result.stderr));
        }
        self.cache.invalidate(id);
        info!(workspace_id = id, "workspace:deleted");
        Ok(())
    }
}

pub fn project_type_label(kind: ProjectType) -> &'static str {
    kind.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_validation_rejects_leading_dot() {
        assert!(WorkspaceManager::validate_name(".hidden").is_err());
    }

    #[test]
    fn name_validation_rejects_path_traversal() {
        assert!(WorkspaceManager::validate_name("../escape").is_err());
    }

    #[test]
    fn name_validation_accepts_typical_name() {
        assert!(WorkspaceManager::validate_name("my-app_2").is_ok());
    }

    #[tokio::test]
    async fn is_active_false_before_select() {
        let sandbox = Arc::new(Sandbox::new("fetch-sandbox-does-not-exist"));
        let manager = WorkspaceManager::new(sandbox, "/workspace", 30_000, 5_000);
        assert!(!manager.is_active("demo"));
    }
}
