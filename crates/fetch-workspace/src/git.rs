// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Git status via sandboxed `git` invocations. Parses porcelain v1 output
//! with the `--branch` header for ahead/behind counts.
use fetch_sandbox::{ExecOptions, Sandbox};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::GitStatus;

static BRANCH_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^## (?P<branch>[^.\s]+)(?:\.\.\.(?P<upstream>\S+))?(?: \[(?P<counts>[^\]]+)\])?").unwrap()
});
static AHEAD: Lazy<Regex> = Lazy::new(|| Regex::new(r"ahead (\d+)").unwrap());
static BEHIND: Lazy<Regex> = Lazy::new(|| Regex::new(r"behind (\d+)").unwrap());

async fn run(sandbox: &Sandbox, dir: &str, timeout_ms: u64, command: &str, args: &[&str]) -> Option<String> {
    let opts = ExecOptions {
        cwd: Some(dir.to_string()),
        timeout_ms: Some(timeout_ms),
        ..Default::default()
    };
    let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
    let result = sandbox.exec(command, &args, opts).await.ok()?;
    if result.exit_code == 0 && !result.timed_out {
        Some(result.stdout)
    } else {
        None
    }
}

/// `None` if `dir` is not a git repository (status call exits non-zero).
pub async fn fetch_git_status(sandbox: &Sandbox, dir: &str, timeout_ms: u64) -> Option<GitStatus> {
    let porcelain = run(sandbox, dir, timeout_ms, "git", &["status", "--porcelain", "--branch"]).await?;
    let mut status = parse_porcelain(&porcelain);

    if let Some(hash) = run(sandbox, dir, timeout_ms, "git", &["log", "-1", "--format=%H"]).await {
        let hash = hash.trim();
        if !hash.is_empty() {
            status.last_commit = Some(hash.to_string());
        }
    }
    if let Some(url) = run(sandbox, dir, timeout_ms, "git", &["remote", "get-url", "origin"]).await {
        let url = url.trim();
        if !url.is_empty() {
            status.remote_url = Some(url.to_string());
        }
    }
    Some(status)
}

fn parse_porcelain(output: &str) -> GitStatus {
    let mut status = GitStatus::default();
    for line in output.lines() {
        if let Some(rest) = line.strip_prefix("## ") {
            if let Some(caps) = BRANCH_HEADER.captures(line) {
                status.branch = Some(caps.name("branch").unwrap().as_str().to_string());
                if let Some(counts) = caps.name("counts") {
                    if let Some(m) = AHEAD.captures(counts.as_str()) {
                        status.ahead = m[1].parse().unwrap_or(0);
                    }
                    if let Some(m) = BEHIND.captures(counts.as_str()) {
                        status.behind = m[1].parse().unwrap_or(0);
                    }
                }
            } else {
                status.branch = Some(rest.split("...").next().unwrap_or(rest).to_string());
            }
            continue;
        }
        if line.len() < 3 {
            continue;
        }
        let (index_status, worktree_status) = (line.as_bytes()[0] as char, line.as_bytes()[1] as char);
        let path = line[3..].to_string();
        if index_status == '?' && worktree_status == '?' {
            status.untracked.push(path);
        } else {
            if index_status != ' ' {
                status.staged.push(path.clone());
            }
            if worktree_status != ' ' {
                status.modified.push(path);
            }
        }
    }
    status
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_branch_with_ahead_behind() {
        let out = "## main...origin/main [ahead 2, behind 1]\n M src/lib.rs\nA  new.rs\n?? scratch.txt\n";
        let status = parse_porcelain(out);
        assert_eq!(status.branch.as_deref(), Some("main"));
        assert_eq!(status.ahead, 2);
        assert_eq!(status.behind, 1);
        assert_eq!(status.modified, vec!["src/lib.rs".to_string()]);
        assert_eq!(status.staged, vec!["new.rs".to_string()]);
        assert_eq!(status.untracked, vec!["scratch.txt".to_string()]);
    }

    #[test]
    fn parses_branch_with_no_upstream() {
        let out = "## detached-work\n";
        let status = parse_porcelain(out);
        assert_eq!(status.branch.as_deref(), Some("detached-work"));
        assert_eq!(status.ahead, 0);
        assert!(!status.is_dirty());
    }

    #[test]
    fn empty_status_is_not_dirty() {
        let status = parse_porcelain("## main\n");
        assert!(!status.is_dirty());
    }
}
