// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use once_cell::sync::Lazy;
use regex::Regex;

use crate::adapter::{HarnessAdapter, HarnessConfig};

static DIFF_NEW_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+\+\+ (?:b/)?(\S+)").unwrap());
static DIFF_OLD_DEV_NULL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^--- /dev/null").unwrap());
static DIFF_NEW_DEV_NULL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+\+\+ /dev/null").unwrap());
static DIFF_OLD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^--- (?:a/)?(\S+)").unwrap());

/// Adapter for the Copilot-style coding CLI: prints unified-diff headers
/// (`--- a/path` / `+++ b/path`) rather than prose file-op lines.
#[derive(Debug, Default)]
pub struct CopilotLikeAdapter {
    last_old_path: std::sync::Mutex<Option<String>>,
}

impl HarnessAdapter for CopilotLikeAdapter {
    fn agent(&self) -> &'static str {
        "copilot-like"
    }

    fn build_config(&self, goal: &str, cwd: &str, timeout_ms: u64) -> HarnessConfig {
        HarnessConfig {
            command: "copilot".to_string(),
            args: vec!["suggest".to_string(), "--auto-apply".to_string(), "--prompt".to_string(), goal.to_string()],
            env: vec![],
            cwd: cwd.to_string(),
            timeout_ms,
        }
    }

    fn extract_created_path(&self, line: &str) -> Option<String> {
        if DIFF_OLD_DEV_NULL_RE.is_match(line) {
            *self.last_old_path.lock().unwrap() = None;
        }
        if let Some(caps) = DIFF_NEW_RE.captures(line) {
            if self.last_old_path.lock().unwrap().is_none() {
                return Some(caps[1].to_string());
            }
        }
        None
    }

    fn extract_modified_path(&self, line: &str) -> Option<String> {
        if let Some(caps) = DIFF_OLD_RE.captures(line) {
            let path = caps[1].to_string();
            *self.last_old_path.lock().unwrap() = Some(path);
            return None;
        }
        if let Some(caps) = DIFF_NEW_RE.captures(line) {
            if self.last_old_path.lock().unwrap().is_some() {
                return Some(caps[1].to_string());
            }
        }
        None
    }

    fn extract_deleted_path(&self, line: &str) -> Option<String> {
        if DIFF_NEW_DEV_NULL_RE.is_match(line) {
            return self.last_old_path.lock().unwrap().take();
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_file_diff_header_is_created() {
        let a = CopilotLikeAdapter::default();
        assert!(a.extract_created_path("--- /dev/null").is_none());
        assert_eq!(a.extract_created_path("+++ b/src/new.rs").as_deref(), Some("src/new.rs"));
    }

    #[test]
    fn modified_file_diff_header_is_modified() {
        let a = CopilotLikeAdapter::default();
        assert!(a.extract_modified_path("--- a/src/lib.rs").is_none());
        assert_eq!(a.extract_modified_path("+++ b/src/lib.rs").as_deref(), Some("src/lib.rs"));
    }
}
