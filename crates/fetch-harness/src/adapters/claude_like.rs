// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use once_cell::sync::Lazy;
use regex::Regex;

use crate::adapter::{HarnessAdapter, HarnessConfig};

static CREATED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*(?:created|wrote|add(?:ed)?)\s+(?:file\s+)?(\S+)").unwrap());
static MODIFIED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*(?:updated|modified|edit(?:ed)?)\s+(?:file\s+)?(\S+)").unwrap());
static DELETED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*(?:deleted|removed)\s+(?:file\s+)?(\S+)").unwrap());

/// Adapter for the Claude-style coding CLI: prints structured
/// "Created/Updated/Deleted <path>" lines and asks plain English questions.
#[derive(Debug, Default)]
pub struct ClaudeLikeAdapter;

impl HarnessAdapter for ClaudeLikeAdapter {
    fn agent(&self) -> &'static str {
        "claude-like"
    }

    fn build_config(&self, goal: &str, cwd: &str, timeout_ms: u64) -> HarnessConfig {
        HarnessConfig {
            command: "claude".to_string(),
            args: vec!["--print".to_string(), "--permission-mode".to_string(), "acceptEdits".to_string(), goal.to_string()],
            env: vec![],
            cwd: cwd.to_string(),
            timeout_ms,
        }
    }

    fn extract_created_path(&self, line: &str) -> Option<String> {
        CREATED_RE.captures(line).map(|c| c[1].to_string())
    }

    fn extract_modified_path(&self, line: &str) -> Option<String> {
        MODIFIED_RE.captures(line).map(|c| c[1].to_string())
    }

    fn extract_deleted_path(&self, line: &str) -> Option<String> {
        DELETED_RE.captures(line).map(|c| c[1].to_string())
    }
}
