// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use once_cell::sync::Lazy;
use regex::Regex;

use crate::adapter::{HarnessAdapter, HarnessConfig};

static WRITE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*writeFile\((\S+?)\)").unwrap());
static REMOVE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*(?:removeFile|deleteFile)\((\S+?)\)").unwrap());

/// Adapter for the Gemini-style coding CLI: emits `writeFile(path)` /
/// `removeFile(path)` tool-call echoes rather than English sentences.
#[derive(Debug, Default)]
pub struct GeminiLikeAdapter;

impl HarnessAdapter for GeminiLikeAdapter {
    fn agent(&self) -> &'static str {
        "gemini-like"
    }

    fn build_config(&self, goal: &str, cwd: &str, timeout_ms: u64) -> HarnessConfig {
        HarnessConfig {
            command: "gemini".to_string(),
            args: vec!["-y".to_string(), "-p".to_string(), goal.to_string()],
            env: vec![],
            cwd: cwd.to_string(),
            timeout_ms,
        }
    }

    fn extract_created_path(&self, line: &str) -> Option<String> {
        WRITE_RE.captures(line).map(|c| c[1].trim_matches('"').to_string())
    }

    fn extract_modified_path(&self, _line: &str) -> Option<String> {
        // Gemini's writeFile covers both create and edit; without a prior
        // listing of the workspace we cannot distinguish the two here, so
        // only `extract_created_path` fires for this adapter's edits.
        None
    }

    fn extract_deleted_path(&self, line: &str) -> Option<String> {
        REMOVE_RE.captures(line).map(|c| c[1].trim_matches('"').to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_write_file_calls() {
        let a = GeminiLikeAdapter;
        assert_eq!(a.extract_created_path(r#"writeFile("src/main.rs")"#).as_deref(), Some("src/main.rs"));
    }

    #[test]
    fn detects_remove_file_calls() {
        let a = GeminiLikeAdapter;
        assert_eq!(a.extract_deleted_path(r#"removeFile("old.rs")"#).as_deref(), Some("old.rs"));
    }
}
