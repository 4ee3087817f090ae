// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Per-agent adapter abstraction. Each of the three supported coding
//! assistants implements this trait; the shared question/completion
//! detection heuristics live here as default methods so adapters only
//! override what differs about their CLI.
use once_cell::sync::Lazy;
use regex::Regex;

use crate::events::{FileOp, FilesModified, ParsedEvent};

/// Spawn parameters for a single harness run.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub command: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub cwd: String,
    pub timeout_ms: u64,
}

static QUESTION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"\?\s*$").unwrap(),
        Regex::new(r"(?i)\[y/n\]").unwrap(),
        Regex::new(r"(?i)\(yes/no\)").unwrap(),
        Regex::new(r"(?i)\b(continue|proceed|confirm)\b").unwrap(),
    ]
});

static COMPLETION_PATTERNS: Lazy<Vec<Regex>> =
    Lazy::new(|| vec![Regex::new(r"(?i)\b(done|completed|finished)\b").unwrap()]);

/// Behavior shared by every harness adapter. The common patterns are
/// implemented as default methods; an adapter overrides only what its CLI
/// actually does differently.
pub trait HarnessAdapter: Send + Sync {
    /// Agent key this adapter handles, e.g. `"claude-like"`.
    fn agent(&self) -> &'static str;

    fn build_config(&self, goal: &str, cwd: &str, timeout_ms: u64) -> HarnessConfig;

    /// Classify a single already-line-framed, control-stripped line of
    /// output. Returns `None` for lines that are just plain chatter.
    fn parse_output_line(&self, line: &str) -> Option<ParsedEvent> {
        if let Some(path) = self.extract_created_path(line) {
            return Some(ParsedEvent::FileOp { op: FileOp::Created, path });
        }
        if let Some(path) = self.extract_modified_path(line) {
            return Some(ParsedEvent::FileOp { op: FileOp::Modified, path });
        }
        if let Some(path) = self.extract_deleted_path(line) {
            return Some(ParsedEvent::FileOp { op: FileOp::Deleted, path });
        }
        if let Some(text) = self.detect_question(line) {
            return Some(ParsedEvent::Question(text));
        }
        if self.detect_completion(line) {
            return Some(ParsedEvent::Complete);
        }
        if line.to_lowercase().starts_with("error") {
            return Some(ParsedEvent::Error(line.to_string()));
        }
        None
    }

    /// Default question detector: the four shared patterns from the spec.
    fn detect_question(&self, line: &str) -> Option<String> {
        if QUESTION_PATTERNS.iter().any(|re| re.is_match(line)) {
            Some(line.to_string())
        } else {
            None
        }
    }

    fn detect_completion(&self, line: &str) -> bool {
        COMPLETION_PATTERNS.iter().any(|re| re.is_match(line))
    }

    fn extract_created_path(&self, _line: &str) -> Option<String> {
        None
    }
    fn extract_modified_path(&self, _line: &str) -> Option<String> {
        None
    }
    fn extract_deleted_path(&self, _line: &str) -> Option<String> {
        None
    }

    /// Bytes to write to the child's stdin in response to a question.
    fn format_response(&self, text: &str) -> Vec<u8> {
        let mut bytes = text.as_bytes().to_vec();
        bytes.push(b'\n');
        bytes
    }

    /// Aggregate the per-line file-op events seen over a run.
    fn extract_file_operations(&self, events: &[ParsedEvent]) -> FilesModified {
        let mut files = FilesModified::default();
        for event in events {
            if let ParsedEvent::FileOp { op, path } = event {
                match op {
                    FileOp::Created => files.created.push(path.clone()),
                    FileOp::Modified => files.modified.push(path.clone()),
                    FileOp::Deleted => files.deleted.push(path.clone()),
                }
            }
        }
        files
    }

    /// Extract a human summary from the full rolling output buffer. Default:
    /// the last non-empty line.
    fn extract_summary(&self, full_output: &str) -> String {
        full_output
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .unwrap_or("")
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ClaudeLikeAdapter;

    #[test]
    fn default_detect_question_matches_shared_patterns() {
        let a = ClaudeLikeAdapter::default();
        assert!(a.detect_question("Should I continue?").is_some());
        assert!(a.detect_question("Proceed with deletion [y/n]").is_some());
        assert!(a.detect_question("just some log output").is_none());
    }

    #[test]
    fn default_detect_completion_matches_shared_patterns() {
        let a = ClaudeLikeAdapter::default();
        assert!(a.detect_completion("Task Finished"));
        assert!(!a.detect_completion("still working"));
    }

    #[test]
    fn default_extract_summary_picks_last_nonempty_line() {
        let a = ClaudeLikeAdapter::default();
        assert_eq!(a.extract_summary("first\nsecond\n\n"), "second");
    }
}
