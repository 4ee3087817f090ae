// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use serde::{Deserialize, Serialize};

/// Files a harness run touched, as reported by the adapter's own parsing of
/// the child's output (not a filesystem diff).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilesModified {
    pub created: Vec<String>,
    pub modified: Vec<String>,
    pub deleted: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FileOp {
    Created,
    Modified,
    Deleted,
}

/// One line of parsed harness output. Produced by [`crate::OutputParser`],
/// consumed by the engine to drive task state and by the session to surface
/// progress to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedEvent {
    Line(String),
    Progress(String),
    FileOp { op: FileOp, path: String },
    Question(String),
    Complete,
    Error(String),
}

/// Engine-level lifecycle events, one per harness execution.
#[derive(Debug, Clone)]
pub enum HarnessEvent {
    Started { task_id: String },
    Output(String),
    Question(String),
    Progress(String),
    Completed { exit_code: i32, output: String, files_modified: FilesModified, summary: String },
    Failed { error: String },
    Cancelled,
    Timeout,
}
