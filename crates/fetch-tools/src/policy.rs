// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT

/// Per-tool approval policy. Unlike a general-purpose shell tool, each tool
/// in this registry names a structured action (e.g. `workspace_delete`), so
/// the policy is a fixed per-tool decision rather than a glob match over a
/// command string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalPolicy {
    /// Always run without asking.
    Auto,
    /// Route through the `ask_user` flow before running.
    Ask,
    /// Never run; return an error.
    Deny,
}
