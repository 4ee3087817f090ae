// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Project-type detection: marker-file checks in priority order, each a
//! `test -f` run in the sandbox against the workspace directory.
use fetch_sandbox::{ExecOptions, Sandbox};

use crate::types::ProjectType;

const MARKERS: &[(&str, ProjectType)] = &[
    ("tsconfig.json", ProjectType::Ts),
    ("package.json", ProjectType::Node),
    ("Cargo.toml", ProjectType::Rust),
    ("go.mod", ProjectType::Go),
    ("requirements.txt", ProjectType::Python),
    ("pyproject.toml", ProjectType::Python),
];

async fn file_exists(sandbox: &Sandbox, dir: &str, file: &str) -> bool {
    let opts = ExecOptions { cwd: Some(dir.to_string()), ..Default::default() };
    sandbox
        .exec("test", &["-f".to_string(), file.to_string()], opts)
        .await
        .map(|r| r.exit_code == 0)
        .unwrap_or(false)
}

/// Check marker files in priority order, returning the first match.
pub async fn detect_project_type(sandbox: &Sandbox, dir: &str) -> ProjectType {
    for (marker, kind) in MARKERS {
        if file_exists(sandbox, dir, marker).await {
            return *kind;
        }
    }
    ProjectType::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markers_are_checked_in_spec_priority_order() {
        let kinds: Vec<ProjectType> = MARKERS.iter().map(|(_, k)| *k).collect();
        assert_eq!(
            kinds,
            vec![
                ProjectType::Ts,
                ProjectType::Node,
                ProjectType::Rust,
                ProjectType::Go,
                ProjectType::Python,
                ProjectType::Python,
            ]
        );
    }
}
