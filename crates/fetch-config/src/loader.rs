// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

use crate::Config;

/// Ordered list of config file locations searched from lowest to highest priority.
/// Later files override earlier ones.
fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    // 1. System-wide default
    paths.push(PathBuf::from("/etc/fetch/config.yaml"));
    paths.push(PathBuf::from("/etc/fetch/config.yml"));

    // 2. XDG / home
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".config/fetch/config.yaml"));
        paths.push(home.join(".config/fetch/config.yml"));
    }
    if let Some(cfg) = dirs::config_dir() {
        paths.push(cfg.join("fetch/config.yaml"));
        paths.push(cfg.join("fetch/config.yml"));
    }

    // 3. Workspace-local
    paths.push(PathBuf::from(".fetch/config.yaml"));
    paths.push(PathBuf::from(".fetch/config.yml"));
    paths.push(PathBuf::from(".fetch.yaml"));
    paths.push(PathBuf::from(".fetch.yml"));
    paths.push(PathBuf::from("fetch.yaml"));
    paths.push(PathBuf::from("fetch.yml"));

    paths
}

/// Load configuration by merging all discovered YAML files, then applying
/// environment variable overrides. The `extra` argument may provide an
/// explicit path (e.g. `--config` CLI flag).
pub fn load(extra: Option<&Path>) -> anyhow::Result<Config> {
    let mut merged = serde_yaml::Value::Mapping(serde_yaml::Mapping::new());

    for path in config_search_paths() {
        if path.is_file() {
            debug!(path = %path.display(), "loading config layer");
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let layer: serde_yaml::Value = serde_yaml::from_str(&text)
                .with_context(|| format!("parsing {}", path.display()))?;
            merge_yaml(&mut merged, layer);
        }
    }

    if let Some(p) = extra {
        debug!(path = %p.display(), "loading explicit config");
        let text =
            std::fs::read_to_string(p).with_context(|| format!("reading {}", p.display()))?;
        let layer: serde_yaml::Value =
            serde_yaml::from_str(&text).with_context(|| format!("parsing {}", p.display()))?;
        merge_yaml(&mut merged, layer);
    }

    let mut config: Config = if matches!(merged, serde_yaml::Value::Mapping(ref m) if m.is_empty())
    {
        Config::default()
    } else {
        serde_yaml::from_value(merged).unwrap_or_default()
    };

    apply_env_overrides(&mut config);
    Ok(config)
}

/// Deep-merge `src` into `dst`; src wins on scalar conflicts.
fn merge_yaml(dst: &mut serde_yaml::Value, src: serde_yaml::Value) {
    match (dst, src) {
        (serde_yaml::Value::Mapping(d), serde_yaml::Value::Mapping(s)) => {
            for (k, v) in s {
                let entry = d
                    .entry(k)
                    .or_insert(serde_yaml::Value::Mapping(serde_yaml::Mapping::new()));
                merge_yaml(entry, v);
            }
        }
        (dst, src) => *dst = src,
    }
}

/// Environment variables override file config, checked last. Names follow
/// the settings table: `FETCH_<FIELD_NAME_UPPERCASE>`.
fn apply_env_overrides(config: &mut Config) {
    env_usize("FETCH_HISTORY_WINDOW", &mut config.history_window);
    env_usize("FETCH_COMPACTION_THRESHOLD", &mut config.compaction_threshold);
    env_u32("FETCH_MAX_TOOL_CALLS", &mut config.max_tool_calls);
    env_u32("FETCH_CB_THRESHOLD", &mut config.cb_threshold);
    env_u64("FETCH_CB_RESET_MS", &mut config.cb_reset_ms);
    env_u64("FETCH_TASK_TIMEOUT_MS", &mut config.task_timeout_ms);
    env_u64("FETCH_HARNESS_TIMEOUT_MS", &mut config.harness_timeout_ms);
    env_u32("FETCH_RATE_LIMIT_MAX", &mut config.rate_limit_max);
    env_u64("FETCH_RATE_LIMIT_WINDOW_MS", &mut config.rate_limit_window_ms);
    env_u64("FETCH_DEDUP_TTL_MS", &mut config.dedup_ttl_ms);
    env_u64("FETCH_PROGRESS_THROTTLE_MS", &mut config.progress_throttle_ms);
    env_u64(
        "FETCH_WORKSPACE_CACHE_TTL_MS",
        &mut config.workspace_cache_ttl_ms,
    );
    env_u64("FETCH_GIT_TIMEOUT_MS", &mut config.git_timeout_ms);
    env_usize("FETCH_RECALL_LIMIT", &mut config.recall_limit);
    env_usize(
        "FETCH_RECALL_SNIPPET_TOKENS",
        &mut config.recall_snippet_tokens,
    );
    if let Ok(raw) = std::env::var("FETCH_MODEL_PROVIDER") {
        config.model.provider = raw;
    }
    if let Ok(raw) = std::env::var("FETCH_MODEL_NAME") {
        config.model.name = raw;
    }
    if let Ok(raw) = std::env::var("FETCH_MODEL_BASE_URL") {
        config.model.base_url = Some(raw);
    }
    if let Ok(raw) = std::env::var("FETCH_SANDBOX_CONTAINER") {
        config.sandbox.container = raw;
    }
}

fn env_usize(key: &str, field: &mut usize) {
    if let Ok(raw) = std::env::var(key) {
        match raw.parse() {
            Ok(v) => *field = v,
            Err(_) => debug!(key, raw, "ignoring malformed env override"),
        }
    }
}

fn env_u32(key: &str, field: &mut u32) {
    if let Ok(raw) = std::env::var(key) {
        match raw.parse() {
            Ok(v) => *field = v,
            Err(_) => debug!(key, raw, "ignoring malformed env override"),
        }
    }
}

fn env_u64(key: &str, field: &mut u64) {
    if let Ok(raw) = std::env::var(key) {
        match raw.parse() {
            Ok(v) => *field = v,
            Err(_) => debug!(key, raw, "ignoring malformed env override"),
        }
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn val(s: &str) -> serde_yaml::Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn merge_scalar_src_wins() {
        let mut dst = val("x: 1");
        let src = val("x: 2");
        merge_yaml(&mut dst, src);
        assert_eq!(dst["x"].as_i64(), Some(2));
    }

    #[test]
    fn merge_preserves_keys_not_in_src() {
        let mut dst = val("a: 1\nb: 2");
        let src = val("b: 99");
        merge_yaml(&mut dst, src);
        assert_eq!(dst["a"].as_i64(), Some(1));
        assert_eq!(dst["b"].as_i64(), Some(99));
    }

    #[test]
    fn merge_nested_tables() {
        let mut dst = val("model:\n  provider: mock\n  name: test-a");
        let src = val("model:\n  name: test-b");
        merge_yaml(&mut dst, src);
        assert_eq!(dst["model"]["provider"].as_str(), Some("mock"));
        assert_eq!(dst["model"]["name"].as_str(), Some("test-b"));
    }

    #[test]
    fn load_returns_error_when_explicit_path_missing() {
        let _guard = ENV_LOCK.lock().unwrap();
        let result = load(Some(Path::new("/tmp/fetch_nonexistent_config_xyz.yaml")));
        assert!(result.is_err());
    }

    #[test]
    fn load_with_no_extra_path_returns_defaults() {
        let _guard = ENV_LOCK.lock().unwrap();
        let cfg = load(None).unwrap();
        assert_eq!(cfg.max_tool_calls, crate::Config::default().max_tool_calls);
    }

    #[test]
    fn load_explicit_file_overrides_defaults() {
        let _guard = ENV_LOCK.lock().unwrap();
        use std::io::Write;
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "max_tool_calls: 11").unwrap();
        let cfg = load(Some(f.path())).unwrap();
        assert_eq!(cfg.max_tool_calls, 11);
    }

    #[test]
    fn env_override_wins_over_file() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("FETCH_MAX_TOOL_CALLS", "13");
        use std::io::Write;
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "max_tool_calls: 11").unwrap();
        let cfg = load(Some(f.path())).unwrap();
        std::env::remove_var("FETCH_MAX_TOOL_CALLS");
        assert_eq!(cfg.max_tool_calls, 13);
    }

    #[test]
    fn malformed_env_override_is_ignored() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("FETCH_MAX_TOOL_CALLS", "not-a-number");
        let cfg = load(None).unwrap();
        std::env::remove_var("FETCH_MAX_TOOL_CALLS");
        assert_eq!(cfg.max_tool_calls, crate::Config::default().max_tool_calls);
    }
}
