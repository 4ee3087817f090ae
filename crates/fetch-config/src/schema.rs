// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use serde::{Deserialize, Serialize};

/// Coarse-grained operational state. Gates how an incoming message is
/// interpreted and is prefixed onto every outgoing chat message as a glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AgentMode {
    #[default]
    Listening,
    Working,
    Waiting,
    Guarding,
    Resting,
}

impl AgentMode {
    /// Glyph prefixed onto outgoing chat messages for this mode.
    pub fn glyph(self) -> &'static str {
        match self {
            AgentMode::Listening => "\u{1f7e2}",
            AgentMode::Working => "\u{1f535}",
            AgentMode::Waiting => "\u{1f7e1}",
            AgentMode::Guarding => "\u{1f534}",
            AgentMode::Resting => "\u{1f4a4}",
        }
    }
}

impl std::fmt::Display for AgentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentMode::Listening => write!(f, "listening"),
            AgentMode::Working => write!(f, "working"),
            AgentMode::Waiting => write!(f, "waiting"),
            AgentMode::Guarding => write!(f, "guarding"),
            AgentMode::Resting => write!(f, "resting"),
        }
    }
}

/// All tunables from the external settings table. Read once at process
/// start; an operator edits them by rewriting the config file and restarting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Messages kept in the LM window per agent turn.
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    /// Message count that triggers conversation summarization.
    #[serde(default = "default_compaction_threshold")]
    pub compaction_threshold: usize,
    /// Recent messages preserved verbatim by the summarizer.
    #[serde(default = "default_history_window")]
    pub compaction_keep_recent: usize,
    /// Token budget for the summarization call itself.
    #[serde(default = "default_compaction_max_tokens")]
    pub compaction_max_tokens: usize,
    /// Agent-loop tool-call round cap per user message.
    #[serde(default = "default_max_tool_calls")]
    pub max_tool_calls: u32,
    /// Circuit breaker: consecutive retryable failures before opening.
    #[serde(default = "default_cb_threshold")]
    pub cb_threshold: u32,
    /// Circuit breaker: quiet window (ms) before the circuit resets.
    #[serde(default = "default_cb_reset_ms")]
    pub cb_reset_ms: u64,
    /// Retry backoff schedule in milliseconds, applied in order.
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff: Vec<u64>,
    /// Default task timeout (ms); clamped to [1s, 30min] at the tool boundary.
    #[serde(default = "default_task_timeout")]
    pub task_timeout_ms: u64,
    /// Harness watchdog timeout (ms): no output event within this window kills the child.
    #[serde(default = "default_task_timeout")]
    pub harness_timeout_ms: u64,
    /// Per-user sliding-window rate limit: max messages...
    #[serde(default = "default_rate_limit_max")]
    pub rate_limit_max: u32,
    /// ...within this window (ms).
    #[serde(default = "default_rate_limit_window")]
    pub rate_limit_window_ms: u64,
    /// Message dedup window (ms).
    #[serde(default = "default_dedup_ttl")]
    pub dedup_ttl_ms: u64,
    /// Minimum interval (ms) between consecutive progress messages sent to the transport.
    #[serde(default = "default_progress_throttle")]
    pub progress_throttle_ms: u64,
    /// Workspace metadata cache TTL (ms).
    #[serde(default = "default_workspace_cache_ttl")]
    pub workspace_cache_ttl_ms: u64,
    /// Timeout (ms) for git status/porcelain sandbox commands.
    #[serde(default = "default_git_timeout")]
    pub git_timeout_ms: u64,
    /// Max recalled summary snippets injected into a fresh thread.
    #[serde(default = "default_recall_limit")]
    pub recall_limit: usize,
    /// Token budget per recalled snippet.
    #[serde(default = "default_recall_snippet_tokens")]
    pub recall_snippet_tokens: usize,
    /// Exponential relevance decay applied to older recalled snippets.
    #[serde(default = "default_recall_decay")]
    pub recall_decay: f32,
    /// Reconnect backoff for the chat transport connection.
    #[serde(default)]
    pub reconnect: ReconnectConfig,
    /// Model driver configuration.
    #[serde(default)]
    pub model: ModelConfig,
    /// Sandbox execution configuration.
    #[serde(default)]
    pub sandbox: SandboxConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            history_window: default_history_window(),
            compaction_threshold: default_compaction_threshold(),
            compaction_keep_recent: default_history_window(),
            compaction_max_tokens: default_compaction_max_tokens(),
            max_tool_calls: default_max_tool_calls(),
            cb_threshold: default_cb_threshold(),
            cb_reset_ms: default_cb_reset_ms(),
            retry_backoff: default_retry_backoff(),
            task_timeout_ms: default_task_timeout(),
            harness_timeout_ms: default_task_timeout(),
            rate_limit_max: default_rate_limit_max(),
            rate_limit_window_ms: default_rate_limit_window(),
            dedup_ttl_ms: default_dedup_ttl(),
            progress_throttle_ms: default_progress_throttle(),
            workspace_cache_ttl_ms: default_workspace_cache_ttl(),
            git_timeout_ms: default_git_timeout(),
            recall_limit: default_recall_limit(),
            recall_snippet_tokens: default_recall_snippet_tokens(),
            recall_decay: default_recall_decay(),
            reconnect: ReconnectConfig::default(),
            model: ModelConfig::default(),
            sandbox: SandboxConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReconnectConfig {
    #[serde(default = "default_reconnect_base_ms")]
    pub base_ms: u64,
    #[serde(default = "default_reconnect_max_ms")]
    pub max_ms: u64,
    #[serde(default = "default_reconnect_jitter_ms")]
    pub jitter_ms: u64,
    #[serde(default = "default_reconnect_max_attempts")]
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            base_ms: default_reconnect_base_ms(),
            max_ms: default_reconnect_max_ms(),
            jitter_ms: default_reconnect_jitter_ms(),
            max_attempts: default_reconnect_max_attempts(),
        }
    }
}

/// LM client driver selection. The LM client itself is an external
/// collaborator; this only selects "mock" (deterministic, for tests) or
/// "openai" (a generic OpenAI-compatible chat-completions endpoint).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// "mock" | "openai"
    #[serde(default = "default_model_provider")]
    pub provider: String,
    /// Model name forwarded to the provider API.
    #[serde(default = "default_model_name")]
    pub name: String,
    /// Environment variable that holds the API key.
    pub api_key_env: Option<String>,
    /// Base URL override; required for "openai" unless using the hosted default.
    pub base_url: Option<String>,
    /// Maximum tokens requested in a single completion.
    #[serde(default = "default_model_max_tokens")]
    pub max_tokens: u32,
    /// Path to a YAML fixtures file consumed by the mock provider.
    pub mock_responses_file: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: default_model_provider(),
            name: default_model_name(),
            api_key_env: Some("OPENAI_API_KEY".into()),
            base_url: None,
            max_tokens: default_model_max_tokens(),
            mock_responses_file: None,
        }
    }
}

/// Which named sandbox container commands are executed in, and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Name/id of the sandbox container the orchestrator talks to.
    #[serde(default = "default_sandbox_container")]
    pub container: String,
    /// Root directory inside the sandbox where workspaces are checked out.
    #[serde(default = "default_sandbox_root")]
    pub workspace_root: String,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            container: default_sandbox_container(),
            workspace_root: default_sandbox_root(),
        }
    }
}

fn default_history_window() -> usize {
    20
}
fn default_compaction_threshold() -> usize {
    40
}
fn default_compaction_max_tokens() -> usize {
    500
}
fn default_max_tool_calls() -> u32 {
    5
}
fn default_cb_threshold() -> u32 {
    3
}
fn default_cb_reset_ms() -> u64 {
    300_000
}
fn default_retry_backoff() -> Vec<u64> {
    vec![0, 1_000, 3_000, 10_000]
}
fn default_task_timeout() -> u64 {
    300_000
}
fn default_rate_limit_max() -> u32 {
    30
}
fn default_rate_limit_window() -> u64 {
    60_000
}
fn default_dedup_ttl() -> u64 {
    30_000
}
fn default_progress_throttle() -> u64 {
    3_000
}
fn default_workspace_cache_ttl() -> u64 {
    30_000
}
fn default_git_timeout() -> u64 {
    5_000
}
fn default_recall_limit() -> usize {
    5
}
fn default_recall_snippet_tokens() -> usize {
    300
}
fn default_recall_decay() -> f32 {
    0.1
}
fn default_reconnect_base_ms() -> u64 {
    5_000
}
fn default_reconnect_max_ms() -> u64 {
    300_000
}
fn default_reconnect_jitter_ms() -> u64 {
    2_000
}
fn default_reconnect_max_attempts() -> u32 {
    10
}
fn default_model_provider() -> String {
    "mock".into()
}
fn default_model_name() -> String {
    "gpt-4o-mini".into()
}
fn default_model_max_tokens() -> u32 {
    1024
}
fn default_sandbox_container() -> String {
    "fetch-sandbox".into()
}
fn default_sandbox_root() -> String {
    "/workspace".into()
}

/// Timeouts named in a `task_create`/`task_respond` tool call are clamped to
/// `[1s, 30min]` before being handed to the harness watchdog.
pub const MIN_TASK_TIMEOUT_MS: u64 = 1_000;
pub const MAX_TASK_TIMEOUT_MS: u64 = 30 * 60 * 1_000;

pub fn clamp_timeout_ms(ms: u64) -> u64 {
    ms.clamp(MIN_TASK_TIMEOUT_MS, MAX_TASK_TIMEOUT_MS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_settings_table() {
        let c = Config::default();
        assert_eq!(c.history_window, 20);
        assert_eq!(c.compaction_threshold, 40);
        assert_eq!(c.max_tool_calls, 5);
        assert_eq!(c.cb_threshold, 3);
        assert_eq!(c.cb_reset_ms, 300_000);
        assert_eq!(c.retry_backoff, vec![0, 1_000, 3_000, 10_000]);
        assert_eq!(c.task_timeout_ms, 300_000);
        assert_eq!(c.rate_limit_max, 30);
        assert_eq!(c.rate_limit_window_ms, 60_000);
        assert_eq!(c.dedup_ttl_ms, 30_000);
        assert_eq!(c.progress_throttle_ms, 3_000);
        assert_eq!(c.workspace_cache_ttl_ms, 30_000);
        assert_eq!(c.git_timeout_ms, 5_000);
        assert_eq!(c.recall_limit, 5);
        assert_eq!(c.recall_snippet_tokens, 300);
        assert_eq!(c.recall_decay, 0.1);
    }

    #[test]
    fn clamp_timeout_rejects_below_one_second() {
        assert_eq!(clamp_timeout_ms(10), MIN_TASK_TIMEOUT_MS);
    }

    #[test]
    fn clamp_timeout_rejects_above_thirty_minutes() {
        assert_eq!(clamp_timeout_ms(u64::MAX), MAX_TASK_TIMEOUT_MS);
    }

    #[test]
    fn clamp_timeout_passes_through_valid_value() {
        assert_eq!(clamp_timeout_ms(60_000), 60_000);
    }

    #[test]
    fn serde_roundtrip_preserves_overrides() {
        let mut c = Config::default();
        c.max_tool_calls = 9;
        let yaml = serde_yaml::to_string(&c).unwrap();
        let back: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.max_tool_calls, 9);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let parsed: Config = serde_yaml::from_str("max_tool_calls: 7\n").unwrap();
        assert_eq!(parsed.max_tool_calls, 7);
        assert_eq!(parsed.history_window, default_history_window());
    }

    #[test]
    fn mode_glyphs_are_distinct() {
        let modes = [
            AgentMode::Listening,
            AgentMode::Working,
            AgentMode::Waiting,
            AgentMode::Guarding,
            AgentMode::Resting,
        ];
        let glyphs: std::collections::HashSet<_> = modes.iter().map(|m| m.glyph()).collect();
        assert_eq!(glyphs.len(), modes.len());
    }

    #[test]
    fn mode_default_is_listening() {
        assert_eq!(AgentMode::default(), AgentMode::Listening);
    }

    #[test]
    fn model_config_defaults_to_mock_provider() {
        assert_eq!(ModelConfig::default().provider, "mock");
    }
}
