// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::bail;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, warn};

use fetch_config::{AgentMode, Config};
use fetch_model::{CompletionRequest, Message, ModelError, ModelProvider, Role, ToolCallRequest, ToolSchema};
use fetch_tools::{ToolCall, ToolEvent, ToolRegistry};

use crate::compact::{apply_summary, emergency_compact, needs_clarification, needs_compaction, smart_truncate, split_for_compaction, summarization_request};
use crate::events::AgentEvent;
use crate::prompts::{system_prompt, SessionContext};
use crate::runtime_context::AgentRuntimeContext;
use crate::session::Session;

/// Receives [`AgentEvent`]s emitted mid-turn (tool calls, progress reports,
/// mode changes) before the turn's final text is returned.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: AgentEvent);
}

/// Counts failures within a rolling window and opens once `threshold` is hit,
/// rejecting calls until `reset` elapses.
struct CircuitBreaker {
    threshold: usize,
    reset: Duration,
    errors: usize,
    opened_at: Option<Instant>,
}

impl CircuitBreaker {
    fn new(threshold: usize, reset_ms: u64) -> Self {
        Self { threshold, reset: Duration::from_millis(reset_ms), errors: 0, opened_at: None }
    }

    fn is_open(&mut self) -> bool {
        match self.opened_at {
            Some(t) if t.elapsed() < self.reset => true,
            Some(_) => {
                self.opened_at = None;
                self.errors = 0;
                false
            }
            None => false,
        }
    }

    fn record_success(&mut self) {
        self.errors = 0;
        self.opened_at = None;
    }

    fn record_failure(&mut self) {
        self.errors += 1;
        if self.errors >= self.threshold {
            self.opened_at = Some(Instant::now());
        }
    }
}

/// Drives one session's model <-> tool loop: assembles the system prompt,
/// calls the model, executes any requested tool calls, and repeats up to
/// `max_tool_calls` rounds per turn.
pub struct Agent {
    session: Session,
    tools: Arc<ToolRegistry>,
    model: Arc<dyn ModelProvider>,
    config: Arc<Config>,
    runtime: AgentRuntimeContext,
    tool_events: UnboundedReceiver<ToolEvent>,
    circuit: CircuitBreaker,
}

impl Agent {
    pub fn new(
        thread_id: impl Into<String>,
        model: Arc<dyn ModelProvider>,
        tools: Arc<ToolRegistry>,
        config: Arc<Config>,
        runtime: AgentRuntimeContext,
        tool_events: UnboundedReceiver<ToolEvent>,
        max_context_tokens: usize,
    ) -> Self {
        let circuit = CircuitBreaker::new(config.cb_threshold, config.cb_reset_ms);
        Self {
            session: Session::new(thread_id, max_context_tokens),
            tools,
            model,
            config,
            runtime,
            tool_events,
            circuit,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn mode(&self) -> AgentMode {
        self.session.mode
    }

    /// Process one user turn: push the user message, run the bounded
    /// model/tool loop, and return the final assistant text.
    pub async fn turn(&mut self, user_text: &str, progress: Option<&dyn ProgressSink>) -> anyhow::Result<String> {
        if needs_compaction(self.session.messages.len(), self.config.compaction_threshold) {
            self.compact().await?;
        }

        if needs_clarification(user_text) {
            return Ok("Could you say more about what you'd like me to do? I want to avoid guessing.".to_string());
        }

        self.session.push(Message::user(user_text));

        let mut rounds = 0u32;
        loop {
            let req = self.build_request(user_text);
            let reply = self.complete_with_retry(req).await?;

            if !reply.tool_calls.is_empty() && rounds < self.config.max_tool_calls {
                rounds += 1;
                self.session.push(Message {
                    role: Role::Assistant,
                    content: reply.text.clone(),
                    tool_calls: reply.tool_calls.clone(),
                    tool_call_id: None,
                });
                let calls = reply.tool_calls.clone();
                for call in &calls {
                    self.execute_tool_call(call, progress).await;
                }
                self.drain_tool_events(progress);
                continue;
            }

            self.session.push(Message::assistant(reply.text.clone()));
            if let Some(sink) = progress {
                sink.emit(AgentEvent::TurnComplete(reply.text.clone()));
            }
            return Ok(reply.text);
        }
    }

    fn build_request(&self, user_text: &str) -> CompletionRequest {
        let session_ctx = SessionContext {
            active_workspace: self.runtime.workspace_root.as_ref().map(|p| p.display().to_string()),
            active_task: self.runtime.active_task_note.clone(),
            active_files: Vec::new(),
        };
        let system = system_prompt(self.session.mode, user_text, &session_ctx, &self.runtime);

        let window = self.config.history_window;
        let history: Vec<Message> = if self.session.messages.len() > window {
            self.session.messages[self.session.messages.len() - window..].to_vec()
        } else {
            self.session.messages.clone()
        };

        let mut messages = vec![Message::system(system)];
        messages.extend(history);

        let tools: Vec<ToolSchema> = self
            .tools
            .schemas_for_mode(self.session.mode)
            .into_iter()
            .map(|s| ToolSchema { name: s.name, description: s.description, parameters: s.parameters })
            .collect();

        CompletionRequest { messages, tools, max_tokens: self.config.model.max_tokens }
    }

    /// Wraps the model call with the retry/circuit-breaker policy from
    /// §4.4/§4.11: backoff schedule for retryable failures, a single retry
    /// with a trimmed history on 400, and no retry at all on 401/403/404.
    async fn complete_with_retry(&mut self, req: CompletionRequest) -> anyhow::Result<fetch_model::CompletionReply> {
        if self.circuit.is_open() {
            bail!("circuit open: the model provider has failed repeatedly, try again shortly");
        }

        let schedule = &self.config.retry_backoff;
        let mut last_err = None;
        for delay_ms in schedule {
            if *delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(*delay_ms)).await;
            }
            match self.model.complete(req.clone()).await {
                Ok(reply) => {
                    self.circuit.record_success();
                    return Ok(reply);
                }
                Err(e) => {
                    if let Some(ModelError::Http { status: 400, .. }) = e.downcast_ref::<ModelError>() {
                        warn!("model rejected request (400), retrying with trimmed history");
                        let simplified = self.simplified_request(&req);
                        match self.model.complete(simplified).await {
                            Ok(reply) => {
                                self.circuit.record_success();
                                return Ok(reply);
                            }
                            Err(e2) => {
                                self.circuit.record_failure();
                                return Err(e2);
                            }
                        }
                    }
                    let retryable = e.downcast_ref::<ModelError>().map(ModelError::is_retryable).unwrap_or(false);
                    if !retryable {
                        self.circuit.record_failure();
                        return Err(e);
                    }
                    debug!(error = %e, "retryable model failure, backing off");
                    last_err = Some(e);
                }
            }
        }
        self.circuit.record_failure();
        Err(last_err.expect("schedule always runs at least one attempt"))
    }

    fn simplified_request(&self, req: &CompletionRequest) -> CompletionRequest {
        let system = req.messages.first().cloned();
        let tail: Vec<Message> = req.messages.iter().rev().take(4).rev().cloned().collect();
        let mut messages = Vec::new();
        if let Some(sys) = system {
            messages.push(sys);
        }
        messages.extend(tail);
        CompletionRequest { messages, tools: req.tools.clone(), max_tokens: req.max_tokens }
    }

    async fn execute_tool_call(&mut self, call: &ToolCallRequest, progress: Option<&dyn ProgressSink>) {
        let tool_call = ToolCall { id: call.id.clone(), name: call.name.clone(), args: call.arguments.clone() };
        if let Some(sink) = progress {
            sink.emit(AgentEvent::ToolCallStarted(tool_call.clone()));
        }
        let output = self.tools.execute(&tool_call).await;
        let category = self.tools.get(&call.name).map(|t| t.output_category()).unwrap_or_default();
        let content = smart_truncate(&output.content, category, self.config.compaction_max_tokens);
        if let Some(sink) = progress {
            sink.emit(AgentEvent::ToolCallFinished {
                call_id: call.id.clone(),
                tool_name: call.name.clone(),
                output: content.clone(),
                is_error: output.is_error,
            });
        }
        self.session.push(Message::tool_result(call.id.clone(), content));
    }

    fn drain_tool_events(&mut self, progress: Option<&dyn ProgressSink>) {
        while let Ok(event) = self.tool_events.try_recv() {
            match event {
                ToolEvent::ModeChanged(mode) => {
                    self.session.mode = mode;
                    if let Some(sink) = progress {
                        sink.emit(AgentEvent::ModeChanged(mode));
                    }
                }
                ToolEvent::ApprovalRequested { approval_id, question } => {
                    self.session.set_pending_approval(approval_id.clone(), question.clone());
                    self.session.mode = AgentMode::Waiting;
                    if let Some(sink) = progress {
                        sink.emit(AgentEvent::ApprovalRequested { approval_id, question });
                    }
                }
                ToolEvent::ProgressReported { task_id, message } => {
                    if let Some(sink) = progress {
                        sink.emit(AgentEvent::Progress { task_id, message });
                    }
                }
            }
        }
    }

    /// Run §4.10's summarization step: split the window, ask the model for a
    /// summary capped at `compaction_max_tokens`, and replace the summarized
    /// prefix with one `role=system` message. Falls back to the deterministic
    /// [`emergency_compact`] if the summarization call itself fails.
    async fn compact(&mut self) -> anyhow::Result<()> {
        let before = self.session.token_count;
        let (to_summarize, kept) = split_for_compaction(&self.session.messages, self.config.history_window);
        if to_summarize.is_empty() {
            return Ok(());
        }
        let cap = self.config.compaction_max_tokens as u32;
        let request = summarization_request(&to_summarize, cap);
        let req = CompletionRequest { messages: vec![request], tools: Vec::new(), max_tokens: cap };
        match self.model.complete(req).await {
            Ok(reply) => {
                self.session.replace_messages(apply_summary(&reply.text, kept));
            }
            Err(e) => {
                warn!(error = %e, "compaction model call failed, falling back to emergency compaction");
                emergency_compact(&mut self.session.messages, self.config.history_window);
                self.session.recalculate_tokens();
            }
        }
        let after = self.session.token_count;
        debug!(before, after, "context compacted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use fetch_model::ScriptedMockProvider;
    use fetch_tools::ToolRegistry;
    use tokio::sync::mpsc::unbounded_channel;

    use super::*;

    fn make_agent(model: Arc<dyn ModelProvider>) -> Agent {
        let (_tx, rx) = unbounded_channel();
        Agent::new(
            "thr_1",
            model,
            Arc::new(ToolRegistry::new()),
            Arc::new(Config::default()),
            AgentRuntimeContext::default(),
            rx,
            10_000,
        )
    }

    #[tokio::test]
    async fn turn_returns_text_reply_and_appends_history() {
        let model = Arc::new(ScriptedMockProvider::always_text("hello there"));
        let mut agent = make_agent(model);
        let reply = agent.turn("hi", None).await.unwrap();
        assert_eq!(reply, "hello there");
        assert!(agent.session().messages.iter().any(|m| m.role == Role::User));
        assert!(agent.session().messages.iter().any(|m| m.role == Role::Assistant));
    }

    #[tokio::test]
    async fn turn_detects_vague_requests_without_calling_model() {
        let model = Arc::new(ScriptedMockProvider::new(vec![]));
        let mut agent = make_agent(model);
        let reply = agent.turn("fix it", None).await.unwrap();
        assert!(reply.contains("more about what"));
        assert!(agent.session().messages.is_empty());
    }

    #[tokio::test]
    async fn circuit_breaker_opens_after_threshold_failures() {
        struct FailingProvider;
        #[async_trait::async_trait]
        impl ModelProvider for FailingProvider {
            fn name(&self) -> &str {
                "failing"
            }
            async fn complete(&self, _req: CompletionRequest) -> anyhow::Result<fetch_model::CompletionReply> {
                Err(ModelError::Http { status: 503, body: "down".into() }.into())
            }
        }
        let mut config = Config::default();
        config.cb_threshold = 1;
        config.retry_backoff = vec![0];
        let (_tx, rx) = unbounded_channel();
        let mut agent = Agent::new(
            "thr_1",
            Arc::new(FailingProvider),
            Arc::new(ToolRegistry::new()),
            Arc::new(config),
            AgentRuntimeContext::default(),
            rx,
            10_000,
        );
        assert!(agent.turn("hi", None).await.is_err());
        let second = agent.turn("hi again", None).await;
        assert!(second.unwrap_err().to_string().contains("circuit open"));
    }

    #[tokio::test]
    async fn progress_sink_receives_turn_complete_event() {
        struct Sink(Mutex<Vec<String>>);
        impl ProgressSink for Sink {
            fn emit(&self, event: AgentEvent) {
                if let AgentEvent::TurnComplete(text) = event {
                    self.0.lock().unwrap().push(text);
                }
            }
        }
        let model = Arc::new(ScriptedMockProvider::always_text("done"));
        let mut agent = make_agent(model);
        let sink = Sink(Mutex::new(Vec::new()));
        let reply = agent.turn("go", Some(&sink)).await.unwrap();
        assert_eq!(reply, "done");
        assert_eq!(sink.0.lock().unwrap().as_slice(), ["done".to_string()]);
    }
}
