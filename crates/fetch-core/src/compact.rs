// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use fetch_model::{Message, Role};
use fetch_tools::OutputCategory;

const SUMMARIZE_PROMPT: &str =
    "Summarize the conversation below in a concise, information-dense way. Preserve \
     decisions, file names, and commitments the agent made. This summary replaces the \
     original history, so do not drop anything a future turn would need.";

/// Phrases that reference unstated prior context ("fix it", "the usual") rather
/// than describing what to do. A turn matching one of these, with nothing else
/// in the message to disambiguate, should prompt a clarifying question instead
/// of acting.
const AMBIGUOUS_TRIGGERS: &[&str] = &[
    "fix it",
    "the usual",
    "do that again",
    "same as before",
    "you know what i mean",
];

/// True when `message count > threshold` and compaction should run before the
/// next model call.
pub fn needs_compaction(message_count: usize, threshold: usize) -> bool {
    message_count > threshold
}

/// Heuristic ambiguity check for the text handed to the agent loop. A cheap
/// substring match, not a classifier — good enough to catch the common
/// "fix it" / "the usual" shorthand the summarizer is meant to flag.
pub fn needs_clarification(text: &str) -> bool {
    let lower = text.trim().to_lowercase();
    if lower.split_whitespace().count() > 6 {
        return false;
    }
    AMBIGUOUS_TRIGGERS.iter().any(|t| lower.contains(t))
}

/// Split `messages` into the portion to summarize and the portion to keep
/// verbatim, per `history_window` (the most recent N messages are kept).
/// The leading system message, if any, is kept out of both halves — callers
/// re-attach it after building the summary.
pub fn split_for_compaction(messages: &[Message], history_window: usize) -> (Vec<Message>, Vec<Message>) {
    let (system, rest): (Vec<Message>, Vec<Message>) =
        messages.iter().cloned().partition(|m| m.role == Role::System);
    if rest.len() <= history_window {
        return (Vec::new(), [system, rest].concat());
    }
    let split_at = rest.len() - history_window;
    let to_summarize = rest[..split_at].to_vec();
    let mut kept = system;
    kept.extend(rest[split_at..].to_vec());
    (to_summarize, kept)
}

/// Build the summarization request sent to the model for the messages being
/// dropped, capped at `max_tokens` worth of output.
pub fn summarization_request(to_summarize: &[Message], max_tokens: u32) -> Message {
    let history_text = serialize_history(to_summarize);
    Message::user(format!(
        "{SUMMARIZE_PROMPT} (limit your reply to about {max_tokens} tokens)\n\n---\n\n{history_text}"
    ))
}

/// Replace the summarized prefix with a single `role=system` "Summary:"
/// message, then the messages that were kept verbatim. This is what gets
/// written back onto the session after the model returns a summary.
pub fn apply_summary(summary_text: &str, kept: Vec<Message>) -> Vec<Message> {
    let mut out = vec![Message::system(format!("Summary: {summary_text}"))];
    out.extend(kept);
    out
}

/// Deterministic fallback used when even a compaction request would not fit
/// the context window. Drops everything but the last `keep_n` non-system
/// messages; makes no model call, so it always succeeds.
pub fn emergency_compact(messages: &mut Vec<Message>, keep_n: usize) -> usize {
    let before = messages.len();
    let non_system: Vec<Message> = messages.iter().filter(|m| m.role != Role::System).cloned().collect();
    let keep = keep_n.min(non_system.len());
    let preserved = non_system[non_system.len() - keep..].to_vec();
    let notice = Message::system(
        "[Context emergency-compacted: earlier history was dropped to avoid a context-window \
         overflow. Ask the user to re-state any requirement you are missing.]",
    );
    messages.clear();
    messages.push(notice);
    messages.extend(preserved);
    before
}

/// Deterministic, content-aware tool-result truncation.
///
/// Dispatches on [`OutputCategory`] (not on tool name) so it stays
/// independent of the tools crate's concrete tool list; each tool declares
/// its own category.
pub fn smart_truncate(content: &str, category: OutputCategory, cap_tokens: usize) -> String {
    if cap_tokens == 0 {
        return content.to_string();
    }
    let cap_chars = cap_tokens * 4;
    if content.len() <= cap_chars {
        return content.to_string();
    }
    let omitted_bytes = content.len().saturating_sub(cap_chars);
    match category {
        OutputCategory::HeadTail => head_tail_lines(
            content,
            cap_chars,
            60,
            40,
            &format!("[... {{lines}} lines / {omitted_bytes} bytes omitted ...]"),
        ),
        OutputCategory::MatchList => head_lines(
            content,
            cap_chars,
            &format!(
                "[... {{lines}} more matches omitted ({omitted_bytes} bytes); \
                 use a more specific pattern to see them ...]"
            ),
        ),
        OutputCategory::FileContent => head_tail_lines(
            content,
            cap_chars,
            usize::MAX,
            usize::MAX,
            &format!(
                "[... {{lines}} lines omitted ({omitted_bytes} bytes); \
                 read the file again with a narrower range to see more ...]"
            ),
        ),
        OutputCategory::Generic => {
            let cut = content[..cap_chars].rfind('\n').map(|p| p + 1).unwrap_or(cap_chars);
            format!(
                "{}\n[... {omitted_bytes} bytes omitted; content truncated to fit context budget ...]",
                &content[..cut]
            )
        }
    }
}

// ─── Private helpers ──────────────────────────────────────────────────────────

fn serialize_history(messages: &[Message]) -> String {
    messages
        .iter()
        .filter(|m| m.role != Role::System)
        .map(|m| {
            let role = match m.role {
                Role::User => "User",
                Role::Assistant => "Assistant",
                Role::Tool => "Tool",
                Role::System => "System",
            };
            format!("{role}: {}", m.content)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn head_lines(content: &str, cap_chars: usize, notice_template: &str) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let mut kept = String::with_capacity(cap_chars);
    let mut kept_count = 0usize;
    for line in &lines {
        let needed = if kept.is_empty() { line.len() } else { line.len() + 1 };
        if kept.len() + needed > cap_chars {
            break;
        }
        if !kept.is_empty() {
            kept.push('\n');
        }
        kept.push_str(line);
        kept_count += 1;
    }
    let omitted = lines.len().saturating_sub(kept_count);
    if omitted == 0 {
        return content[..cap_chars.min(content.len())].to_string();
    }
    let notice = notice_template.replace("{lines}", &omitted.to_string());
    format!("{kept}\n{notice}")
}

fn head_tail_lines(content: &str, cap_chars: usize, max_head: usize, max_tail: usize, notice_template: &str) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let half_cap = cap_chars / 2;

    let mut head = String::with_capacity(half_cap);
    let mut head_count = 0usize;
    for line in lines.iter().take(max_head) {
        let needed = if head.is_empty() { line.len() } else { line.len() + 1 };
        if head.len() + needed > half_cap {
            break;
        }
        if !head.is_empty() {
            head.push('\n');
        }
        head.push_str(line);
        head_count += 1;
    }

    let mut tail_lines: Vec<&str> = Vec::new();
    let mut tail_chars = 0usize;
    for line in lines.iter().rev().take(max_tail) {
        let needed = if tail_lines.is_empty() { line.len() } else { line.len() + 1 };
        if tail_chars + needed > half_cap {
            break;
        }
        tail_chars += needed;
        tail_lines.push(line);
    }
    tail_lines.reverse();
    let tail_count = tail_lines.len();
    let tail = tail_lines.join("\n");

    let omitted = lines.len().saturating_sub(head_count + tail_count);
    if omitted == 0 {
        return content[..cap_chars.min(content.len())].to_string();
    }
    let notice = notice_template.replace("{lines}", &omitted.to_string());
    format!("{head}\n{notice}\n{tail}")
}

// ─── Unit tests ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn make_history() -> Vec<Message> {
        vec![
            Message::system("You are a helpful assistant."),
            Message::user("What is Rust?"),
            Message::assistant("Rust is a systems programming language."),
            Message::user("Show me an example."),
            Message::assistant("fn main() { println!(\"Hello\"); }"),
        ]
    }

    #[test]
    fn needs_compaction_triggers_above_threshold() {
        assert!(!needs_compaction(40, 40));
        assert!(needs_compaction(41, 40));
    }

    #[test]
    fn needs_clarification_flags_short_vague_requests() {
        assert!(needs_clarification("fix it"));
        assert!(needs_clarification("the usual please"));
        assert!(!needs_clarification("fix the null pointer bug in parser.rs line 42"));
    }

    #[test]
    fn split_for_compaction_keeps_history_window() {
        let msgs = make_history();
        let (to_summarize, kept) = split_for_compaction(&msgs, 2);
        assert_eq!(to_summarize.len(), 2); // the two oldest non-system messages
        assert_eq!(kept.len(), 3); // system + last 2
        assert_eq!(kept[0].role, Role::System);
    }

    #[test]
    fn split_for_compaction_is_noop_when_under_window() {
        let msgs = make_history();
        let (to_summarize, kept) = split_for_compaction(&msgs, 100);
        assert!(to_summarize.is_empty());
        assert_eq!(kept.len(), msgs.len());
    }

    #[test]
    fn summarization_request_embeds_history_and_token_cap() {
        let msgs = make_history();
        let (to_summarize, _) = split_for_compaction(&msgs, 1);
        let req = summarization_request(&to_summarize, 500);
        assert!(req.content.contains("500 tokens"));
        assert!(req.content.contains("What is Rust?"));
    }

    #[test]
    fn apply_summary_prepends_system_summary_message() {
        let kept = vec![Message::user("hi")];
        let out = apply_summary("short recap", kept);
        assert_eq!(out[0].role, Role::System);
        assert!(out[0].content.starts_with("Summary:"));
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn emergency_compact_keeps_only_last_n_non_system() {
        let mut msgs = make_history();
        let before = emergency_compact(&mut msgs, 1);
        assert_eq!(before, 5);
        assert_eq!(msgs.len(), 2); // notice + 1 kept
        assert!(msgs[0].content.contains("emergency-compacted"));
    }

    #[test]
    fn smart_truncate_returns_unchanged_when_under_cap() {
        let out = smart_truncate("short", OutputCategory::Generic, 100);
        assert_eq!(out, "short");
    }

    #[test]
    fn smart_truncate_head_tail_preserves_both_ends() {
        let content = (1..=200).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let out = smart_truncate(&content, OutputCategory::HeadTail, 50);
        assert!(out.contains("line 1"));
        assert!(out.contains("omitted"));
    }

    #[test]
    fn smart_truncate_match_list_keeps_head_only() {
        let content = (1..=200).map(|i| format!("match {i}")).collect::<Vec<_>>().join("\n");
        let out = smart_truncate(&content, OutputCategory::MatchList, 20);
        assert!(out.contains("match 1"));
        assert!(out.contains("more matches omitted"));
    }
}
