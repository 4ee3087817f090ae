// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Frames a harness child's raw output stream into lines, stripping
//! terminal control sequences and guarding against unbounded line/buffer
//! growth, then hands each line to the adapter for classification.
use crate::adapter::HarnessAdapter;
use crate::events::ParsedEvent;

const MAX_LINE_LEN: usize = 10_000;
const MAX_BUFFER_BYTES: usize = 1_048_576;

/// Strips ANSI/terminal control sequences (CSI + common C0 controls other
/// than tab/newline).
fn strip_control_codes(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            // ESC [ ... letter  (CSI sequence)
            if chars.peek() == Some(&'[') {
                chars.next();
                for next in chars.by_ref() {
                    if next.is_ascii_alphabetic() {
                        break;
                    }
                }
            }
            continue;
        }
        if c.is_control() && c != '\t' && c != '\n' {
            continue;
        }
        out.push(c);
    }
    out
}

pub struct OutputParser {
    partial: String,
    rolling: String,
}

impl Default for OutputParser {
    fn default() -> Self {
        Self { partial: String::new(), rolling: String::new() }
    }
}

impl OutputParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a raw chunk (may contain zero, one, or many newlines). Returns
    /// the parsed events for every complete line found.
    pub fn feed(&mut self, chunk: &str, adapter: &dyn HarnessAdapter) -> Vec<ParsedEvent> {
        self.partial.push_str(chunk);
        let mut events = Vec::new();
        while let Some(pos) = self.partial.find('\n') {
            let line: String = self.partial.drain(..=pos).collect();
            let line = line.trim_end_matches(['\n', '\r']).to_string();
            events.extend(self.consume_line(&line, adapter));
        }
        events
    }

    /// Flush any remaining partial line at end-of-stream.
    pub fn finish(&mut self, adapter: &dyn HarnessAdapter) -> Vec<ParsedEvent> {
        if self.partial.is_empty() {
            return Vec::new();
        }
        let line = std::mem::take(&mut self.partial);
        self.consume_line(&line, adapter)
    }

    fn consume_line(&mut self, raw: &str, adapter: &dyn HarnessAdapter) -> Vec<ParsedEvent> {
        let mut line = strip_control_codes(raw);
        if line.len() > MAX_LINE_LEN {
            line.truncate(MAX_LINE_LEN);
            line.push_str("...[line truncated]");
        }

        self.rolling.push_str(&line);
        self.rolling.push('\n');
        if self.rolling.len() > MAX_BUFFER_BYTES {
            let excess = self.rolling.len() - MAX_BUFFER_BYTES;
            self.rolling.drain(..excess);
        }

        let mut events = vec![ParsedEvent::Line(line.clone())];
        if let Some(classified) = adapter.parse_output_line(&line) {
            events.push(classified);
        }
        events
    }

    /// The rolling 1 MiB window of output retained for summary extraction.
    pub fn rolling_buffer(&self) -> &str {
        &self.rolling
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ClaudeLikeAdapter;

    #[test]
    fn strips_ansi_escape_sequences() {
        assert_eq!(strip_control_codes("\x1b[31mred\x1b[0m"), "red");
    }

    #[test]
    fn buffers_partial_lines_across_feeds() {
        let mut parser = OutputParser::new();
        let adapter = ClaudeLikeAdapter::default();
        let first = parser.feed("hello ", &adapter);
        assert!(first.is_empty());
        let second = parser.feed("world\n", &adapter);
        assert_eq!(second[0], ParsedEvent::Line("hello world".to_string()));
    }

    #[test]
    fn finish_flushes_trailing_partial_line() {
        let mut parser = OutputParser::new();
        let adapter = ClaudeLikeAdapter::default();
        parser.feed("trailing, no newline", &adapter);
        let flushed = parser.finish(&adapter);
        assert_eq!(flushed[0], ParsedEvent::Line("trailing, no newline".to_string()));
    }

    #[test]
    fn enforces_max_line_length() {
        let mut parser = OutputParser::new();
        let adapter = ClaudeLikeAdapter::default();
        let long = "x".repeat(MAX_LINE_LEN + 500);
        let events = parser.feed(&format!("{long}\n"), &adapter);
        match &events[0] {
            ParsedEvent::Line(l) => assert!(l.len() < long.len()),
            _ => panic!("expected line event"),
        }
    }

    #[test]
    fn rolling_buffer_caps_at_one_mebibyte() {
        let mut parser = OutputParser::new();
        let adapter = ClaudeLikeAdapter::default();
        for _ in 0..2000 {
            parser.feed(&format!("{}\n", "y".repeat(1000)), &adapter);
        }
        assert!(parser.rolling_buffer().len() <= MAX_BUFFER_BYTES);
    }
}
