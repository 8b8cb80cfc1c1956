//! Token-budget compression of conversation history and file payloads.

use super::budget::ContextBudget;
use super::tokens::{CHARS_PER_TOKEN, clip_bytes, estimate_tokens};
use crate::agent::Artifact;
use crate::session::{Message, Role};
use std::collections::HashSet;

/// Share of a file's byte budget reserved for important lines.
const IMPORTANT_SHARE: f64 = 0.7;
/// Keywords kept per discarded message in a conversation summary.
const KEYWORDS_PER_MESSAGE: usize = 8;
const MIN_KEYWORD_LEN: usize = 5;

const STOP_WORDS: &[&str] = &[
    "about", "after", "again", "their", "there", "these", "those", "which", "while", "would",
    "could", "should", "where", "other", "being", "because", "before", "under", "please", "thanks",
];

/// Line prefixes treated as structurally important.
const IMPORTANT_PREFIXES: &[&str] = &[
    "fn ", "pub ", "async ", "struct ", "enum ", "trait ", "impl ", "impl<", "mod ", "use ",
    "type ", "const ", "static ", "macro_rules!", "#[", "import ", "export ", "from ", "class ",
    "interface ", "function ", "def ", "package ", "module ", "namespace ", "#include",
    "@", "func ", "declare ", "abstract ", "public ", "private ", "protected ",
];

#[derive(Debug, Clone, Default)]
pub struct ContextCompressor {
    budget: ContextBudget,
}

impl ContextCompressor {
    pub fn new(budget: ContextBudget) -> Self {
        Self { budget }
    }

    pub fn budget(&self) -> &ContextBudget {
        &self.budget
    }

    /// Estimated tokens of a full request.
    pub fn estimate(&self, messages: &[Message], files: &[Artifact], system_prompt: &str) -> usize {
        estimate_tokens(system_prompt)
            + messages
                .iter()
                .map(|m| estimate_tokens(&m.content))
                .sum::<usize>()
            + files
                .iter()
                .map(|f| estimate_tokens(&f.path) + estimate_tokens(&f.content))
                .sum::<usize>()
    }

    /// True iff the estimated request size exceeds the budget's effective max.
    pub fn needs_compression(
        &self,
        messages: &[Message],
        files: &[Artifact],
        system_prompt: &str,
    ) -> bool {
        self.estimate(messages, files, system_prompt) > self.budget.effective_max()
    }

    /// Keep the first message and the last `keep_recent` verbatim; everything
    /// in between collapses into a single system summary.
    pub fn compress_conversation(&self, messages: &[Message], keep_recent: usize) -> Vec<Message> {
        if messages.len() <= keep_recent.saturating_add(1) {
            return messages.to_vec();
        }

        let tail_start = messages.len() - keep_recent;
        let discarded = &messages[1..tail_start];

        let mut summary = format!("Summary of {} earlier message(s):", discarded.len());
        for message in discarded {
            let keywords = keywords(&message.content);
            if keywords.is_empty() {
                continue;
            }
            summary.push_str(&format!("\n- {}: {}", message.role, keywords.join(", ")));
        }

        let mut compressed = Vec::with_capacity(keep_recent + 2);
        compressed.push(messages[0].clone());
        compressed.push(Message::new(Role::System, summary));
        compressed.extend_from_slice(&messages[tail_start..]);
        compressed
    }

    /// Shrink every file whose estimate exceeds `max_file_tokens`.
    pub fn compress_files(&self, files: &[Artifact], max_file_tokens: usize) -> Vec<Artifact> {
        files
            .iter()
            .map(|file| {
                if estimate_tokens(&file.content) <= max_file_tokens {
                    file.clone()
                } else {
                    Artifact {
                        content: compress_content(&file.content, max_file_tokens),
                        ..file.clone()
                    }
                }
            })
            .collect()
    }
}

fn compress_content(content: &str, max_file_tokens: usize) -> String {
    let byte_budget = max_file_tokens.saturating_mul(CHARS_PER_TOKEN);
    let important_budget = (byte_budget as f64 * IMPORTANT_SHARE) as usize;
    let lines: Vec<&str> = content.lines().collect();

    let mut kept: Vec<usize> = Vec::new();
    let mut used = 0usize;

    for (idx, line) in lines.iter().enumerate() {
        if !is_important(line) {
            continue;
        }
        let cost = line.len() + 1;
        if used + cost > important_budget {
            break;
        }
        used += cost;
        kept.push(idx);
    }

    for (idx, line) in lines.iter().enumerate() {
        if is_important(line) {
            continue;
        }
        let cost = line.len() + 1;
        if used + cost > byte_budget {
            break;
        }
        used += cost;
        kept.push(idx);
    }

    kept.sort_unstable();

    let mut out = String::with_capacity(used + 64);
    for idx in &kept {
        out.push_str(lines[*idx]);
        out.push('\n');
    }
    out.push_str(&format!(
        "... [truncated: kept {} of {} lines]",
        kept.len(),
        lines.len()
    ));
    out
}

fn is_important(line: &str) -> bool {
    let trimmed = line.trim_start();
    if trimmed.is_empty() {
        return false;
    }
    if IMPORTANT_PREFIXES.iter().any(|p| trimmed.starts_with(p)) {
        return true;
    }
    // Top-level block openers: CSS selectors, object literals, headings.
    let top_level = trimmed.len() == line.len();
    (top_level && trimmed.trim_end().ends_with('{')) || trimmed.starts_with("# ")
}

fn keywords(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    text.split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|w| w.chars().count() >= MIN_KEYWORD_LEN)
        .map(str::to_lowercase)
        .filter(|w| !STOP_WORDS.contains(&w.as_str()))
        .filter(|w| seen.insert(w.clone()))
        .map(|w| clip_bytes(&w, 24).to_string())
        .take(KEYWORDS_PER_MESSAGE)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation(n: usize) -> Vec<Message> {
        (0..n)
            .map(|i| {
                if i % 2 == 0 {
                    Message::user(format!("message {i} about authentication handlers"))
                } else {
                    Message::assistant(format!("reply {i} covering database migrations"))
                }
            })
            .collect()
    }

    #[test]
    fn test_needs_compression_empty_inputs() {
        let compressor = ContextCompressor::default();
        assert!(!compressor.needs_compression(&[], &[], ""));
    }

    #[test]
    fn test_needs_compression_over_budget() {
        let compressor = ContextCompressor::new(ContextBudget::new(100, 0.5).unwrap());
        let small = vec![Message::user("x".repeat(100))];
        let large = vec![Message::user("x".repeat(400))];
        assert!(!compressor.needs_compression(&small, &[], ""));
        assert!(compressor.needs_compression(&large, &[], ""));
        assert!(compressor.needs_compression(&[], &[Artifact::new("a.rs", "y".repeat(400))], ""));
    }

    #[test]
    fn test_compress_conversation_keeps_first_and_recent() {
        let compressor = ContextCompressor::default();
        for k in [0, 1, 3, 6] {
            let messages = conversation(k + 5);
            let compressed = compressor.compress_conversation(&messages, k);

            assert!(compressed.len() <= k + 2);
            assert_eq!(compressed[0], messages[0]);
            assert_eq!(&compressed[compressed.len() - k..], &messages[messages.len() - k..]);
            assert_eq!(compressed[1].role, Role::System);
            assert!(compressed[1].content.contains("authentication"));
        }
    }

    #[test]
    fn test_compress_conversation_short_history_unchanged() {
        let compressor = ContextCompressor::default();
        let messages = conversation(4);
        assert_eq!(compressor.compress_conversation(&messages, 3), messages);
        assert_eq!(compressor.compress_conversation(&messages, 10), messages);
    }

    #[test]
    fn test_compress_files_under_budget_passes_through() {
        let compressor = ContextCompressor::default();
        let files = vec![Artifact::new("a.rs", "fn main() {}")];
        assert_eq!(compressor.compress_files(&files, 100), files);
    }

    #[test]
    fn test_compress_files_prefers_important_lines() {
        let mut content = String::new();
        content.push_str("use std::io;\n");
        for i in 0..200 {
            content.push_str(&format!("    let value_{i} = compute({i});\n"));
        }
        content.push_str("pub fn exported() {}\n");

        let compressor = ContextCompressor::default();
        let files = vec![Artifact::new("big.rs", content.clone())];
        let out = compressor.compress_files(&files, 100);
        let text = &out[0].content;

        assert!(text.len() < content.len());
        assert!(text.contains("use std::io;"));
        assert!(text.contains("pub fn exported() {}"));
        assert!(text.contains("let value_0 "));
        assert!(text.ends_with("of 202 lines]"));

        // Kept lines stay in source order.
        let use_pos = text.find("use std::io;").unwrap();
        let first_let = text.find("let value_0 ").unwrap();
        let exported = text.find("pub fn exported").unwrap();
        assert!(use_pos < first_let && first_let < exported);
    }

    #[test]
    fn test_is_important() {
        assert!(is_important("pub struct Foo {"));
        assert!(is_important("import React from 'react';"));
        assert!(is_important(".header {"));
        assert!(is_important("    @Component"));
        assert!(!is_important("    x += 1;"));
        assert!(!is_important("    if x {"));
    }
}
