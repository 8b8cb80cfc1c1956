//! Fenced code block extraction.
//!
//! Pulls files out of a model response. A block becomes an [`Artifact`] when
//! it carries a path hint, either in its info string
//! (```` ```rust src/main.rs ````, ```` ```path=src/main.rs ````) or on the
//! line right before the fence (`### src/main.rs`, `File: src/main.rs`,
//! `` `src/main.rs` ``). Blocks without a hint stay in the prose.

use regex::Regex;
use squadforge_domain::Artifact;
use std::sync::LazyLock;

static FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?ms)^[ \t]*```([^\n`]*)\n(.*?)^[ \t]*```[ \t]*$").unwrap());

/// `### path`, `File: path`, `**path**` or a bare `` `path` `` line.
static HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:#+\s*|(?:file|path|filename)\s*:\s*|\*\*)?`?([\w./-]+\.\w+)`?(?:\*\*)?:?$")
        .unwrap()
});

/// Response split into prose and extracted files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted {
    pub prose: String,
    pub artifacts: Vec<Artifact>,
}

pub fn extract_artifacts(text: &str) -> Extracted {
    let mut prose = String::new();
    let mut artifacts: Vec<Artifact> = Vec::new();
    let mut cursor = 0;

    for caps in FENCE.captures_iter(text) {
        let (Some(whole), Some(info), Some(body)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        let before = &text[cursor..whole.start()];
        let (language, info_path) = parse_info(info.as_str());
        let heading = last_line(before).and_then(path_from_heading);

        match info_path.or(heading.map(|(path, _)| path)) {
            Some(path) => {
                let mut kept = before;
                if info_path.is_none()
                    && let Some((_, line_start)) = heading
                {
                    kept = &before[..line_start];
                }
                prose.push_str(kept);

                let language = language
                    .map(str::to_string)
                    .or_else(|| language_for(path).map(str::to_string));
                let mut artifact = Artifact::new(path, body.as_str());
                artifact.language = language;
                // A later block for the same path replaces the earlier one.
                artifacts.retain(|a| a.path != artifact.path);
                artifacts.push(artifact);
            }
            None => {
                prose.push_str(before);
                prose.push_str(whole.as_str());
            }
        }
        cursor = whole.end();
    }
    prose.push_str(&text[cursor..]);

    Extracted {
        prose: collapse_blank_lines(&prose),
        artifacts,
    }
}

/// `(language, path)` from a fence info string.
fn parse_info(info: &str) -> (Option<&str>, Option<&str>) {
    let mut language = None;
    let mut path = None;
    for token in info.split_whitespace() {
        let value = token
            .split_once('=')
            .filter(|(k, _)| matches!(*k, "path" | "file" | "title" | "filename"))
            .map(|(_, v)| v.trim_matches('"'))
            .unwrap_or(token);
        if looks_like_path(value) {
            path.get_or_insert(value);
        } else if language.is_none() && !token.contains('=') {
            language = Some(token);
        }
    }
    (language, path)
}

/// Last non-empty line of `text` and the byte offset where it starts.
fn last_line(text: &str) -> Option<(&str, usize)> {
    let trimmed = text.trim_end();
    let start = trimmed.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let line = trimmed[start..].trim();
    (!line.is_empty()).then_some((line, start))
}

fn path_from_heading((line, start): (&str, usize)) -> Option<(&str, usize)> {
    let caps = HEADING.captures(line)?;
    let path = caps.get(1)?.as_str();
    looks_like_path(path).then_some((path, start))
}

fn looks_like_path(token: &str) -> bool {
    let Some((stem, ext)) = token.rsplit_once('.') else {
        return token.contains('/') && !token.ends_with('/');
    };
    !stem.is_empty()
        && !ext.is_empty()
        && ext.chars().all(|c| c.is_ascii_alphanumeric())
        && token
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '/' | '.' | '_' | '-'))
}

/// Language tag for a file path, inferred from its extension.
pub fn language_for(path: &str) -> Option<&'static str> {
    let ext = path.rsplit_once('.')?.1;
    Some(match ext {
        "rs" => "rust",
        "py" => "python",
        "ts" | "tsx" => "typescript",
        "js" | "jsx" | "mjs" => "javascript",
        "go" => "go",
        "java" => "java",
        "rb" => "ruby",
        "toml" => "toml",
        "json" => "json",
        "yaml" | "yml" => "yaml",
        "md" => "markdown",
        "html" => "html",
        "css" => "css",
        "sh" => "bash",
        "sql" => "sql",
        _ => return None,
    })
}

fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;
    for line in text.trim().lines() {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim_end().to_string()
}
