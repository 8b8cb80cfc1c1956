//! Token estimation.

/// Characters counted as one token.
pub const CHARS_PER_TOKEN: usize = 4;

/// Estimate the token count of `text`: one token per four characters,
/// rounded up.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

/// Longest prefix of `text` that fits in `max_bytes` and ends on a
/// character boundary.
pub fn clip_bytes(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let end = text
        .char_indices()
        .map(|(start, c)| start + c.len_utf8())
        .take_while(|&end| end <= max_bytes)
        .last()
        .unwrap_or(0);
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn test_estimate_counts_chars_not_bytes() {
        assert_eq!(estimate_tokens("あいうえ"), 1);
    }

    #[test]
    fn test_clip_keeps_short_text() {
        assert_eq!(clip_bytes("", 8), "");
        assert_eq!(clip_bytes("fn main", 7), "fn main");
        assert_eq!(clip_bytes("fn main() {}", 7), "fn main");
    }

    #[test]
    fn test_clip_never_splits_a_character() {
        // three 3-byte characters
        let text = "日本語";
        assert_eq!(clip_bytes(text, 2), "");
        assert_eq!(clip_bytes(text, 5), "日");
        assert_eq!(clip_bytes(text, 6), "日本");
    }
}
