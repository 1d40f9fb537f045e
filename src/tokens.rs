//! Token estimates for log text.
//!
//! Uses tiktoken-rs BPE tokenization with `o200k_base` (the GPT-4.1 family
//! encoding), falling back to `cl100k_base`. Counts are only used for
//! logging and summary statistics, so a missing tokenizer degrades to a
//! bytes/4 estimate rather than an error.

use std::sync::LazyLock;

use tiktoken_rs::CoreBPE;

static BPE: LazyLock<Option<CoreBPE>> = LazyLock::new(|| {
    tiktoken_rs::o200k_base()
        .or_else(|_| tiktoken_rs::cl100k_base())
        .ok()
});

/// Count tokens in `text`.
pub fn count_tokens(text: &str) -> usize {
    match BPE.as_ref() {
        Some(bpe) => bpe.encode_ordinary(text).len(),
        None => text.len().div_ceil(4),
    }
}

/// Format a token count for display. Example: "1,234"
pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1234), "1,234");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_count_tokens_nonzero() {
        assert_eq!(count_tokens(""), 0);
        assert!(count_tokens("error: test failed at line 42") > 0);
    }
}
