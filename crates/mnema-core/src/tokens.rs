// SPDX-FileCopyrightText: 2026 Mnema Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Token counting and token-aware truncation for LLM context assembly.
//!
//! Uses the cl100k_base BPE vocabulary. The encoder is built once per
//! process and shared; building it only reads data embedded in the binary.

use std::sync::OnceLock;

use tiktoken_rs::CoreBPE;

fn bpe() -> &'static CoreBPE {
    static BPE: OnceLock<CoreBPE> = OnceLock::new();
    BPE.get_or_init(|| {
        tiktoken_rs::cl100k_base().expect("cl100k_base vocabulary is embedded in the binary")
    })
}

/// Counts the tokens in `text`.
pub fn count_tokens(text: &str) -> usize {
    bpe().encode_with_special_tokens(text).len()
}

/// Truncates `text` to at most `max_tokens` tokens.
///
/// Truncation operates on the whole string and may cut mid-line. If the
/// truncated token sequence does not decode cleanly (a codepoint split at
/// the boundary), tokens are dropped from the tail until it does.
pub fn truncate_to_tokens(text: &str, max_tokens: usize) -> String {
    if max_tokens == 0 {
        return String::new();
    }
    let tokens = bpe().encode_with_special_tokens(text);
    if tokens.len() <= max_tokens {
        return text.to_string();
    }
    let mut end = max_tokens;
    while end > 0 {
        if let Ok(decoded) = bpe().decode(tokens[..end].to_vec()) {
            return decoded;
        }
        end -= 1;
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_tokens_empty_is_zero() {
        assert_eq!(count_tokens(""), 0);
    }

    #[test]
    fn count_tokens_grows_with_text() {
        let short = count_tokens("hello");
        let long = count_tokens("hello world, this is a longer sentence about memory");
        assert!(short >= 1);
        assert!(long > short);
    }

    #[test]
    fn truncate_noop_when_under_limit() {
        let text = "a short line";
        assert_eq!(truncate_to_tokens(text, 1000), text);
    }

    #[test]
    fn truncate_respects_token_limit() {
        let text = "memory ".repeat(500);
        let truncated = truncate_to_tokens(&text, 20);
        assert!(count_tokens(&truncated) <= 20);
        assert!(truncated.len() < text.len());
        assert!(text.starts_with(&truncated));
    }

    #[test]
    fn truncate_to_zero_is_empty() {
        assert_eq!(truncate_to_tokens("anything", 0), "");
    }
}
