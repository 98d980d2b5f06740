//! Token Counting
//!
//! Provides token estimation for chunk budgeting.
//!
//! Chunk boundaries depend on these counts, so every estimator is a pure
//! function of its input: the same text always yields the same count.

use serde::{Deserialize, Serialize};

/// Token estimation method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenEstimator {
    /// Simple character-based estimation (4 chars = 1 token)
    CharBased,
    /// Word-based estimation (0.75 tokens per word on average)
    WordBased,
    /// Markup/code-aware estimation (punctuation and operators count separately)
    #[default]
    CodeAware,
}

/// Token counter for chunk budgeting
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenCounter {
    estimator: TokenEstimator,
}

impl TokenCounter {
    pub fn new(estimator: TokenEstimator) -> Self {
        Self { estimator }
    }

    /// Estimate token count for a string (never less than 1)
    pub fn count(&self, text: &str) -> usize {
        match self.estimator {
            TokenEstimator::CharBased => text.chars().count().div_ceil(4).max(1),
            TokenEstimator::WordBased => {
                let word_count = text.split_whitespace().count();
                (word_count as f32 * 0.75).ceil() as usize + 1
            }
            TokenEstimator::CodeAware => self.count_code_aware(text),
        }
    }

    /// Markup-aware counting
    /// - Tags, selectors and operators are dominated by single-char tokens
    /// - Words are 1-2 tokens, long identifiers roughly 4 chars per token
    fn count_code_aware(&self, text: &str) -> usize {
        let mut tokens = 0;
        let mut word_len = 0;

        for ch in text.chars() {
            match ch {
                '(' | ')' | '{' | '}' | '[' | ']' | ';' | ':' | ',' | '.' | '+' | '-' | '*'
                | '/' | '=' | '<' | '>' | '!' | '&' | '|' | '@' | '#' | '$' | '%' | '^' | '~'
                | '?' | '\\' | '"' | '\'' => {
                    tokens += word_tokens(word_len);
                    word_len = 0;
                    tokens += 1;
                }
                ' ' | '\t' | '\n' | '\r' => {
                    tokens += word_tokens(word_len);
                    word_len = 0;
                }
                _ => word_len += ch.len_utf8(),
            }
        }

        tokens += word_tokens(word_len);
        tokens.max(1)
    }
}

/// Estimate tokens for a single word of `len` bytes
fn word_tokens(len: usize) -> usize {
    match len {
        0 => 0,
        1..=4 => 1,
        5..=8 => 2,
        _ => len.div_ceil(4),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_based_counting() {
        let counter = TokenCounter::new(TokenEstimator::CharBased);
        assert_eq!(counter.count("hello"), 2);
        assert_eq!(counter.count("hi"), 1);
        assert_eq!(counter.count("hello world"), 3);
        assert_eq!(counter.count(""), 1);
    }

    #[test]
    fn test_code_aware_css_rule() {
        let counter = TokenCounter::default();
        // body { color : red }
        assert_eq!(counter.count("body{color:red}"), 7);
    }

    #[test]
    fn test_code_aware_scales_with_content() {
        let counter = TokenCounter::default();
        let small = counter.count("<div class=\"a\"></div>");
        let large = counter.count(
            "<div class=\"navigation-container\"><ul><li><a href=\"/about\">About us</a></li></ul></div>",
        );
        assert!(small > 0);
        assert!(large > small);
    }

    #[test]
    fn test_counting_is_stable() {
        let counter = TokenCounter::default();
        let text = "function init() { document.querySelector('#app').classList.add('ready'); }";
        assert_eq!(counter.count(text), counter.count(text));
    }

    #[test]
    fn test_word_based_counting() {
        let counter = TokenCounter::new(TokenEstimator::WordBased);
        assert_eq!(counter.count(""), 1);
        assert_eq!(counter.count("a b c d"), 4);
    }

    #[test]
    fn test_estimator_names() {
        let parsed: TokenEstimator = serde_json::from_str("\"char_based\"").unwrap();
        assert_eq!(parsed, TokenEstimator::CharBased);
        assert_eq!(
            serde_json::to_string(&TokenEstimator::CodeAware).unwrap(),
            "\"code_aware\""
        );
    }
}
