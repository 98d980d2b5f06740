//! Line-aligned content chunking
//!
//! Splits page content into chunks whose summed per-line token estimate stays
//! within a budget. Lines are never split, so joining the chunk texts with
//! `\n` reproduces the input exactly. A single line over budget becomes its
//! own chunk.

use tracing::debug;

use super::tokenizer::TokenCounter;
use crate::types::Chunk;

/// Greedy line accumulator bounded by a token budget
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentChunker {
    counter: TokenCounter,
}

impl ContentChunker {
    pub fn new(counter: TokenCounter) -> Self {
        Self { counter }
    }

    /// Split `content` into ordered chunks of at most `max_tokens` each
    pub fn chunk(&self, content: &str, max_tokens: usize) -> Vec<Chunk> {
        let mut texts: Vec<String> = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut current_tokens = 0usize;

        for line in content.split('\n') {
            let line_tokens = self.counter.count(line);

            if !current.is_empty() && current_tokens + line_tokens > max_tokens {
                texts.push(current.join("\n"));
                current.clear();
                current_tokens = 0;
            }

            current.push(line);
            current_tokens += line_tokens;
        }

        // `split` always yields at least one item, so `current` is non-empty here
        texts.push(current.join("\n"));

        debug!(
            chunks = texts.len(),
            max_tokens,
            bytes = content.len(),
            "Split content into chunks"
        );

        Chunk::batch(texts)
    }

    /// Token estimate of a chunk as the chunker budgets it (sum over lines)
    pub fn budgeted_tokens(&self, text: &str) -> usize {
        text.split('\n').map(|line| self.counter.count(line)).sum()
    }
}
