//! Reassembly of model replies
//!
//! Models answer with prose around fenced code blocks. This module pulls the
//! code back out and stitches per-chunk results together in input order.

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::types::{Chunk, Completion, ContentKind};

static HTML_BLOCK: LazyLock<Regex> = LazyLock::new(|| fence_pattern("html"));
static CSS_BLOCK: LazyLock<Regex> = LazyLock::new(|| fence_pattern("css"));
static JS_BLOCK: LazyLock<Regex> = LazyLock::new(|| fence_pattern("javascript|js"));

fn fence_pattern(tags: &str) -> Regex {
    // Tag must end the opening line, so ```json never matches a js fence.
    // The closing fence must start a line; an empty block leaves group 1 unset.
    let pattern = format!(r"(?s)```(?:{})[ \t]*\r?\n(?:(.*?)\r?\n)??```", tags);
    Regex::new(&pattern).expect("fence pattern is valid")
}

/// Per-kind buffers produced by [`SectionAssembler::split_by_kind`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KindBuffers {
    pub html: String,
    pub css: String,
    pub js: String,
}

impl KindBuffers {
    pub fn get(&self, kind: ContentKind) -> &str {
        match kind {
            ContentKind::Html => &self.html,
            ContentKind::Css => &self.css,
            ContentKind::Js => &self.js,
        }
    }

    fn push_line(&mut self, kind: ContentKind, line: &str) {
        let buf = match kind {
            ContentKind::Html => &mut self.html,
            ContentKind::Css => &mut self.css,
            ContentKind::Js => &mut self.js,
        };
        buf.push_str(line);
        buf.push('\n');
    }
}

/// Stateless helpers for turning replies back into page content
pub struct SectionAssembler;

impl SectionAssembler {
    /// First fenced block of `kind` in `text`, trimmed
    ///
    /// Returns `None` when there is no such block or it is blank.
    pub fn extract_fenced_block(text: &str, kind: ContentKind) -> Option<String> {
        let pattern = match kind {
            ContentKind::Html => &*HTML_BLOCK,
            ContentKind::Css => &*CSS_BLOCK,
            ContentKind::Js => &*JS_BLOCK,
        };

        pattern
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|block| !block.is_empty())
    }

    /// Route every line inside a recognized fence into its kind's buffer
    ///
    /// Lines outside fences, and inside fences of unknown languages, are
    /// dropped.
    pub fn split_by_kind(text: &str) -> KindBuffers {
        let mut buffers = KindBuffers::default();
        // Outer None: outside any fence. Inner None: inside an unrecognized fence.
        let mut open: Option<Option<ContentKind>> = None;

        for line in text.lines() {
            let trimmed = line.trim();
            if let Some(tag) = trimmed.strip_prefix("```") {
                open = match open {
                    Some(_) => None,
                    None => Some(ContentKind::from_fence_tag(tag)),
                };
                continue;
            }

            if let Some(Some(kind)) = open {
                buffers.push_line(kind, line);
            }
        }

        buffers
    }

    /// Join per-chunk results for `kind` in chunk order
    ///
    /// A generated reply contributes its fenced block, or the original chunk
    /// if it has none. A fallback contributes the original chunk.
    pub fn assemble(chunks: &[Chunk], completions: &[Completion], kind: ContentKind) -> String {
        let mut parts = Vec::with_capacity(chunks.len());
        let mut unparsed = 0usize;

        for (chunk, completion) in chunks.iter().zip(completions) {
            match completion {
                Completion::Generated(reply) => {
                    match Self::extract_fenced_block(reply, kind) {
                        Some(block) => parts.push(block),
                        None => {
                            unparsed += 1;
                            parts.push(chunk.text.clone());
                        }
                    }
                }
                Completion::Fallback(original) => parts.push(original.clone()),
            }
        }

        if unparsed > 0 {
            debug!(kind = %kind, unparsed, "Replies without a usable block kept original text");
        }

        parts.join("\n")
    }
}
