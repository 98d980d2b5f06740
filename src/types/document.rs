//! Document and chunk types shared across the generation pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A scraped (or generated) website: one page plus its aggregated styles,
/// scripts and static assets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub html: String,
    pub css: String,
    pub js: String,
    pub assets: Vec<PathBuf>,
}

impl Document {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            ..Default::default()
        }
    }

    pub fn with_css(mut self, css: impl Into<String>) -> Self {
        self.css = css.into();
        self
    }

    pub fn with_js(mut self, js: impl Into<String>) -> Self {
        self.js = js.into();
        self
    }

    pub fn with_assets(mut self, assets: Vec<PathBuf>) -> Self {
        self.assets = assets;
        self
    }

    /// Content of the given kind
    pub fn content(&self, kind: ContentKind) -> &str {
        match kind {
            ContentKind::Html => &self.html,
            ContentKind::Css => &self.css,
            ContentKind::Js => &self.js,
        }
    }

    /// Replace the content of the given kind
    pub fn set_content(&mut self, kind: ContentKind, content: String) {
        match kind {
            ContentKind::Html => self.html = content,
            ContentKind::Css => self.css = content,
            ContentKind::Js => self.js = content,
        }
    }
}

/// Kind of page content sent to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Html,
    Css,
    Js,
}

impl ContentKind {
    /// Language tag used on fenced code blocks
    pub fn fence_tag(&self) -> &'static str {
        match self {
            ContentKind::Html => "html",
            ContentKind::Css => "css",
            ContentKind::Js => "javascript",
        }
    }

    /// Human-readable language name used in prompts
    pub fn language(&self) -> &'static str {
        match self {
            ContentKind::Html => "HTML",
            ContentKind::Css => "CSS",
            ContentKind::Js => "JavaScript",
        }
    }

    /// Parse a fence tag (`html`, `css`, `javascript`, `js`)
    pub fn from_fence_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_lowercase().as_str() {
            "html" => Some(ContentKind::Html),
            "css" => Some(ContentKind::Css),
            "javascript" | "js" => Some(ContentKind::Js),
            _ => None,
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKind::Html => write!(f, "html"),
            ContentKind::Css => write!(f, "css"),
            ContentKind::Js => write!(f, "js"),
        }
    }
}

/// A token-bounded slice of document content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    /// Zero-based position within the batch
    pub index: usize,
    /// Number of chunks in the batch
    pub total: usize,
}

impl Chunk {
    pub fn new(text: impl Into<String>, index: usize, total: usize) -> Self {
        Self {
            text: text.into(),
            index,
            total,
        }
    }

    /// Wrap a list of texts as a numbered batch
    pub fn batch(texts: Vec<String>) -> Vec<Chunk> {
        let total = texts.len();
        texts
            .into_iter()
            .enumerate()
            .map(|(index, text)| Chunk { text, index, total })
            .collect()
    }

    /// One-based position label, e.g. `2/5`
    pub fn position(&self) -> String {
        format!("{}/{}", self.index + 1, self.total)
    }
}

/// Outcome of generating one chunk
///
/// A failed generation is never absent: it carries the original text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Raw model output
    Generated(String),
    /// Original chunk text, substituted after a failure
    Fallback(String),
}

impl Completion {
    pub fn text(&self) -> &str {
        match self {
            Completion::Generated(text) | Completion::Fallback(text) => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Completion::Generated(text) | Completion::Fallback(text) => text,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Completion::Fallback(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_batch_numbers_positions() {
        let chunks = Chunk::batch(vec!["a".into(), "b".into(), "c".into()]);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1].index, 1);
        assert!(chunks.iter().all(|c| c.total == 3));
        assert_eq!(chunks[2].position(), "3/3");
    }

    #[test]
    fn test_fence_tags() {
        assert_eq!(ContentKind::Js.fence_tag(), "javascript");
        assert_eq!(ContentKind::from_fence_tag("js"), Some(ContentKind::Js));
        assert_eq!(ContentKind::from_fence_tag("HTML"), Some(ContentKind::Html));
        assert_eq!(ContentKind::from_fence_tag("json"), None);
    }

    #[test]
    fn test_document_content_by_kind() {
        let mut doc = Document::new("<p>hi</p>").with_css("p{}");
        assert_eq!(doc.content(ContentKind::Css), "p{}");
        doc.set_content(ContentKind::Js, "run()".to_string());
        assert_eq!(doc.js, "run()");
    }

    #[test]
    fn test_completion_fallback() {
        let c = Completion::Fallback("orig".to_string());
        assert!(c.is_fallback());
        assert_eq!(c.into_text(), "orig");
    }
}
