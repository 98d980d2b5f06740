//! Scraped site loading
//!
//! Reads a scraper output directory into a [`Document`]: the entry page, every
//! stylesheet and script worth regenerating (comments stripped, tiny files
//! skipped), and the static assets to copy through.

use ignore::WalkBuilder;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info};

use crate::ai::TokenCounter;
use crate::constants::document as doc_constants;
use crate::types::{ContentKind, Document, ForgeError, Result};

static BLOCK_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("block comment regex is valid"));

// `//` preceded by `:` is a URL scheme separator, not a comment
static LINE_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)(^|[^:])//.*$").expect("line comment regex is valid"));

/// Strip comments from stylesheet or script source
///
/// HTML is returned unchanged.
pub fn strip_comments(text: &str, kind: ContentKind) -> String {
    match kind {
        ContentKind::Css => BLOCK_COMMENT.replace_all(text, "").into_owned(),
        ContentKind::Js => {
            let without_blocks = BLOCK_COMMENT.replace_all(text, "");
            LINE_COMMENT.replace_all(&without_blocks, "$1").into_owned()
        }
        ContentKind::Html => text.to_string(),
    }
}

/// Reads scraper output directories
#[derive(Debug, Clone)]
pub struct DocumentLoader {
    counter: TokenCounter,
    min_asset_tokens: usize,
}

impl Default for DocumentLoader {
    fn default() -> Self {
        Self::new(doc_constants::MIN_ASSET_TOKENS)
    }
}

impl DocumentLoader {
    pub fn new(min_asset_tokens: usize) -> Self {
        Self {
            counter: TokenCounter::default(),
            min_asset_tokens,
        }
    }

    /// Measure stylesheets and scripts with `counter`
    pub fn with_counter(mut self, counter: TokenCounter) -> Self {
        self.counter = counter;
        self
    }

    /// Load the site rooted at `site_dir`
    ///
    /// Fails with [`ForgeError::MissingInput`] when `index.html` is absent.
    pub fn load(&self, site_dir: &Path) -> Result<Document> {
        let index_path = site_dir.join(doc_constants::INDEX_FILE);
        if !index_path.is_file() {
            return Err(ForgeError::MissingInput { path: index_path });
        }

        let root = site_dir.canonicalize()?;
        let html = std::fs::read_to_string(&index_path)?;

        let mut css = String::new();
        let mut js = String::new();
        let mut assets = Vec::new();
        let (mut css_files, mut js_files) = (0usize, 0usize);

        for path in Self::walk(&root) {
            let Some(ext) = extension(&path) else {
                continue;
            };

            match ext.as_str() {
                "css" => {
                    css_files += 1;
                    self.append_source(&path, ContentKind::Css, &mut css)?;
                }
                "js" => {
                    js_files += 1;
                    self.append_source(&path, ContentKind::Js, &mut js)?;
                }
                other if doc_constants::ASSET_EXTENSIONS.contains(&other) => assets.push(path),
                _ => {}
            }
        }

        info!(
            site = %root.display(),
            css_files,
            js_files,
            assets = assets.len(),
            "Loaded site"
        );

        Ok(Document {
            html,
            css,
            js,
            assets,
        })
    }

    /// Every regular file under `root`, sorted, symlinks not followed
    fn walk(root: &Path) -> Vec<PathBuf> {
        let walker = WalkBuilder::new(root)
            .standard_filters(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        walker
            .filter_map(|e| e.ok())
            .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
            .map(|entry| entry.into_path())
            .collect()
    }

    fn append_source(&self, path: &Path, kind: ContentKind, out: &mut String) -> Result<()> {
        let raw = std::fs::read_to_string(path)?;
        let stripped = strip_comments(&raw, kind);
        let tokens = self.counter.count(&stripped);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if tokens <= self.min_asset_tokens {
            debug!(file = %name, tokens, "Skipping small {} file", kind);
            return Ok(());
        }

        debug!(file = %name, tokens, "Including {} file", kind);
        match kind {
            ContentKind::Js => out.push_str(&format!("\n// {}\n", name)),
            _ => out.push_str(&format!("\n/* {} */\n", name)),
        }
        out.push_str(&stripped);
        Ok(())
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
}
