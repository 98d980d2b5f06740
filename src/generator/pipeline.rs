//! End-to-end site regeneration
//!
//! Load → chunk → dispatch → assemble, per content kind. Everything after
//! loading degrades: the caller always gets a usable [`Document`] back.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::assembler::SectionAssembler;
use super::chunk::ChunkGenerator;
use super::dispatch::ParallelDispatcher;
use super::sections::SectionSplitter;
use super::structure::{StructureAnalyzer, StructureSummary};
use crate::ai::{CompletionClient, ContentChunker, SharedProvider, TokenCounter};
use crate::config::{Config, ConfigLoader, Strategy};
use crate::document::DocumentLoader;
use crate::storage::{ResponseCache, SharedCache};
use crate::types::{ContentKind, Document, ForgeError, Result};

/// Owns the shared cache and every stage of a generation run
pub struct GenerationPipeline {
    cache: SharedCache,
    generator: ChunkGenerator,
    analyzer: StructureAnalyzer,
    dispatcher: ParallelDispatcher,
    chunker: ContentChunker,
    loader: DocumentLoader,
    strategy: Strategy,
    chunk_assets: bool,
    chunk_budget: usize,
}

impl GenerationPipeline {
    /// Open the response cache configured for `config` and wire up the stages
    pub fn new(config: &Config, provider: SharedProvider) -> Result<Self> {
        let cache_path = ConfigLoader::cache_path(config);
        let cache = Arc::new(ResponseCache::open(&cache_path)?);
        Ok(Self::with_cache(config, provider, cache))
    }

    /// Build around an already opened cache
    pub fn with_cache(config: &Config, provider: SharedProvider, cache: SharedCache) -> Self {
        let client = Arc::new(CompletionClient::new(
            provider,
            Arc::clone(&cache),
            config.retry.policy(),
        ));
        let models = config.llm.models();
        let counter = TokenCounter::new(config.generation.estimator);

        Self {
            analyzer: StructureAnalyzer::new(Arc::clone(&client), models.heavy.clone()),
            generator: ChunkGenerator::new(client, models, config.llm.max_tokens),
            cache,
            dispatcher: ParallelDispatcher::new(config.generation.concurrency),
            chunker: ContentChunker::new(counter),
            loader: DocumentLoader::new(config.generation.min_asset_tokens).with_counter(counter),
            strategy: config.generation.strategy,
            chunk_assets: config.generation.chunk_assets,
            chunk_budget: config.llm.chunk_budget(),
        }
    }

    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Load the scraped site in `site_dir` and regenerate it
    ///
    /// Only loading errors propagate. Any later failure is logged and the
    /// loaded document is returned as is.
    pub async fn generate_website(&self, site_dir: &Path) -> Result<Document> {
        let document = self.loader.load(site_dir)?;
        let started = Instant::now();

        info!(
            site = %site_dir.display(),
            strategy = %self.strategy,
            html_bytes = document.html.len(),
            css_bytes = document.css.len(),
            js_bytes = document.js.len(),
            assets = document.assets.len(),
            "Starting generation"
        );

        match self.regenerate(&document).await {
            Ok(generated) => {
                info!(elapsed_ms = started.elapsed().as_millis() as u64, "Generation complete");
                Ok(generated)
            }
            Err(e) => {
                warn!(error = %e, "Generation failed, returning original site");
                Ok(document)
            }
        }
    }

    /// Regenerate an in-memory document
    pub async fn regenerate(&self, document: &Document) -> Result<Document> {
        if self.cache.is_closed() {
            return Err(ForgeError::Storage(
                "Pipeline used after close".to_string(),
            ));
        }

        let mut generated = document.clone();

        let html = match self.strategy {
            Strategy::Chunked => self.regenerate_chunked(&document.html, ContentKind::Html).await,
            Strategy::Structural => self.regenerate_structural(&document.html).await,
        };
        generated.set_content(ContentKind::Html, keep_if_blank(html, &document.html));

        if self.chunk_assets {
            for kind in [ContentKind::Css, ContentKind::Js] {
                let original = document.content(kind);
                if original.trim().is_empty() {
                    continue;
                }
                let content = self.regenerate_chunked(original, kind).await;
                generated.set_content(kind, keep_if_blank(content, original));
            }
        }

        Ok(generated)
    }

    async fn regenerate_chunked(&self, content: &str, kind: ContentKind) -> String {
        let chunks = self.chunker.chunk(content, self.chunk_budget);
        info!(kind = %kind, chunks = chunks.len(), "Regenerating in chunks");

        let generator = self.generator.clone();
        let completions = self
            .dispatcher
            .dispatch(&chunks, move |chunk| {
                let generator = generator.clone();
                async move { Ok(generator.generate_chunk(&chunk, kind).await) }
            })
            .await;

        SectionAssembler::assemble(&chunks, &completions, kind)
    }

    async fn regenerate_structural(&self, html: &str) -> String {
        let summary = match self.analyzer.analyze(html).await {
            Ok(summary) => Arc::new(summary),
            Err(e) => {
                warn!(error = %e, "Structure analysis failed, regenerating whole page");
                return self.generator.generate_whole_html(html).await;
            }
        };

        let sections = SectionSplitter::split_chunks(html);
        if sections.is_empty() {
            warn!("No sections found, regenerating whole page");
            return self.generator.generate_whole_html(html).await;
        }

        info!(sections = sections.len(), "Regenerating by section");
        let generator = self.generator.clone();
        let completions = self
            .dispatcher
            .dispatch(&sections, move |section| {
                let generator = generator.clone();
                let summary: Arc<StructureSummary> = Arc::clone(&summary);
                async move { Ok(generator.generate_section(&section, &summary).await) }
            })
            .await;

        SectionAssembler::assemble(&sections, &completions, ContentKind::Html)
    }

    /// Close the shared cache; later calls are no-ops
    pub fn close(&self) -> Result<bool> {
        let closed = self.cache.close()?;
        if closed {
            debug!("Pipeline closed");
        }
        Ok(closed)
    }
}

fn keep_if_blank(generated: String, original: &str) -> String {
    if generated.trim().is_empty() {
        original.to_string()
    } else {
        generated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::mock::MockProvider;
    use crate::types::ErrorCategory;
    use std::time::Duration;
    use tempfile::TempDir;

    const SUMMARY: &str = r#"{"main_sections":["header","main","footer"],"key_components":[],"critical_functionality":[],"dependencies":[]}"#;

    fn test_config(strategy: Strategy) -> Config {
        let mut config = Config::default();
        config.generation.strategy = strategy;
        config.retry.base_delay_ms = 0;
        config.retry.max_delay_ms = 0;
        config.retry.pacing_delay_ms = 0;
        config
    }

    fn pipeline(config: &Config, provider: Arc<MockProvider>) -> GenerationPipeline {
        let cache = Arc::new(ResponseCache::open_in_memory().unwrap());
        GenerationPipeline::with_cache(config, provider, cache)
    }

    /// Uppercases the first html block of the prompt
    fn shouting(prompt: &str) -> Result<String> {
        let block = SectionAssembler::extract_fenced_block(prompt, ContentKind::Html)
            .or_else(|| SectionAssembler::extract_fenced_block(prompt, ContentKind::Css))
            .unwrap_or_default();
        let tag = if prompt.contains("```css") { "css" } else { "html" };
        Ok(format!("Done:\n```{}\n{}\n```", tag, block.to_uppercase()))
    }

    fn site_with(html: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("index.html"), html).unwrap();
        dir
    }

    fn many_lines() -> String {
        (0..40)
            .map(|i| format!("<p>line {}</p>", i))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[tokio::test]
    async fn test_chunked_preserves_order_and_caches() {
        let html = many_lines();
        let site = site_with(&html);

        let mut config = test_config(Strategy::Chunked);
        config.llm.max_tokens = 20;
        let provider = Arc::new(MockProvider::new(shouting).with_delay(Duration::from_millis(5)));
        let pipeline = pipeline(&config, provider.clone());

        let first = pipeline.generate_website(site.path()).await.unwrap();
        assert_eq!(first.html, html.to_uppercase());

        let calls = provider.calls();
        assert!(calls > 1);

        let second = pipeline.generate_website(site.path()).await.unwrap();
        assert_eq!(second.html, first.html);
        assert_eq!(provider.calls(), calls);
    }

    #[tokio::test]
    async fn test_provider_failure_returns_original() {
        let html = many_lines();
        let site = site_with(&html);

        let mut config = test_config(Strategy::Chunked);
        config.retry.max_attempts = 2;
        let provider = Arc::new(MockProvider::failing(ErrorCategory::RateLimit));
        let pipeline = pipeline(&config, provider);

        let document = pipeline.generate_website(site.path()).await.unwrap();
        assert_eq!(document.html, html);
    }

    #[tokio::test]
    async fn test_one_failing_chunk_keeps_its_original() {
        let html = many_lines();
        let site = site_with(&html);

        let mut config = test_config(Strategy::Chunked);
        config.llm.max_tokens = 20;
        let provider = Arc::new(MockProvider::new(|prompt: &str| {
            if prompt.contains("<p>line 3</p>") {
                Err(crate::types::LlmError::new(ErrorCategory::Overloaded, "busy").into())
            } else {
                shouting(prompt)
            }
        }));
        let pipeline = pipeline(&config, provider.clone());

        let document = pipeline.generate_website(site.path()).await.unwrap();
        let expected: Vec<String> = html
            .split('\n')
            .map(|line| {
                if line == "<p>line 3</p>" {
                    line.to_string()
                } else {
                    line.to_uppercase()
                }
            })
            .collect();
        assert_eq!(document.html, expected.join("\n"));
        // 39 single successes plus 5 attempts for the failing chunk
        assert_eq!(provider.calls(), 44);
    }

    #[tokio::test]
    async fn test_missing_index_is_an_error() {
        let site = TempDir::new().unwrap();
        let provider = Arc::new(MockProvider::new(shouting));
        let pipeline = pipeline(&test_config(Strategy::Chunked), provider.clone());

        let err = pipeline.generate_website(site.path()).await.unwrap_err();
        assert!(matches!(err, ForgeError::MissingInput { .. }));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_closed_pipeline_degrades_to_original() {
        let site = site_with("<p>keep me</p>");
        let provider = Arc::new(MockProvider::new(shouting));
        let pipeline = pipeline(&test_config(Strategy::Chunked), provider.clone());

        assert!(pipeline.close().unwrap());
        assert!(!pipeline.close().unwrap());

        let document = pipeline.generate_website(site.path()).await.unwrap();
        assert_eq!(document.html, "<p>keep me</p>");
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_assets_pass_through_by_default() {
        let provider = Arc::new(MockProvider::new(shouting));
        let pipeline = pipeline(&test_config(Strategy::Chunked), provider.clone());

        let document = Document::new("<p>a</p>").with_css("p { color: red; }");
        let generated = pipeline.regenerate(&document).await.unwrap();
        assert_eq!(generated.html, "<P>A</P>");
        assert_eq!(generated.css, "p { color: red; }");
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_chunk_assets_regenerates_css() {
        let mut config = test_config(Strategy::Chunked);
        config.generation.chunk_assets = true;
        let provider = Arc::new(MockProvider::new(shouting));
        let pipeline = pipeline(&config, provider.clone());

        let document = Document::new("<p>a</p>").with_css("p { color: red; }");
        let generated = pipeline.regenerate(&document).await.unwrap();
        assert_eq!(generated.css, "P { COLOR: RED; }");
        // Empty script is skipped
        assert_eq!(generated.js, "");
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_structural_regenerates_sections() {
        let provider = Arc::new(MockProvider::new(|prompt: &str| {
            if prompt.contains("structural summary") {
                Ok(SUMMARY.to_string())
            } else {
                shouting(prompt)
            }
        }));
        let pipeline = pipeline(&test_config(Strategy::Structural), provider.clone());

        let html = "<html><body><header>h</header><main>m</main><footer>f</footer></body></html>";
        let generated = pipeline.regenerate(&Document::new(html)).await.unwrap();

        assert_eq!(
            generated.html,
            "<HEADER>H</HEADER>\n<MAIN>M</MAIN>\n<FOOTER>F</FOOTER>"
        );
        // One analysis call plus one per section
        assert_eq!(provider.calls(), 4);
    }

    #[tokio::test]
    async fn test_structural_without_sections_uses_whole_page() {
        let provider = Arc::new(MockProvider::new(|prompt: &str| {
            if prompt.contains("structural summary") {
                Ok(SUMMARY.to_string())
            } else {
                shouting(prompt)
            }
        }));
        let pipeline = pipeline(&test_config(Strategy::Structural), provider.clone());

        let html = "<html><body><p>plain</p></body></html>";
        let generated = pipeline.regenerate(&Document::new(html)).await.unwrap();

        assert_eq!(generated.html, html.to_uppercase());
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_failed_analysis_uses_whole_page() {
        let provider = Arc::new(MockProvider::new(|prompt: &str| {
            if prompt.contains("structural summary") {
                Ok("I could not analyze this page.".to_string())
            } else {
                shouting(prompt)
            }
        }));
        let pipeline = pipeline(&test_config(Strategy::Structural), provider.clone());

        let html = "<html><body><main>m</main></body></html>";
        let generated = pipeline.regenerate(&Document::new(html)).await.unwrap();

        assert_eq!(generated.html, html.to_uppercase());
        assert_eq!(provider.calls(), 2);
    }
}
