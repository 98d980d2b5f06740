//! Per-chunk generation
//!
//! One prompt, one client round trip, and a guaranteed result: failures come
//! back as the chunk's original text rather than as errors.

use std::sync::Arc;
use tracing::{debug, warn};

use super::assembler::SectionAssembler;
use super::structure::StructureSummary;
use crate::ai::{CompletionClient, PromptTemplates};
use crate::constants::generation as gen_constants;
use crate::types::{Chunk, Completion, ContentKind};

/// Model used for each kind of content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSet {
    /// HTML chunks, structure analysis, sections and whole-page requests
    pub heavy: String,
    pub css: String,
    pub js: String,
}

impl ModelSet {
    pub fn for_kind(&self, kind: ContentKind) -> &str {
        match kind {
            ContentKind::Html => &self.heavy,
            ContentKind::Css => &self.css,
            ContentKind::Js => &self.js,
        }
    }
}

/// Turns chunks into completions through the shared client
#[derive(Debug, Clone)]
pub struct ChunkGenerator {
    client: Arc<CompletionClient>,
    models: ModelSet,
    max_tokens: u32,
}

impl ChunkGenerator {
    pub fn new(client: Arc<CompletionClient>, models: ModelSet, max_tokens: u32) -> Self {
        Self {
            client,
            models,
            max_tokens,
        }
    }

    pub fn client(&self) -> &Arc<CompletionClient> {
        &self.client
    }

    pub fn models(&self) -> &ModelSet {
        &self.models
    }

    /// Regenerate one chunk of `kind`
    pub async fn generate_chunk(&self, chunk: &Chunk, kind: ContentKind) -> Completion {
        let prompt = PromptTemplates::chunk(chunk, kind);
        let model = self.models.for_kind(kind);

        match self.client.generate(&prompt, model, self.max_tokens).await {
            Ok(reply) => {
                debug!(kind = %kind, part = %chunk.position(), "Chunk generated");
                Completion::Generated(reply)
            }
            Err(e) => {
                warn!(
                    kind = %kind,
                    part = %chunk.position(),
                    error = %e,
                    "Chunk generation failed, keeping original"
                );
                Completion::Fallback(chunk.text.clone())
            }
        }
    }

    /// Regenerate one top-level HTML section with the page summary as context
    pub async fn generate_section(&self, section: &Chunk, summary: &StructureSummary) -> Completion {
        let prompt = PromptTemplates::section(&section.text, &summary.to_context_json());

        match self
            .client
            .generate(
                &prompt,
                &self.models.heavy,
                gen_constants::SECTION_MAX_TOKENS,
            )
            .await
        {
            Ok(reply) => Completion::Generated(reply),
            Err(e) => {
                warn!(
                    part = %section.position(),
                    error = %e,
                    "Section generation failed, keeping original"
                );
                Completion::Fallback(section.text.clone())
            }
        }
    }

    /// Regenerate a whole page in a single request
    ///
    /// Returns every ```html block of the reply joined in order (a long page
    /// may come back split across several), or `html` unchanged when the
    /// request fails or the reply has no usable block.
    pub async fn generate_whole_html(&self, html: &str) -> String {
        let prompt = PromptTemplates::whole_page(html);

        match self
            .client
            .generate(
                &prompt,
                &self.models.heavy,
                gen_constants::WHOLE_PAGE_MAX_TOKENS,
            )
            .await
        {
            Ok(reply) => {
                let buffers = SectionAssembler::split_by_kind(&reply);
                let block = buffers.get(ContentKind::Html).trim();
                if block.is_empty() {
                    warn!("No HTML block in whole-page reply, keeping original");
                    html.to_string()
                } else {
                    block.to_string()
                }
            }
            Err(e) => {
                warn!(error = %e, "Whole-page generation failed, keeping original");
                html.to_string()
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::ai::RetryPolicy;
    use crate::ai::provider::mock::MockProvider;
    use crate::storage::ResponseCache;
    use crate::types::ErrorCategory;

    pub(crate) fn test_models() -> ModelSet {
        ModelSet {
            heavy: "heavy-model".to_string(),
            css: "css-model".to_string(),
            js: "js-model".to_string(),
        }
    }

    pub(crate) fn generator_with(provider: Arc<MockProvider>) -> ChunkGenerator {
        let cache = Arc::new(ResponseCache::open_in_memory().unwrap());
        let client = CompletionClient::new(provider, cache, RetryPolicy::immediate(5));
        ChunkGenerator::new(Arc::new(client), test_models(), 8000)
    }

    #[test]
    fn test_model_selection() {
        let models = test_models();
        assert_eq!(models.for_kind(ContentKind::Html), "heavy-model");
        assert_eq!(models.for_kind(ContentKind::Css), "css-model");
        assert_eq!(models.for_kind(ContentKind::Js), "js-model");
    }

    #[tokio::test]
    async fn test_generated_reply_is_raw() {
        let provider = Arc::new(MockProvider::replying("```css\nbody { color: red; }\n```"));
        let generator = generator_with(provider);

        let chunk = Chunk::new("body{color:red}", 0, 1);
        let completion = generator.generate_chunk(&chunk, ContentKind::Css).await;
        assert_eq!(
            completion,
            Completion::Generated("```css\nbody { color: red; }\n```".to_string())
        );
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_original() {
        let provider = Arc::new(MockProvider::failing(ErrorCategory::Overloaded));
        let generator = generator_with(provider.clone());

        let chunk = Chunk::new("let x = 1;", 2, 4);
        let completion = generator.generate_chunk(&chunk, ContentKind::Js).await;
        assert_eq!(completion, Completion::Fallback("let x = 1;".to_string()));
        assert_eq!(provider.calls(), 5);
    }

    #[tokio::test]
    async fn test_whole_html_extracts_block() {
        let provider = Arc::new(MockProvider::replying(
            "Sure!\n```html\n<main>new</main>\n```",
        ));
        let generator = generator_with(provider);
        assert_eq!(
            generator.generate_whole_html("<div>old</div>").await,
            "<main>new</main>"
        );
    }

    #[tokio::test]
    async fn test_whole_html_joins_split_blocks() {
        let reply = "Part one:\n```html\n<header>top</header>\n```\n```css\nh1{}\n```\nPart two:\n```html\n<footer>end</footer>\n```";
        let provider = Arc::new(MockProvider::replying(reply));
        let generator = generator_with(provider);
        assert_eq!(
            generator.generate_whole_html("<div>old</div>").await,
            "<header>top</header>\n<footer>end</footer>"
        );
    }

    #[tokio::test]
    async fn test_whole_html_without_block_keeps_original() {
        let provider = Arc::new(MockProvider::replying("I cannot help with that."));
        let generator = generator_with(provider);
        assert_eq!(
            generator.generate_whole_html("<div>old</div>").await,
            "<div>old</div>"
        );
    }
}
