//! Generate Command
//!
//! Regenerate a scraped site and write the result.
//!
//! Usage:
//!   siteforge generate <SITE_DIR> [-o DIR] [--provider P] [--model M]
//!                      [--structural] [--chunk-assets] [--concurrency N]

use std::path::PathBuf;
use std::time::Instant;

use tracing::info;

use crate::ai::create_provider;
use crate::cli::Output;
use crate::config::{Config, ConfigLoader, Strategy};
use crate::document::save_website;
use crate::generator::GenerationPipeline;
use crate::types::Result;

/// Command-line overrides for a generation run
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Scraped site directory containing index.html
    pub site_dir: PathBuf,
    /// Output directory override
    pub output: Option<PathBuf>,
    /// LLM provider override
    pub provider: Option<String>,
    /// Model override for every content kind
    pub model: Option<String>,
    /// Use the structural strategy
    pub structural: bool,
    /// Regenerate stylesheets and scripts too
    pub chunk_assets: bool,
    /// Concurrent request override
    pub concurrency: Option<usize>,
    pub quiet: bool,
}

impl GenerateOptions {
    /// Layer the flags over the loaded configuration
    pub fn apply(&self, config: &mut Config) {
        if let Some(ref provider) = self.provider {
            config.llm.provider = provider.clone();
        }
        if let Some(ref model) = self.model {
            config.llm.model_heavy = model.clone();
            config.llm.model_css = model.clone();
            config.llm.model_js = model.clone();
        }
        if self.structural {
            config.generation.strategy = Strategy::Structural;
        }
        if self.chunk_assets {
            config.generation.chunk_assets = true;
        }
        if let Some(concurrency) = self.concurrency {
            config.generation.concurrency = concurrency;
        }
        if let Some(ref output) = self.output {
            config.output.dir = output.clone();
        }
    }
}

pub async fn run(options: GenerateOptions) -> Result<()> {
    let out = Output::quiet(options.quiet);

    let mut config = ConfigLoader::load()?;
    options.apply(&mut config);
    config.validate()?;

    let provider = create_provider(&config.llm.provider_config())?;
    let pipeline = GenerationPipeline::new(&config, provider)?;

    out.info(&format!(
        "Generating {} ({} strategy, provider {})",
        options.site_dir.display(),
        config.generation.strategy,
        config.llm.provider
    ));

    let started = Instant::now();
    let result = pipeline.generate_website(&options.site_dir).await;
    pipeline.close()?;
    let document = result?;

    let saved = save_website(&document, &config.output.dir).await?;
    info!(output = %saved.display(), "Site written");

    out.success("Website generated");
    out.detail("Output", saved.display());
    out.detail("Assets", document.assets.len());
    out.detail("Elapsed", format!("{:.1}s", started.elapsed().as_secs_f64()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let options = GenerateOptions {
            site_dir: PathBuf::from("site"),
            output: Some(PathBuf::from("out")),
            provider: Some("ollama".to_string()),
            model: Some("llama3".to_string()),
            structural: true,
            chunk_assets: true,
            concurrency: Some(6),
            quiet: true,
        };

        let mut config = Config::default();
        options.apply(&mut config);

        assert_eq!(config.llm.provider, "ollama");
        assert_eq!(config.llm.model_heavy, "llama3");
        assert_eq!(config.llm.model_js, "llama3");
        assert_eq!(config.generation.strategy, Strategy::Structural);
        assert!(config.generation.chunk_assets);
        assert_eq!(config.generation.concurrency, 6);
        assert_eq!(config.output.dir, PathBuf::from("out"));
    }

    #[test]
    fn test_no_flags_keep_config() {
        let options = GenerateOptions::default();
        let mut config = Config::default();
        options.apply(&mut config);

        assert_eq!(config.llm.provider, "anthropic");
        assert_eq!(config.generation.strategy, Strategy::Chunked);
        assert_eq!(config.output.dir, PathBuf::from("generated_website"));
    }

    #[test]
    fn test_zero_concurrency_flag_fails_validation() {
        let options = GenerateOptions {
            concurrency: Some(0),
            ..Default::default()
        };
        let mut config = Config::default();
        options.apply(&mut config);
        assert!(config.validate().is_err());
    }
}
