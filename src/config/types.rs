//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/siteforge/) and project (.siteforge/) level configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::ai::{ProviderConfig, RetryPolicy, TokenEstimator};
use crate::constants::{
    document as doc_constants, generation as gen_constants, network as net_constants,
    retry as retry_constants,
};
use crate::generator::ModelSet;
use crate::types::{ForgeError, Result};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LLM provider and model settings
    pub llm: LlmConfig,

    /// Generation strategy settings
    pub generation: GenerationConfig,

    /// Retry and backoff settings
    pub retry: RetryConfig,

    /// Response cache settings
    pub cache: CacheConfig,

    /// Output settings
    pub output: OutputConfig,
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `ForgeError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        if self.llm.max_tokens == 0 {
            return Err(ForgeError::Config(
                "LLM max_tokens must be greater than 0".to_string(),
            ));
        }

        if self.llm.timeout_secs == 0 {
            return Err(ForgeError::Config(
                "LLM timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.generation.concurrency == 0 {
            return Err(ForgeError::Config(
                "Generation concurrency must be greater than 0".to_string(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(ForgeError::Config(
                "Retry max_attempts must be greater than 0".to_string(),
            ));
        }

        if self.retry.request_timeout_secs == 0 {
            return Err(ForgeError::Config(
                "Retry request_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.retry.overload_multiplier == 0 {
            return Err(ForgeError::Config(
                "Retry overload_multiplier must be at least 1".to_string(),
            ));
        }

        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(ForgeError::Config(format!(
                "Retry base_delay_ms ({}) must not exceed max_delay_ms ({})",
                self.retry.base_delay_ms, self.retry.max_delay_ms
            )));
        }

        Ok(())
    }
}

// =============================================================================
// LLM Configuration
// =============================================================================

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name: anthropic, openai, ollama
    pub provider: String,

    /// API key; prefer the provider's environment variable
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Custom API endpoint
    pub api_base: Option<String>,

    /// Model for HTML, structure analysis and whole-page requests
    pub model_heavy: String,

    /// Model for stylesheet chunks
    pub model_css: String,

    /// Model for script chunks
    pub model_js: String,

    /// Completion budget per chunk request; chunks are cut at half of this
    pub max_tokens: u32,

    /// HTTP request timeout in seconds
    pub timeout_secs: u64,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("model_heavy", &self.model_heavy)
            .field("model_css", &self.model_css)
            .field("model_js", &self.model_js)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            api_key: None,
            api_base: None,
            model_heavy: "claude-3-5-sonnet-20241022".to_string(),
            model_css: "claude-3-5-haiku-20241022".to_string(),
            model_js: "claude-3-5-haiku-20241022".to_string(),
            max_tokens: gen_constants::DEFAULT_MAX_TOKENS,
            timeout_secs: net_constants::DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl LlmConfig {
    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            provider: self.provider.clone(),
            timeout_secs: self.timeout_secs,
            api_key: self.api_key.clone(),
            api_base: self.api_base.clone(),
        }
    }

    pub fn models(&self) -> ModelSet {
        ModelSet {
            heavy: self.model_heavy.clone(),
            css: self.model_css.clone(),
            js: self.model_js.clone(),
        }
    }

    /// Token budget per chunk
    pub fn chunk_budget(&self) -> usize {
        (self.max_tokens / gen_constants::CHUNK_BUDGET_DIVISOR).max(1) as usize
    }
}

// =============================================================================
// Generation Configuration
// =============================================================================

/// How the HTML page is regenerated
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Token-bounded line chunks
    #[default]
    Chunked,
    /// Structure analysis, then one request per semantic section
    Structural,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Chunked => write!(f, "chunked"),
            Strategy::Structural => write!(f, "structural"),
        }
    }
}

impl std::str::FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chunked" => Ok(Strategy::Chunked),
            "structural" => Ok(Strategy::Structural),
            _ => Err(format!(
                "Unknown strategy: {}. Valid values: chunked, structural",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub strategy: Strategy,

    /// Regenerate stylesheets and scripts too, instead of passing them through
    pub chunk_assets: bool,

    /// Chunk requests in flight at once
    pub concurrency: usize,

    /// Stylesheets/scripts at or below this many tokens are not loaded
    pub min_asset_tokens: usize,

    /// Token estimate used for chunk budgets and the asset threshold:
    /// code_aware, char_based or word_based
    pub estimator: TokenEstimator,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Chunked,
            chunk_assets: false,
            concurrency: gen_constants::DEFAULT_CONCURRENCY,
            min_asset_tokens: doc_constants::MIN_ASSET_TOKENS,
            estimator: TokenEstimator::default(),
        }
    }
}

// =============================================================================
// Retry Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Slept before every attempt, including the first
    pub pacing_delay_ms: u64,
    pub overload_multiplier: u32,
    /// Bound on each attempt, pacing excluded; `llm.timeout_secs` is the
    /// HTTP client's own limit underneath it
    pub request_timeout_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: retry_constants::MAX_ATTEMPTS,
            base_delay_ms: retry_constants::BASE_DELAY_MS,
            max_delay_ms: retry_constants::MAX_DELAY_MS,
            pacing_delay_ms: retry_constants::PACING_DELAY_MS,
            overload_multiplier: retry_constants::OVERLOAD_MULTIPLIER,
            request_timeout_secs: net_constants::DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            pacing_delay: Duration::from_millis(self.pacing_delay_ms),
            overload_multiplier: self.overload_multiplier,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

// =============================================================================
// Cache & Output Configuration
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache database file; defaults to the user cache directory
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory generated sites are written to
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("generated_website"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
