//! Completion Provider Abstraction
//!
//! Defines the `CompletionProvider` trait: one stateless request carrying a
//! single user message, answered with the model's text.
//!
//! ## Backends
//!
//! - `anthropic`: Messages API
//! - `openai`: Chat Completions API (and compatible gateways)
//! - `ollama`: local models

mod anthropic;
#[cfg(test)]
pub(crate) mod mock;
mod ollama;
mod openai;

pub use anthropic::AnthropicProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

// Re-export error types from centralized location
pub use crate::types::{ErrorCategory, ErrorClassifier, LlmError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::constants::network as net_constants;
use crate::types::{ForgeError, Result};

/// Shared provider type for concurrent access across chunk workers.
pub type SharedProvider = Arc<dyn CompletionProvider + Send + Sync>;

// =============================================================================
// Provider Configuration
// =============================================================================

/// Configuration for completion providers
///
/// Note: API keys are never serialized and are redacted in debug output.
/// Each provider converts the key to `SecretString` internally.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider type: "anthropic", "openai", "ollama"
    pub provider: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// API key, never serialized to output
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// API base URL (for custom endpoints)
    #[serde(default)]
    pub api_base: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("timeout_secs", &self.timeout_secs)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            timeout_secs: net_constants::DEFAULT_TIMEOUT_SECS,
            api_key: None,
            api_base: None,
        }
    }
}

// =============================================================================
// Completion Provider Trait
// =============================================================================

/// A text completion backend
///
/// Implementations hold no conversation state: every call is independent and
/// safe to issue concurrently.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Send `prompt` as a single user message and return the reply text
    async fn generate(&self, prompt: &str, model: &str, max_tokens: u32) -> Result<String>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

/// Create a shared provider from configuration
pub fn create_provider(config: &ProviderConfig) -> Result<SharedProvider> {
    match config.provider.as_str() {
        "anthropic" => Ok(Arc::new(AnthropicProvider::new(config.clone())?)),
        "openai" => Ok(Arc::new(OpenAiProvider::new(config.clone())?)),
        "ollama" => Ok(Arc::new(OllamaProvider::new(config.clone())?)),
        _ => Err(ForgeError::Config(format!(
            "Unknown provider: {}. Supported: anthropic, openai, ollama",
            config.provider
        ))),
    }
}

/// Build an HTTP client with the configured request timeout
fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ForgeError::LlmApi(format!("Failed to create HTTP client: {}", e)))
}

/// Turn a non-success HTTP response into a categorized error
async fn status_error(response: reqwest::Response, provider: &str) -> ForgeError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    ErrorClassifier::classify_http_status(
        status.as_u16(),
        &format!("API error ({}): {}", status, body),
        provider,
    )
    .into()
}

/// Turn a transport failure into a categorized error
fn transport_error(err: reqwest::Error, provider: &str) -> ForgeError {
    let category = if err.is_timeout() || err.is_connect() {
        ErrorCategory::Network
    } else if err.is_decode() {
        ErrorCategory::ParseError
    } else {
        ErrorClassifier::classify(&err.to_string(), provider).category
    };
    LlmError::with_provider(category, format!("Request failed: {}", err), provider).into()
}
