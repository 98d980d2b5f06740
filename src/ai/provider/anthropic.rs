//! Anthropic Messages API Provider

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use super::{CompletionProvider, ProviderConfig, http_client, status_error, transport_error};
use crate::constants::network as net_constants;
use crate::types::{ErrorCategory, ForgeError, LlmError, Result};

const DEFAULT_API_BASE: &str = "https://api.anthropic.com";
const PROVIDER_NAME: &str = "anthropic";

/// Anthropic provider with secure API key handling
pub struct AnthropicProvider {
    api_key: SecretString,
    api_base: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl AnthropicProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let api_key_str = config
            .api_key
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
            .ok_or_else(|| {
                ForgeError::Config(
                    "Anthropic API key not found. Set ANTHROPIC_API_KEY env var or provide in config"
                        .to_string(),
                )
            })?;

        let api_base = config
            .api_base
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            api_key: SecretString::from(api_key_str),
            api_base,
            client: http_client(config.timeout_secs)?,
        })
    }

    fn build_request(prompt: &str, model: &str, max_tokens: u32) -> MessagesRequest {
        MessagesRequest {
            model: model.to_string(),
            max_tokens,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        }
    }
}

#[async_trait]
impl CompletionProvider for AnthropicProvider {
    async fn generate(&self, prompt: &str, model: &str, max_tokens: u32) -> Result<String> {
        let start_time = Instant::now();
        let url = format!("{}/v1/messages", self.api_base);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", net_constants::ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&Self::build_request(prompt, model, max_tokens))
            .send()
            .await
            .map_err(|e| transport_error(e, PROVIDER_NAME))?;

        if !response.status().is_success() {
            return Err(status_error(response, PROVIDER_NAME).await);
        }

        let body: MessagesResponse = response
            .json()
            .await
            .map_err(|e| transport_error(e, PROVIDER_NAME))?;

        debug!(
            model,
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            output_tokens = body.usage.as_ref().map(|u| u.output_tokens),
            "Anthropic response received"
        );

        body.first_text().ok_or_else(|| {
            LlmError::with_provider(
                ErrorCategory::ParseError,
                "No text content in Anthropic response",
                PROVIDER_NAME,
            )
            .into()
        })
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<Usage>,
}

impl MessagesResponse {
    fn first_text(self) -> Option<String> {
        self.content.into_iter().next().and_then(|block| block.text)
    }
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    output_tokens: u32,
}
