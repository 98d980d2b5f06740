//! Ollama Local LLM Provider

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use super::{CompletionProvider, ProviderConfig, http_client, status_error, transport_error};
use crate::types::{ErrorCategory, ForgeError, LlmError, Result};

const DEFAULT_API_BASE: &str = "http://localhost:11434";
const PROVIDER_NAME: &str = "ollama";

/// Ollama Local LLM Provider
pub struct OllamaProvider {
    api_base: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let api_base = config
            .api_base
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        // Validate endpoint URL for security (SSRF prevention)
        let api_base = Self::validate_endpoint(&api_base)?;

        Ok(Self {
            api_base,
            client: http_client(config.timeout_secs)?,
        })
    }

    /// Only http/https endpoints are accepted; remote hosts are allowed with a warning.
    fn validate_endpoint(endpoint: &str) -> Result<String> {
        let url = url::Url::parse(endpoint).map_err(|e| {
            ForgeError::Config(format!("Invalid Ollama endpoint URL '{}': {}", endpoint, e))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ForgeError::Config(format!(
                "Ollama endpoint must use http or https scheme, got: {}",
                url.scheme()
            )));
        }

        if let Some(host) = url.host_str()
            && !matches!(host, "localhost" | "127.0.0.1" | "::1" | "[::1]")
        {
            warn!(
                "Ollama endpoint is not localhost: {}. Ensure this is intentional.",
                host
            );
        }

        let mut result = url.to_string();
        if result.ends_with('/') {
            result.pop();
        }
        Ok(result)
    }

    fn build_request(prompt: &str, model: &str, max_tokens: u32) -> OllamaRequest {
        OllamaRequest {
            model: model.to_string(),
            prompt: prompt.to_string(),
            stream: false,
            options: OllamaOptions {
                num_predict: max_tokens,
            },
        }
    }
}

#[async_trait]
impl CompletionProvider for OllamaProvider {
    async fn generate(&self, prompt: &str, model: &str, max_tokens: u32) -> Result<String> {
        let start_time = Instant::now();
        let url = format!("{}/api/generate", self.api_base);

        let response = self
            .client
            .post(&url)
            .json(&Self::build_request(prompt, model, max_tokens))
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    ForgeError::from(LlmError::with_provider(
                        ErrorCategory::Network,
                        format!(
                            "Failed to connect to Ollama at {}. Is Ollama running? Start with: ollama serve",
                            self.api_base
                        ),
                        PROVIDER_NAME,
                    ))
                } else {
                    transport_error(e, PROVIDER_NAME)
                }
            })?;

        if !response.status().is_success() {
            return Err(status_error(response, PROVIDER_NAME).await);
        }

        let body: OllamaResponse = response
            .json()
            .await
            .map_err(|e| transport_error(e, PROVIDER_NAME))?;

        debug!(
            model,
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            eval_count = body.eval_count,
            "Ollama response received"
        );

        Ok(body.response)
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProviderConfig {
            provider: "ollama".to_string(),
            ..Default::default()
        };

        let provider = OllamaProvider::new(config).expect("Failed to create provider");
        assert_eq!(provider.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let err = OllamaProvider::validate_endpoint("file:///etc/passwd").unwrap_err();
        assert!(matches!(err, ForgeError::Config(_)));
    }

    #[test]
    fn test_request_sets_num_predict() {
        let json =
            serde_json::to_value(OllamaProvider::build_request("p", "llama3", 10000)).unwrap();
        assert_eq!(json["options"]["num_predict"], 10000);
        assert_eq!(json["stream"], false);
    }
}
