//! Cached, retrying completion client
//!
//! Every completion goes through here:
//!
//! 1. Fingerprint `(model, prompt)` and consult the response cache
//! 2. On a miss, sleep the pacing delay and call the provider under a timeout
//! 3. On failure, back off exponentially (harder when the provider is
//!    overloaded) and try again, up to `max_attempts` in total
//! 4. Store a successful reply before returning it
//!
//! The error category only changes how a failure is logged. Every error is
//! retried the same way, and the last one propagates once attempts run out.

use std::sync::Arc;
use std::time::Duration;

use tokio::task;
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};

use super::provider::SharedProvider;
use super::timeout::with_timeout;
use crate::constants::{network as net_constants, retry as retry_constants};
use crate::storage::SharedCache;
use crate::types::{CacheKey, ErrorCategory, ErrorClassifier, ForgeError, Result};

// =============================================================================
// Retry Policy
// =============================================================================

/// Retry, pacing and backoff parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, first try included
    pub max_attempts: u32,
    /// Backoff after the first failure
    pub base_delay: Duration,
    /// Upper bound for any single backoff
    pub max_delay: Duration,
    /// Fixed delay before every attempt
    pub pacing_delay: Duration,
    /// Backoff multiplier for overloaded providers
    pub overload_multiplier: u32,
    /// Bound on each individual provider call
    pub request_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: retry_constants::MAX_ATTEMPTS,
            base_delay: Duration::from_millis(retry_constants::BASE_DELAY_MS),
            max_delay: Duration::from_millis(retry_constants::MAX_DELAY_MS),
            pacing_delay: Duration::from_millis(retry_constants::PACING_DELAY_MS),
            overload_multiplier: retry_constants::OVERLOAD_MULTIPLIER,
            request_timeout: Duration::from_secs(net_constants::DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl RetryPolicy {
    /// No sleeping at all; used by tests and dry runs
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            pacing_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Delay after failed attempt `attempt` (0-based)
    ///
    /// `min(base * 2^attempt, max)`, multiplied again for overloaded
    /// providers and re-capped at `max`.
    pub fn backoff(&self, attempt: u32, category: ErrorCategory) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        let delay = self.base_delay.saturating_mul(factor).min(self.max_delay);

        if category.needs_extra_backoff() {
            delay
                .saturating_mul(self.overload_multiplier)
                .min(self.max_delay)
        } else {
            delay
        }
    }
}

// =============================================================================
// Completion Client
// =============================================================================

/// Provider + response cache + retry policy
#[derive(Clone)]
pub struct CompletionClient {
    provider: SharedProvider,
    cache: SharedCache,
    policy: RetryPolicy,
}

impl std::fmt::Debug for CompletionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionClient")
            .field("provider", &self.provider.name())
            .field("policy", &self.policy)
            .finish()
    }
}

impl CompletionClient {
    pub fn new(provider: SharedProvider, cache: SharedCache, policy: RetryPolicy) -> Self {
        Self {
            provider,
            cache,
            policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    /// Complete `prompt` with `model`, from cache when possible
    #[instrument(skip(self, prompt), fields(provider = self.provider.name(), prompt_len = prompt.len()))]
    pub async fn generate(&self, prompt: &str, model: &str, max_tokens: u32) -> Result<String> {
        let key = CacheKey::for_request(model, prompt);

        if let Some(cached) = self.cached(&key).await? {
            debug!(key = %key, "Using cached response");
            return Ok(cached);
        }

        let provider_name = self.provider.name();
        let mut last_error: Option<ForgeError> = None;

        for attempt in 0..self.policy.max_attempts {
            if !self.policy.pacing_delay.is_zero() {
                sleep(self.policy.pacing_delay).await;
            }

            debug!(
                attempt = attempt + 1,
                max_attempts = self.policy.max_attempts,
                "Completion attempt"
            );

            let result = with_timeout(
                self.policy.request_timeout,
                self.provider.generate(prompt, model, max_tokens),
                "completion request",
            )
            .await;

            match result {
                Ok(text) => {
                    self.store(&key, model, &text).await?;
                    return Ok(text);
                }
                Err(err) => {
                    let classified = ErrorClassifier::classify_forge_error(&err, provider_name);

                    if attempt + 1 >= self.policy.max_attempts {
                        error!(
                            attempts = self.policy.max_attempts,
                            category = %classified.category,
                            error = %err,
                            "Completion failed after all attempts"
                        );
                        last_error = Some(err);
                        break;
                    }

                    let delay = self.policy.backoff(attempt, classified.category);
                    match classified.category {
                        ErrorCategory::RateLimit => warn!(
                            attempt = attempt + 1,
                            delay_ms = delay.as_millis() as u64,
                            "Rate limited, backing off"
                        ),
                        ErrorCategory::Overloaded => warn!(
                            attempt = attempt + 1,
                            delay_ms = delay.as_millis() as u64,
                            "Provider overloaded, backing off"
                        ),
                        _ => warn!(
                            attempt = attempt + 1,
                            delay_ms = delay.as_millis() as u64,
                            category = %classified.category,
                            error = %err,
                            "Completion attempt failed, retrying"
                        ),
                    }

                    last_error = Some(err);
                    if !delay.is_zero() {
                        sleep(delay).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ForgeError::Config("Retry policy allows zero attempts".to_string())
        }))
    }

    // SQLite calls block, so they run off the async worker threads

    async fn cached(&self, key: &CacheKey) -> Result<Option<String>> {
        let cache = Arc::clone(&self.cache);
        let key = key.clone();
        task::spawn_blocking(move || cache.get(&key))
            .await
            .map_err(|e| ForgeError::Storage(format!("Cache lookup task failed: {}", e)))?
    }

    async fn store(&self, key: &CacheKey, model: &str, text: &str) -> Result<()> {
        let cache = Arc::clone(&self.cache);
        let (key, model, text) = (key.clone(), model.to_string(), text.to_string());
        task::spawn_blocking(move || cache.put(&key, &model, &text))
            .await
            .map_err(|e| ForgeError::Storage(format!("Cache write task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::mock::MockProvider;
    use crate::storage::ResponseCache;

    fn client_with(provider: Arc<MockProvider>, policy: RetryPolicy) -> CompletionClient {
        let cache = Arc::new(ResponseCache::open_in_memory().unwrap());
        CompletionClient::new(provider, cache, policy)
    }

    #[test]
    fn test_backoff_formula() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.backoff(0, ErrorCategory::RateLimit),
            Duration::from_secs(5)
        );
        assert_eq!(
            policy.backoff(1, ErrorCategory::Unknown),
            Duration::from_secs(10)
        );
        assert_eq!(
            policy.backoff(3, ErrorCategory::Network),
            Duration::from_secs(40)
        );
        assert_eq!(
            policy.backoff(4, ErrorCategory::Network),
            Duration::from_secs(60)
        );
    }

    #[test]
    fn test_overload_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.backoff(0, ErrorCategory::Overloaded),
            Duration::from_secs(10)
        );
        assert_eq!(
            policy.backoff(2, ErrorCategory::Overloaded),
            Duration::from_secs(40)
        );
        assert_eq!(
            policy.backoff(3, ErrorCategory::Overloaded),
            Duration::from_secs(60)
        );
    }

    #[test]
    fn test_backoff_never_overflows() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.backoff(u32::MAX, ErrorCategory::Overloaded),
            policy.max_delay
        );
    }

    #[tokio::test]
    async fn test_cache_hit_skips_provider() {
        let provider = Arc::new(MockProvider::replying("body { color: red; }"));
        let client = client_with(provider.clone(), RetryPolicy::immediate(5));

        let first = client.generate("prompt", "model", 100).await.unwrap();
        let second = client.generate("prompt", "model", 100).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_different_model_is_a_miss() {
        let provider = Arc::new(MockProvider::replying("x"));
        let client = client_with(provider.clone(), RetryPolicy::immediate(5));

        client.generate("prompt", "model-a", 100).await.unwrap();
        client.generate("prompt", "model-b", 100).await.unwrap();

        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let provider = Arc::new(
            MockProvider::replying("ok")
                .with_failures(&[ErrorCategory::RateLimit, ErrorCategory::Overloaded]),
        );
        let client = client_with(provider.clone(), RetryPolicy::immediate(5));

        let text = client.generate("prompt", "model", 100).await.unwrap();
        assert_eq!(text, "ok");
        assert_eq!(provider.calls(), 3);

        let key = CacheKey::for_request("model", "prompt");
        assert_eq!(client.cache().get(&key).unwrap().as_deref(), Some("ok"));
    }

    #[tokio::test]
    async fn test_every_category_is_retried() {
        let provider = Arc::new(
            MockProvider::replying("ok")
                .with_failures(&[ErrorCategory::Auth, ErrorCategory::BadRequest]),
        );
        let client = client_with(provider.clone(), RetryPolicy::immediate(5));

        assert_eq!(client.generate("p", "m", 10).await.unwrap(), "ok");
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_exhausted_attempts_propagate_last_error() {
        let provider = Arc::new(MockProvider::failing(ErrorCategory::RateLimit));
        let client = client_with(provider.clone(), RetryPolicy::immediate(5));

        let err = client.generate("prompt", "model", 100).await.unwrap_err();
        assert_eq!(err.category(), Some(ErrorCategory::RateLimit));
        assert_eq!(provider.calls(), 5);
        assert!(client.cache().is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_timeout_counts_as_failed_attempt() {
        let provider = Arc::new(MockProvider::replying("late").with_delay(Duration::from_secs(5)));
        let policy = RetryPolicy {
            request_timeout: Duration::from_millis(10),
            ..RetryPolicy::immediate(2)
        };
        let client = client_with(provider.clone(), policy);

        let err = client.generate("prompt", "model", 100).await.unwrap_err();
        assert!(matches!(err, ForgeError::Timeout { .. }));
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_closed_cache_error_propagates() {
        let provider = Arc::new(MockProvider::replying("ok"));
        let client = client_with(provider.clone(), RetryPolicy::immediate(5));
        client.cache().close().unwrap();

        let err = client.generate("prompt", "model", 100).await.unwrap_err();
        assert!(matches!(err, ForgeError::Storage(_)));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_requests_share_cache() {
        let provider = Arc::new(MockProvider::new(|prompt| Ok(prompt.to_uppercase())));
        let client = client_with(provider.clone(), RetryPolicy::immediate(3));

        let prompts: Vec<String> = (0..8).map(|i| format!("prompt {}", i)).collect();
        let first = futures::future::join_all(
            prompts.iter().map(|p| client.generate(p, "model", 100)),
        )
        .await;
        let second = futures::future::join_all(
            prompts.iter().map(|p| client.generate(p, "model", 100)),
        )
        .await;

        for (i, (a, b)) in first.into_iter().zip(second).enumerate() {
            let expected = format!("PROMPT {}", i);
            assert_eq!(a.unwrap(), expected);
            assert_eq!(b.unwrap(), expected);
        }
        assert_eq!(provider.calls(), 8);
        assert_eq!(client.cache().len().unwrap(), 8);
    }
}
