//! AI Integration Layer
//!
//! Token estimation, chunking, prompt construction and the cached, retrying
//! completion client that sits in front of every provider.

pub mod chunker;
pub mod client;
pub mod prompt;
pub mod provider;
pub mod timeout;
pub mod tokenizer;

pub use chunker::ContentChunker;
pub use client::{CompletionClient, RetryPolicy};
pub use prompt::{PromptBuilder, PromptSection, PromptTemplates};
pub use provider::{
    AnthropicProvider, CompletionProvider, ErrorCategory, ErrorClassifier, LlmError,
    OllamaProvider, OpenAiProvider, ProviderConfig, SharedProvider, create_provider,
};
pub use timeout::with_timeout;
pub use tokenizer::{TokenCounter, TokenEstimator};
