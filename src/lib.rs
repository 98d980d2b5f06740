//! siteforge - LLM-driven website regeneration
//!
//! Takes a scraped site (an `index.html` plus stylesheets, scripts and
//! media) and rewrites it through a language model without ever exceeding
//! the model's context window.
//!
//! ## Core Features
//!
//! - **Chunked generation**: line-aligned, token-bounded chunks per content kind
//! - **Bounded concurrency**: results realigned to input order
//! - **Persistent response cache**: identical (model, prompt) pairs never re-request
//! - **Retry with backoff**: category-aware, with an extra multiplier for overload
//! - **Always a result**: failed chunks fall back to their original text
//!
//! ## Quick Start
//!
//! ```ignore
//! use siteforge::{ConfigLoader, GenerationPipeline};
//! use siteforge::ai::create_provider;
//!
//! let config = ConfigLoader::load()?;
//! let provider = create_provider(&config.llm.provider_config())?;
//! let pipeline = GenerationPipeline::new(&config, provider)?;
//! let document = pipeline.generate_website(Path::new("scraped_site")).await?;
//! save_website(&document, &config.output.dir).await?;
//! pipeline.close()?;
//! ```
//!
//! ## Modules
//!
//! - [`ai`]: providers, retrying client, prompts, token counting, chunking
//! - [`generator`]: chunk generation, dispatch, assembly, pipeline
//! - [`document`]: site loading and output writing
//! - [`storage`]: SQLite response cache
//! - [`config`]: layered configuration

pub mod ai;
pub mod cli;
pub mod config;
pub mod constants;
pub mod document;
pub mod generator;
pub mod storage;
pub mod types;

// Configuration
pub use config::{Config, ConfigLoader, Strategy};

// Error Types
pub use types::error::{ErrorCategory, ForgeError, Result, ResultExt};

// Core Types
pub use types::{CacheKey, Chunk, Completion, ContentKind, Document};

// Storage
pub use storage::{ResponseCache, SharedCache};

// Pipeline
pub use document::{DocumentLoader, save_website};
pub use generator::{
    ChunkGenerator, GenerationPipeline, ParallelDispatcher, SectionAssembler, StructureSummary,
};

// AI
pub use ai::{
    CompletionClient, CompletionProvider, ContentChunker, RetryPolicy, SharedProvider,
    TokenCounter, create_provider, with_timeout,
};
