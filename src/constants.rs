//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Completion retry constants
pub mod retry {
    /// Total attempts per provider request (first try included)
    pub const MAX_ATTEMPTS: u32 = 5;

    /// Base delay for exponential backoff (milliseconds)
    pub const BASE_DELAY_MS: u64 = 5_000;

    /// Maximum delay between retries (milliseconds)
    pub const MAX_DELAY_MS: u64 = 60_000;

    /// Fixed pacing delay slept before every attempt (milliseconds)
    pub const PACING_DELAY_MS: u64 = 1_000;

    /// Extra backoff multiplier for overloaded providers
    pub const OVERLOAD_MULTIPLIER: u32 = 2;
}

/// Generation constants
pub mod generation {
    /// Default maximum completion tokens per request
    pub const DEFAULT_MAX_TOKENS: u32 = 8_000;

    /// Chunk budget is `max_tokens / CHUNK_BUDGET_DIVISOR`
    pub const CHUNK_BUDGET_DIVISOR: u32 = 2;

    /// Concurrent chunk generations per batch
    pub const DEFAULT_CONCURRENCY: usize = 2;

    /// Completion budget for the structure analysis call
    pub const STRUCTURE_MAX_TOKENS: u32 = 4_000;

    /// Completion budget for each structural section
    pub const SECTION_MAX_TOKENS: u32 = 4_000;

    /// Completion budget for single-shot whole-page generation
    pub const WHOLE_PAGE_MAX_TOKENS: u32 = 10_000;

    /// Tags treated as top-level page regions
    pub const SECTION_TAGS: &[&str] = &["header", "main", "footer", "nav", "section", "article"];
}

/// Scraper output constants
pub mod document {
    /// Entry page every scraped site must contain
    pub const INDEX_FILE: &str = "index.html";

    /// Stylesheets/scripts at or below this token count are not aggregated
    pub const MIN_ASSET_TOKENS: usize = 100;

    /// Static asset extensions copied through unchanged
    pub const ASSET_EXTENSIONS: &[&str] = &[
        "png", "jpg", "jpeg", "gif", "svg", "ico", "woff", "woff2", "ttf", "eot",
    ];

    /// Output file names
    pub const OUTPUT_HTML: &str = "index.html";
    pub const OUTPUT_CSS: &str = "styles.css";
    pub const OUTPUT_JS: &str = "script.js";
}

/// HTTP/Network constants
pub mod network {
    /// Default request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

    /// Anthropic API version header value
    pub const ANTHROPIC_VERSION: &str = "2023-06-01";
}
