pub mod document;
pub mod error;

pub use document::{Chunk, Completion, ContentKind, Document};
pub use error::{ErrorCategory, ErrorClassifier, ForgeError, LlmError, Result, ResultExt};

// =============================================================================
// Domain Newtypes
// =============================================================================

use sha2::{Digest, Sha256};
use std::fmt;

/// Fingerprint of a (model, prompt) pair used as the response cache key
///
/// SHA-256 over `model` followed by `prompt`, hex encoded. Identical pairs
/// always produce the same key, across processes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn for_request(model: &str, prompt: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(model.as_bytes());
        hasher.update(prompt.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_is_deterministic() {
        let a = CacheKey::for_request("claude-3-5-sonnet", "body{color:red}");
        let b = CacheKey::for_request("claude-3-5-sonnet", "body{color:red}");
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn test_cache_key_depends_on_model() {
        let a = CacheKey::for_request("model-a", "prompt");
        let b = CacheKey::for_request("model-b", "prompt");
        assert_ne!(a, b);
    }
}
