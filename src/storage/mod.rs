pub mod cache;

pub use cache::{CacheStats, ResponseCache, SharedCache};
