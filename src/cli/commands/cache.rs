//! Cache Command
//!
//! Inspect or empty the response cache.
//!
//! Usage:
//!   siteforge cache stats
//!   siteforge cache clear

use crate::cli::Output;
use crate::config::ConfigLoader;
use crate::storage::ResponseCache;
use crate::types::Result;

/// Print entry count, size and age range
pub fn stats() -> Result<()> {
    let out = Output::new();
    let config = ConfigLoader::load()?;
    let path = ConfigLoader::cache_path(&config);

    if !path.exists() {
        out.info(&format!("No response cache at {}", path.display()));
        return Ok(());
    }

    let cache = ResponseCache::open(&path)?;
    let stats = cache.stats()?;
    cache.close()?;

    out.section("Response Cache");
    out.detail("Path", path.display());
    out.detail("Entries", stats.entry_count);
    out.detail("Size", format!("{} bytes", stats.total_bytes));
    if let Some(oldest) = stats.oldest_entry {
        out.detail("Oldest", oldest);
    }
    if let Some(newest) = stats.newest_entry {
        out.detail("Newest", newest);
    }
    Ok(())
}

/// Remove every cached completion
pub fn clear() -> Result<()> {
    let out = Output::new();
    let config = ConfigLoader::load()?;
    let path = ConfigLoader::cache_path(&config);

    if !path.exists() {
        out.info("No response cache to clear");
        return Ok(());
    }

    let cache = ResponseCache::open(&path)?;
    let removed = cache.clear()?;
    cache.close()?;

    if removed > 0 {
        out.success(&format!("Cleared {} cached responses", removed));
    } else {
        out.info("No cached responses to clear");
    }
    Ok(())
}
