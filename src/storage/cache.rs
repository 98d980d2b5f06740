//! Persistent Response Cache
//!
//! SQLite-backed store mapping a (model, prompt) fingerprint to the completion
//! text the provider returned for it. Featuring:
//! - Connection pooling via r2d2 so concurrent workers share one handle
//! - WAL mode; every entry is its own autocommitted statement
//! - Last-write-wins on key collisions (values are idempotent per key)
//! - Explicit, once-only close that checkpoints the WAL
//!
//! There is no eviction: the cache grows with every distinct request so that
//! re-running a site never pays twice for the same prompt.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};

use crate::types::{CacheKey, ForgeError, Result, ResultExt};

/// Shared cache handle for async contexts.
pub type SharedCache = Arc<ResponseCache>;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS responses (
    key         TEXT PRIMARY KEY,
    model       TEXT NOT NULL,
    completion  TEXT NOT NULL,
    created_at  TEXT NOT NULL
);
"#;

/// Maximum pooled connections; workers rarely exceed the dispatch concurrency
const MAX_POOL_SIZE: u32 = 8;

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entry_count: usize,
    pub total_bytes: usize,
    pub oldest_entry: Option<String>,
    pub newest_entry: Option<String>,
}

/// Durable key → completion store
pub struct ResponseCache {
    pool: Pool<SqliteConnectionManager>,
    closed: AtomicBool,
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("closed", &self.closed.load(Ordering::SeqCst))
            .finish()
    }
}

impl ResponseCache {
    /// Open (or create) the cache file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let manager =
            SqliteConnectionManager::file(path.as_ref()).with_init(Self::configure_connection);

        let pool = Pool::builder()
            .max_size(MAX_POOL_SIZE)
            .connection_timeout(std::time::Duration::from_secs(30))
            .build(manager)
            .map_err(|e| ForgeError::Storage(format!("Failed to create cache pool: {}", e)))?;

        let cache = Self {
            pool,
            closed: AtomicBool::new(false),
        };
        cache.initialize()?;

        info!("Opened response cache at {}", path.as_ref().display());
        Ok(cache)
    }

    /// Open an in-memory cache for testing or throwaway runs.
    pub fn open_in_memory() -> Result<Self> {
        // A single connection keeps every caller on the same in-memory database
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e| ForgeError::Storage(format!("Failed to create in-memory pool: {}", e)))?;

        let cache = Self {
            pool,
            closed: AtomicBool::new(false),
        };
        cache.initialize()?;
        Ok(cache)
    }

    fn configure_connection(conn: &mut Connection) -> std::result::Result<(), rusqlite::Error> {
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
            "#,
        )?;
        Ok(())
    }

    fn initialize(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(SCHEMA)
            .with_context("Failed to initialize cache schema")?;
        Ok(())
    }

    /// Get a connection from the pool, refusing once the cache is closed.
    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        if self.is_closed() {
            return Err(ForgeError::Storage("Response cache is closed".to_string()));
        }
        self.pool
            .get()
            .map_err(|e| ForgeError::Storage(format!("Failed to acquire cache connection: {}", e)))
    }

    /// Look up a cached completion.
    pub fn get(&self, key: &CacheKey) -> Result<Option<String>> {
        let conn = self.conn()?;
        let completion = conn
            .query_row(
                "SELECT completion FROM responses WHERE key = ?1",
                params![key.as_str()],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .with_context("Failed to read cache entry")?;

        debug!(key = %key, hit = completion.is_some(), "Cache lookup");
        Ok(completion)
    }

    /// Store a completion; an existing entry for the key is replaced.
    pub fn put(&self, key: &CacheKey, model: &str, completion: &str) -> Result<()> {
        let conn = self.conn()?;
        let now = chrono::Utc::now().to_rfc3339();
        conn.execute(
            "INSERT OR REPLACE INTO responses (key, model, completion, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![key.as_str(), model, completion, now],
        )
        .with_context("Failed to write cache entry")?;

        debug!(key = %key, model, bytes = completion.len(), "Cached completion");
        Ok(())
    }

    /// Number of stored entries.
    pub fn len(&self) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM responses", [], |row| row.get(0))
            .with_context("Failed to count cache entries")?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Get cache statistics
    pub fn stats(&self) -> Result<CacheStats> {
        let conn = self.conn()?;
        let stats = conn
            .query_row(
                "SELECT COUNT(*), COALESCE(SUM(LENGTH(completion)), 0),
                        MIN(created_at), MAX(created_at)
                 FROM responses",
                [],
                |row| {
                    Ok(CacheStats {
                        entry_count: row.get::<_, i64>(0)? as usize,
                        total_bytes: row.get::<_, i64>(1)? as usize,
                        oldest_entry: row.get(2)?,
                        newest_entry: row.get(3)?,
                    })
                },
            )
            .with_context("Failed to read cache statistics")?;
        Ok(stats)
    }

    /// Remove every entry, returning how many were deleted.
    pub fn clear(&self) -> Result<usize> {
        let conn = self.conn()?;
        let removed = conn
            .execute("DELETE FROM responses", [])
            .with_context("Failed to clear cache")?;
        info!("Cleared {} cache entries", removed);
        Ok(removed)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Flush pending writes and close the cache.
    ///
    /// Only the first call does any work; later calls return `Ok(false)`.
    pub fn close(&self) -> Result<bool> {
        if self.closed.swap(true, Ordering::SeqCst) {
            debug!("Response cache already closed");
            return Ok(false);
        }

        let conn = self
            .pool
            .get()
            .map_err(|e| ForgeError::Storage(format!("Failed to acquire cache connection: {}", e)))?;

        // In-memory databases report "memory" and have no WAL to checkpoint
        let journal: String = conn
            .pragma_query_value(None, "journal_mode", |row| row.get(0))
            .with_context("Failed to read journal mode")?;
        if journal.eq_ignore_ascii_case("wal") {
            conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
                .with_context("Failed to checkpoint cache")?;
        }

        info!("Response cache closed");
        Ok(true)
    }
}
