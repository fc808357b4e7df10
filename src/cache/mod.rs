//! Local cache for report results and property metadata
//!
//! SQLite-backed storage with file blobs for large payloads. One store per
//! cache context (named configuration), so contexts never share entries.

pub mod key;
pub mod storage;

use std::fmt;
use std::time::Duration;

use crate::error::CacheError;

/// Cache TTL defaults per data type
pub struct CacheTtl;

impl CacheTtl {
    // Field metadata changes rarely
    pub const METADATA: Duration = Duration::from_secs(24 * 60 * 60); // 24 hr

    // Report data for past dates is stable; today's numbers move
    pub const QUERY_RESULT: Duration = Duration::from_secs(4 * 60 * 60); // 4 hr
}

/// Metadata entry kind for property field listings
pub const METADATA_KIND: &str = "metadata";

/// Resolved TTLs for one executor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlPolicy {
    pub metadata: Duration,
    pub query: Duration,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            metadata: CacheTtl::METADATA,
            query: CacheTtl::QUERY_RESULT,
        }
    }
}

/// Name of an isolated cache store.
///
/// Used as a directory name, so it is restricted to ASCII letters, digits,
/// `-`, `_` and `.`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheContext(String);

impl CacheContext {
    pub const DEFAULT: &'static str = "default";

    pub fn new(name: impl Into<String>) -> Result<Self, CacheError> {
        let name = name.into();
        let valid = !name.is_empty()
            && name != "."
            && name != ".."
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if valid {
            Ok(Self(name))
        } else {
            Err(CacheError::InvalidContext(name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CacheContext {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl fmt::Display for CacheContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One report result to store
#[derive(Debug, Clone, Copy)]
pub struct QueryRecord<'a> {
    pub query_id: &'a str,
    pub property_id: &'a str,
    pub query_hash: &'a str,
    /// Serialized request that produced the payload
    pub request: &'a [u8],
    pub payload: &'a [u8],
    pub row_count: i64,
    /// `None` persists until explicitly removed
    pub ttl: Option<Duration>,
}

/// A live cached report and the identity it was stored under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedQuery {
    pub query_id: String,
    /// Unix seconds of the fetch that produced the payload
    pub created_at: i64,
    pub payload: Vec<u8>,
}

/// Cache operations the executor depends on.
///
/// Reads never return expired entries. Implementations must be safe to
/// share across concurrent executions.
pub trait ReportCache: Send + Sync {
    fn get_cached_metadata(
        &self,
        property_id: &str,
        kind: &str,
    ) -> Result<Option<Vec<u8>>, CacheError>;

    fn cache_metadata(
        &self,
        property_id: &str,
        kind: &str,
        payload: &[u8],
        ttl: Duration,
    ) -> Result<(), CacheError>;

    fn get_cached_query(&self, query_hash: &str) -> Result<Option<CachedQuery>, CacheError>;

    fn cache_query(&self, record: &QueryRecord<'_>) -> Result<(), CacheError>;

    /// Remove all expired entries, returning how many were removed
    fn sweep(&self) -> Result<usize, CacheError>;

    fn close(&self) -> Result<(), CacheError>;
}

/// Cache that stores nothing (`--no-cache`)
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCache;

impl ReportCache for NoopCache {
    fn get_cached_metadata(&self, _: &str, _: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(None)
    }

    fn cache_metadata(&self, _: &str, _: &str, _: &[u8], _: Duration) -> Result<(), CacheError> {
        Ok(())
    }

    fn get_cached_query(&self, _: &str) -> Result<Option<CachedQuery>, CacheError> {
        Ok(None)
    }

    fn cache_query(&self, _: &QueryRecord<'_>) -> Result<(), CacheError> {
        Ok(())
    }

    fn sweep(&self) -> Result<usize, CacheError> {
        Ok(0)
    }

    fn close(&self) -> Result<(), CacheError> {
        Ok(())
    }
}

// Re-export main types
pub use key::query_digest;
pub use storage::CacheStorage;
