//! SQLite-based cache storage with file blob support
//!
//! Stores metadata and small report payloads inline in SQLite, large report
//! payloads (>256KB) as files. Expired entries are deleted by the read that
//! discovers them, or in bulk by [`CacheStorage::sweep_expired`].

use chrono::Utc;
use log::{debug, info, warn};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use super::{CacheContext, CachedQuery, QueryRecord, ReportCache};
use crate::error::CacheError;

/// Schema version - increment to trigger nuke-and-rebuild
const SCHEMA_VERSION: i32 = 1;

/// Report payloads larger than this are stored as external blobs
const INLINE_THRESHOLD: usize = 256 * 1024; // 256KB

/// Upper bound on waiting for a locked database
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

type Result<T> = std::result::Result<T, CacheError>;

/// SQLite-backed cache storage for one context
pub struct CacheStorage {
    conn: Mutex<Option<Connection>>,
    /// `None` for in-memory stores, which keep every payload inline
    blobs_dir: Option<PathBuf>,
    db_path: Option<PathBuf>,
    context: CacheContext,
}

impl CacheStorage {
    /// Open or create the store for `context` at the default cache location
    pub fn open(context: &CacheContext) -> Result<Self> {
        let dir = Self::context_dir(context)?;
        Self::open_at(&dir, context)
    }

    /// Get the cache root directory (~/.cache/ga4cache on Linux)
    pub fn cache_dir() -> Result<PathBuf> {
        let cache_base = dirs::cache_dir().ok_or(CacheError::NoHome)?;
        Ok(cache_base.join("ga4cache"))
    }

    /// Directory holding one context's database and blobs
    pub fn context_dir(context: &CacheContext) -> Result<PathBuf> {
        Ok(Self::cache_dir()?.join(context.as_str()))
    }

    /// Open the store at a specific directory (for testing)
    pub fn open_at(dir: &Path, context: &CacheContext) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .map_err(|e| CacheError::Io(format!("Failed to create cache dir: {}", e)))?;

        let db_path = dir.join("cache.db");
        let blobs_dir = dir.join("blobs");
        std::fs::create_dir_all(&blobs_dir)
            .map_err(|e| CacheError::Io(format!("Failed to create blobs dir: {}", e)))?;

        let conn = Connection::open(&db_path)?;

        // Check schema version - nuke if mismatched
        let version: i32 = conn
            .pragma_query_value(None, "user_version", |r| r.get(0))
            .unwrap_or(0);

        if version != 0 && version != SCHEMA_VERSION {
            info!(
                "Cache schema version mismatch ({} != {}), rebuilding",
                version, SCHEMA_VERSION
            );
            drop(conn);
            Self::nuke(&db_path, &blobs_dir)?;
            return Self::open_at(dir, context);
        }

        Self::init(conn, Some(blobs_dir), Some(db_path), context)
    }

    /// Open a throwaway store with no files behind it
    pub fn open_in_memory(context: &CacheContext) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, None, None, context)
    }

    fn init(
        conn: Connection,
        blobs_dir: Option<PathBuf>,
        db_path: Option<PathBuf>,
        context: &CacheContext,
    ) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update(None, "foreign_keys", true)?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS metadata_cache (
                property_id TEXT NOT NULL,
                cache_type TEXT NOT NULL,
                data BLOB NOT NULL,
                created_at INTEGER NOT NULL,
                expires_at INTEGER NOT NULL,
                last_accessed INTEGER NOT NULL,
                PRIMARY KEY (property_id, cache_type)
            );

            CREATE TABLE IF NOT EXISTS query_cache (
                query_id TEXT PRIMARY KEY NOT NULL,
                property_id TEXT NOT NULL,
                query_hash TEXT NOT NULL UNIQUE,
                query_params BLOB NOT NULL,
                result_data BLOB,
                blob_path TEXT,
                row_count INTEGER NOT NULL,
                size_bytes INTEGER NOT NULL,
                created_at INTEGER NOT NULL,
                expires_at INTEGER,
                last_accessed INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS named_tables (
                table_name TEXT PRIMARY KEY NOT NULL,
                property_id TEXT NOT NULL,
                query_id TEXT NOT NULL REFERENCES query_cache(query_id) ON DELETE CASCADE,
                description TEXT,
                created_at INTEGER NOT NULL,
                last_accessed INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS cache_stats (
                context_id TEXT PRIMARY KEY NOT NULL,
                total_hits INTEGER NOT NULL DEFAULT 0,
                total_misses INTEGER NOT NULL DEFAULT 0,
                last_sweep INTEGER,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_metadata_expires_at ON metadata_cache(expires_at);
            CREATE INDEX IF NOT EXISTS idx_query_expires_at ON query_cache(expires_at);
            CREATE INDEX IF NOT EXISTS idx_query_property ON query_cache(property_id);
            CREATE INDEX IF NOT EXISTS idx_named_property ON named_tables(property_id);
            "#,
        )?;

        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;

        let now = now();
        conn.execute(
            "INSERT OR IGNORE INTO cache_stats (context_id, total_hits, total_misses, created_at, updated_at)
             VALUES (?1, 0, 0, ?2, ?2)",
            params![context.as_str(), now],
        )?;

        Ok(Self {
            conn: Mutex::new(Some(conn)),
            blobs_dir,
            db_path,
            context: context.clone(),
        })
    }

    pub fn context(&self) -> &CacheContext {
        &self.context
    }

    /// Database file path, `None` for in-memory stores
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let guard = self.conn.lock().map_err(|_| CacheError::Poisoned)?;
        let conn = guard.as_ref().ok_or(CacheError::Closed)?;
        f(conn)
    }

    /// Get cached metadata if valid (not expired)
    pub fn get_metadata(&self, property_id: &str, kind: &str) -> Result<Option<Vec<u8>>> {
        let now = now();
        self.with_conn(|conn| {
            let row: Option<(Vec<u8>, i64)> = conn
                .query_row(
                    "SELECT data, expires_at FROM metadata_cache
                     WHERE property_id = ?1 AND cache_type = ?2",
                    params![property_id, kind],
                    |r| Ok((r.get(0)?, r.get(1)?)),
                )
                .optional()?;

            match row {
                Some((data, expires_at)) if expires_at > now => {
                    conn.execute(
                        "UPDATE metadata_cache SET last_accessed = ?3
                         WHERE property_id = ?1 AND cache_type = ?2",
                        params![property_id, kind, now],
                    )?;
                    self.count_lookup(conn, Counter::Hit, now)?;
                    Ok(Some(data))
                }
                Some(_) => {
                    debug!("Metadata {}/{} expired, removing", property_id, kind);
                    conn.execute(
                        "DELETE FROM metadata_cache WHERE property_id = ?1 AND cache_type = ?2",
                        params![property_id, kind],
                    )?;
                    self.count_lookup(conn, Counter::Miss, now)?;
                    Ok(None)
                }
                None => {
                    self.count_lookup(conn, Counter::Miss, now)?;
                    Ok(None)
                }
            }
        })
    }

    /// Store metadata with TTL
    pub fn put_metadata(
        &self,
        property_id: &str,
        kind: &str,
        data: &[u8],
        ttl: Duration,
    ) -> Result<()> {
        let now = now();
        let expires = expiry(now, ttl);
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO metadata_cache
                 (property_id, cache_type, data, created_at, expires_at, last_accessed)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?4)",
                params![property_id, kind, data, now, expires],
            )?;
            Ok(())
        })
    }

    /// Delete one metadata entry
    pub fn delete_metadata(&self, property_id: &str, kind: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute(
                "DELETE FROM metadata_cache WHERE property_id = ?1 AND cache_type = ?2",
                params![property_id, kind],
            )?;
            Ok(deleted > 0)
        })
    }

    /// Get a cached report payload if valid (not expired)
    pub fn get_query(&self, query_hash: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.get_query_entry(query_hash)?.map(|entry| entry.payload))
    }

    /// Get a cached report with its stored query id and fetch time
    pub fn get_query_entry(&self, query_hash: &str) -> Result<Option<CachedQuery>> {
        let now = now();
        self.with_conn(|conn| {
            type QueryRow = (String, i64, Option<Vec<u8>>, Option<String>, Option<i64>);
            let row: Option<QueryRow> = conn
                .query_row(
                    "SELECT query_id, created_at, result_data, blob_path, expires_at
                     FROM query_cache WHERE query_hash = ?1",
                    [query_hash],
                    |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?)),
                )
                .optional()?;

            let Some((query_id, created_at, data, blob_path, expires_at)) = row else {
                self.count_lookup(conn, Counter::Miss, now)?;
                return Ok(None);
            };

            if expires_at.is_some_and(|exp| exp <= now) {
                debug!("Query {} expired, removing", query_hash);
                self.delete_query_row(conn, query_hash, blob_path.as_deref())?;
                self.count_lookup(conn, Counter::Miss, now)?;
                return Ok(None);
            }

            let payload = match (data, blob_path) {
                (Some(data), _) => Some(data),
                (None, Some(ref rel)) => match self.read_blob(rel) {
                    Ok(data) => Some(data),
                    Err(e) => {
                        warn!("Failed to read blob {}: {}", rel, e);
                        self.delete_query_row(conn, query_hash, None)?;
                        None
                    }
                },
                (None, None) => {
                    self.delete_query_row(conn, query_hash, None)?;
                    None
                }
            };

            match payload {
                Some(payload) => {
                    conn.execute(
                        "UPDATE query_cache SET last_accessed = ?2 WHERE query_hash = ?1",
                        params![query_hash, now],
                    )?;
                    self.count_lookup(conn, Counter::Hit, now)?;
                    Ok(Some(CachedQuery {
                        query_id,
                        created_at,
                        payload,
                    }))
                }
                None => {
                    self.count_lookup(conn, Counter::Miss, now)?;
                    Ok(None)
                }
            }
        })
    }

    /// Store a report payload; a `None` TTL never expires.
    ///
    /// Re-storing an existing digest keeps its original query id so named
    /// references stay attached. A named entry stays persisted whatever TTL
    /// the new record carries.
    pub fn put_query(&self, record: &QueryRecord<'_>) -> Result<()> {
        let now = now();
        let expires = record.ttl.map(|ttl| expiry(now, ttl));

        self.with_conn(|conn| {
            let old_blob: Option<String> = conn
                .query_row(
                    "SELECT blob_path FROM query_cache WHERE query_hash = ?1",
                    [record.query_hash],
                    |r| r.get(0),
                )
                .optional()?
                .flatten();

            let (inline, blob_path) = match self.blobs_dir {
                Some(_) if record.payload.len() > INLINE_THRESHOLD => {
                    (None, Some(self.write_blob(record.query_hash, record.payload)?))
                }
                _ => (Some(record.payload), None),
            };

            conn.execute(
                "INSERT INTO query_cache
                 (query_id, property_id, query_hash, query_params, result_data, blob_path,
                  row_count, size_bytes, created_at, expires_at, last_accessed)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?9)
                 ON CONFLICT(query_hash) DO UPDATE SET
                    property_id = excluded.property_id,
                    query_params = excluded.query_params,
                    result_data = excluded.result_data,
                    blob_path = excluded.blob_path,
                    row_count = excluded.row_count,
                    size_bytes = excluded.size_bytes,
                    created_at = excluded.created_at,
                    expires_at = CASE
                        WHEN EXISTS (SELECT 1 FROM named_tables n
                                     WHERE n.query_id = query_cache.query_id) THEN NULL
                        ELSE excluded.expires_at
                    END,
                    last_accessed = excluded.last_accessed",
                params![
                    record.query_id,
                    record.property_id,
                    record.query_hash,
                    record.request,
                    inline,
                    blob_path,
                    record.row_count,
                    record.payload.len() as i64,
                    now,
                    expires,
                ],
            )?;

            if let Some(old) = old_blob
                && blob_path.as_deref() != Some(old.as_str())
            {
                self.remove_blob(&old);
            }
            Ok(())
        })
    }

    /// Delete a cached report (and any names pointing at it)
    pub fn delete_query(&self, query_hash: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let blob_path: Option<Option<String>> = conn
                .query_row(
                    "SELECT blob_path FROM query_cache WHERE query_hash = ?1",
                    [query_hash],
                    |r| r.get(0),
                )
                .optional()?;

            match blob_path {
                Some(blob) => {
                    self.delete_query_row(conn, query_hash, blob.as_deref())?;
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }

    /// Remove every expired entry in one pass
    pub fn sweep_expired(&self) -> Result<SweepStats> {
        let now = now();
        self.with_conn(|conn| {
            let blobs: Vec<String> = {
                let mut stmt = conn.prepare(
                    "SELECT blob_path FROM query_cache
                     WHERE expires_at IS NOT NULL AND expires_at <= ?1 AND blob_path IS NOT NULL",
                )?;
                let rows = stmt
                    .query_map([now], |r| r.get(0))?
                    .collect::<rusqlite::Result<Vec<String>>>()?;
                rows
            };

            let metadata_removed =
                conn.execute("DELETE FROM metadata_cache WHERE expires_at <= ?1", [now])?;
            let queries_removed = conn.execute(
                "DELETE FROM query_cache WHERE expires_at IS NOT NULL AND expires_at <= ?1",
                [now],
            )?;

            for blob in &blobs {
                self.remove_blob(blob);
            }

            conn.execute(
                "UPDATE cache_stats SET last_sweep = ?2, updated_at = ?2 WHERE context_id = ?1",
                params![self.context.as_str(), now],
            )?;

            let stats = SweepStats {
                metadata_removed,
                queries_removed,
            };
            info!(
                "Swept {} expired cache entries from context '{}'",
                stats.total(),
                self.context
            );
            Ok(stats)
        })
    }

    /// Clear all cache entries; hit/miss counters are kept
    pub fn clear_all(&self) -> Result<ClearStats> {
        let removed = self.with_conn(|conn| {
            let metadata: i64 =
                conn.query_row("SELECT COUNT(*) FROM metadata_cache", [], |r| r.get(0))?;
            let queries: i64 =
                conn.query_row("SELECT COUNT(*) FROM query_cache", [], |r| r.get(0))?;

            conn.execute("DELETE FROM named_tables", [])?;
            conn.execute("DELETE FROM query_cache", [])?;
            conn.execute("DELETE FROM metadata_cache", [])?;
            Ok((metadata + queries) as usize)
        })?;

        // Clear blobs directory
        if let Some(ref blobs_dir) = self.blobs_dir
            && blobs_dir.exists()
        {
            if let Err(e) = std::fs::remove_dir_all(blobs_dir) {
                warn!("Failed to clear blobs directory: {}", e);
            }
            std::fs::create_dir_all(blobs_dir)
                .map_err(|e| CacheError::Io(format!("Failed to recreate blobs dir: {}", e)))?;
        }

        Ok(ClearStats {
            entries_removed: removed,
        })
    }

    /// Get cache statistics
    pub fn stats(&self) -> Result<CacheStats> {
        let now = now();
        self.with_conn(|conn| {
            let (hits, misses, last_sweep): (i64, i64, Option<i64>) = conn.query_row(
                "SELECT total_hits, total_misses, last_sweep FROM cache_stats WHERE context_id = ?1",
                [self.context.as_str()],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )?;

            let metadata_entries: i64 =
                conn.query_row("SELECT COUNT(*) FROM metadata_cache", [], |r| r.get(0))?;
            let query_entries: i64 =
                conn.query_row("SELECT COUNT(*) FROM query_cache", [], |r| r.get(0))?;
            let named_results: i64 =
                conn.query_row("SELECT COUNT(*) FROM named_tables", [], |r| r.get(0))?;

            let expired_entries: i64 = conn.query_row(
                "SELECT (SELECT COUNT(*) FROM metadata_cache WHERE expires_at <= ?1)
                      + (SELECT COUNT(*) FROM query_cache
                         WHERE expires_at IS NOT NULL AND expires_at <= ?1)",
                [now],
                |r| r.get(0),
            )?;

            let total_size: i64 = conn.query_row(
                "SELECT (SELECT COALESCE(SUM(LENGTH(data)), 0) FROM metadata_cache)
                      + (SELECT COALESCE(SUM(size_bytes), 0) FROM query_cache)",
                [],
                |r| r.get(0),
            )?;

            let (oldest, newest): (Option<i64>, Option<i64>) = conn.query_row(
                "SELECT MIN(created_at), MAX(created_at) FROM (
                    SELECT created_at FROM metadata_cache
                    UNION ALL
                    SELECT created_at FROM query_cache
                 )",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )?;

            Ok(CacheStats {
                context: self.context.to_string(),
                hits: hits as u64,
                misses: misses as u64,
                metadata_entries: metadata_entries as usize,
                query_entries: query_entries as usize,
                named_results: named_results as usize,
                expired_entries: expired_entries as usize,
                total_size_bytes: total_size as usize,
                oldest_entry: oldest,
                newest_entry: newest,
                last_sweep,
            })
        })
    }

    /// Attach a durable name to a cached report
    pub fn name_result(
        &self,
        name: &str,
        query_hash: &str,
        description: Option<&str>,
    ) -> Result<()> {
        let now = now();
        self.with_conn(|conn| {
            let target: Option<(String, String)> = conn
                .query_row(
                    "SELECT query_id, property_id FROM query_cache WHERE query_hash = ?1",
                    [query_hash],
                    |r| Ok((r.get(0)?, r.get(1)?)),
                )
                .optional()?;
            let (query_id, property_id) =
                target.ok_or_else(|| CacheError::NotFound(query_hash.to_string()))?;

            // Named results outlive the TTL of the entry they point at
            conn.execute(
                "UPDATE query_cache SET expires_at = NULL WHERE query_id = ?1",
                [&query_id],
            )?;

            conn.execute(
                "INSERT INTO named_tables
                 (table_name, property_id, query_id, description, created_at, last_accessed)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                 ON CONFLICT(table_name) DO UPDATE SET
                    property_id = excluded.property_id,
                    query_id = excluded.query_id,
                    description = excluded.description,
                    last_accessed = excluded.last_accessed",
                params![name, property_id, query_id, description, now],
            )?;
            Ok(())
        })
    }

    /// List named results, optionally for one property
    pub fn list_named(&self, property_id: Option<&str>) -> Result<Vec<NamedResult>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{} WHERE (?1 IS NULL OR n.property_id = ?1) ORDER BY n.table_name",
                NAMED_SELECT
            ))?;
            let rows = stmt
                .query_map([property_id], NamedResult::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    /// Load a named result and its payload
    pub fn get_named(&self, name: &str) -> Result<Option<(NamedResult, Vec<u8>)>> {
        let lookup = |conn: &Connection| -> Result<Option<NamedResult>> {
            Ok(conn
                .query_row(
                    &format!("{} WHERE n.table_name = ?1", NAMED_SELECT),
                    [name],
                    NamedResult::from_row,
                )
                .optional()?)
        };

        let Some(named) = self.with_conn(lookup)? else {
            return Ok(None);
        };

        // Expiry of the underlying report also drops the name
        let Some(payload) = self.get_query(&named.query_hash)? else {
            return Ok(None);
        };

        self.with_conn(|conn| {
            conn.execute(
                "UPDATE named_tables SET last_accessed = ?2 WHERE table_name = ?1",
                params![name, now()],
            )?;
            Ok(())
        })?;

        Ok(Some((named, payload)))
    }

    /// Close the underlying connection; later calls fail with `Closed`
    pub fn close(&self) -> Result<()> {
        let mut guard = self.conn.lock().map_err(|_| CacheError::Poisoned)?;
        if let Some(conn) = guard.take() {
            conn.close().map_err(|(_, e)| CacheError::Sqlite(e))?;
        }
        Ok(())
    }

    fn count_lookup(&self, conn: &Connection, counter: Counter, now: i64) -> Result<()> {
        let sql = match counter {
            Counter::Hit => {
                "UPDATE cache_stats SET total_hits = total_hits + 1, updated_at = ?2
                 WHERE context_id = ?1"
            }
            Counter::Miss => {
                "UPDATE cache_stats SET total_misses = total_misses + 1, updated_at = ?2
                 WHERE context_id = ?1"
            }
        };
        conn.execute(sql, params![self.context.as_str(), now])?;
        Ok(())
    }

    fn delete_query_row(
        &self,
        conn: &Connection,
        query_hash: &str,
        blob_path: Option<&str>,
    ) -> Result<()> {
        conn.execute("DELETE FROM query_cache WHERE query_hash = ?1", [query_hash])?;
        if let Some(blob) = blob_path {
            self.remove_blob(blob);
        }
        Ok(())
    }

    /// Write a blob file, sharded by first 2 chars of key
    fn write_blob(&self, key: &str, data: &[u8]) -> Result<String> {
        let blobs_dir = self
            .blobs_dir
            .as_ref()
            .ok_or_else(|| CacheError::Io("Store has no blob directory".to_string()))?;

        let shard = &key[..2.min(key.len())];
        let shard_dir = blobs_dir.join(shard);
        std::fs::create_dir_all(&shard_dir)
            .map_err(|e| CacheError::Io(format!("Failed to create shard dir: {}", e)))?;

        let filename = format!("{}.json", key);
        let rel_path = format!("{}/{}", shard, filename);
        let full_path = shard_dir.join(&filename);

        std::fs::write(&full_path, data)
            .map_err(|e| CacheError::Io(format!("Failed to write blob: {}", e)))?;

        Ok(rel_path)
    }

    fn read_blob(&self, rel_path: &str) -> Result<Vec<u8>> {
        let blobs_dir = self
            .blobs_dir
            .as_ref()
            .ok_or_else(|| CacheError::Io("Store has no blob directory".to_string()))?;
        std::fs::read(blobs_dir.join(rel_path)).map_err(|e| CacheError::Io(e.to_string()))
    }

    fn remove_blob(&self, rel_path: &str) {
        if let Some(ref blobs_dir) = self.blobs_dir
            && let Err(e) = std::fs::remove_file(blobs_dir.join(rel_path))
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!("Failed to remove blob {}: {}", rel_path, e);
        }
    }

    /// Nuke the cache (delete DB and all blobs)
    fn nuke(db_path: &Path, blobs_dir: &Path) -> Result<()> {
        if db_path.exists() {
            std::fs::remove_file(db_path)
                .map_err(|e| CacheError::Io(format!("Failed to remove cache DB: {}", e)))?;
        }
        if blobs_dir.exists() {
            std::fs::remove_dir_all(blobs_dir)
                .map_err(|e| CacheError::Io(format!("Failed to remove blobs dir: {}", e)))?;
        }
        Ok(())
    }
}

impl ReportCache for CacheStorage {
    fn get_cached_metadata(&self, property_id: &str, kind: &str) -> Result<Option<Vec<u8>>> {
        self.get_metadata(property_id, kind)
    }

    fn cache_metadata(
        &self,
        property_id: &str,
        kind: &str,
        payload: &[u8],
        ttl: Duration,
    ) -> Result<()> {
        self.put_metadata(property_id, kind, payload, ttl)
    }

    fn get_cached_query(&self, query_hash: &str) -> Result<Option<CachedQuery>> {
        self.get_query_entry(query_hash)
    }

    fn cache_query(&self, record: &QueryRecord<'_>) -> Result<()> {
        self.put_query(record)
    }

    fn sweep(&self) -> Result<usize> {
        Ok(self.sweep_expired()?.total())
    }

    fn close(&self) -> Result<()> {
        CacheStorage::close(self)
    }
}

const NAMED_SELECT: &str = "SELECT n.table_name, n.property_id, n.query_id, q.query_hash,
        n.description, q.row_count, n.created_at, n.last_accessed, q.expires_at
 FROM named_tables n JOIN query_cache q ON q.query_id = n.query_id";

#[derive(Debug, Clone, Copy)]
enum Counter {
    Hit,
    Miss,
}

fn now() -> i64 {
    Utc::now().timestamp()
}

/// Expiry timestamp, clamped at the far end of the i64 range
fn expiry(now: i64, ttl: Duration) -> i64 {
    i64::try_from(ttl.as_secs()).map_or(i64::MAX, |secs| now.saturating_add(secs))
}

/// Statistics about cache clear operation
#[derive(Debug)]
pub struct ClearStats {
    pub entries_removed: usize,
}

/// Statistics about a sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepStats {
    pub metadata_removed: usize,
    pub queries_removed: usize,
}

impl SweepStats {
    pub fn total(&self) -> usize {
        self.metadata_removed + self.queries_removed
    }
}

/// Statistics about cache state
#[derive(Debug, Serialize)]
pub struct CacheStats {
    pub context: String,
    pub hits: u64,
    pub misses: u64,
    pub metadata_entries: usize,
    pub query_entries: usize,
    pub named_results: usize,
    pub expired_entries: usize,
    pub total_size_bytes: usize,
    pub oldest_entry: Option<i64>,
    pub newest_entry: Option<i64>,
    pub last_sweep: Option<i64>,
}

impl CacheStats {
    pub fn total_entries(&self) -> usize {
        self.metadata_entries + self.query_entries
    }

    /// Hits over lookups, 0.0 before the first lookup
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}

/// A user-named cached report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedResult {
    pub name: String,
    pub property_id: String,
    pub query_id: String,
    pub query_hash: String,
    pub description: Option<String>,
    pub row_count: i64,
    pub created_at: i64,
    pub last_accessed: i64,
    pub expires_at: Option<i64>,
}

impl NamedResult {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            name: row.get(0)?,
            property_id: row.get(1)?,
            query_id: row.get(2)?,
            query_hash: row.get(3)?,
            description: row.get(4)?,
            row_count: row.get(5)?,
            created_at: row.get(6)?,
            last_accessed: row.get(7)?,
            expires_at: row.get(8)?,
        })
    }
}
