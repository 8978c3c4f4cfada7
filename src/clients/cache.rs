//! Response caching for read-only queries.
//!
//! The cache is an injected capability rather than ambient state: the
//! gateway holds a [`ResponseCache`] implementation chosen by the caller.
//! [`DiskCache`] persists one JSON file per request signature under a
//! configured directory; [`MemoryCache`] is the in-process stub for tests
//! and short-lived programs.
//!
//! The cache is advisory. A miss - or any I/O failure while reading or
//! writing an entry - behaves identically to running without a cache.
//! Mutations never reach this layer.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Mutex;

use sha2::{Digest, Sha256};

/// Computes the cache key for a query + variables pair.
///
/// The signature is a SHA-256 digest over the query text and the serialized
/// variables, so distinct requests never collide on a file name and the key
/// is stable across processes sharing a cache directory.
#[must_use]
pub fn request_signature(query: &str, variables: Option<&serde_json::Value>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(query.as_bytes());
    hasher.update(b"\0");
    let variables = variables
        .map(ToString::to_string)
        .unwrap_or_else(|| "null".to_string());
    hasher.update(variables.as_bytes());

    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        use std::fmt::Write;
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Capability port for caching read-only API responses.
///
/// Implementations must be safe to share across tasks; entries are keyed by
/// [`request_signature`] and hold the response's `data` object.
pub trait ResponseCache: Send + Sync + fmt::Debug {
    /// Returns the cached response for a key, if present.
    fn get(&self, key: &str) -> Option<serde_json::Value>;

    /// Stores a response under a key.
    ///
    /// Failures are the implementation's problem to swallow; callers treat
    /// `put` as best-effort.
    fn put(&self, key: &str, value: &serde_json::Value);
}

/// Flat-file response cache: one JSON file per request signature.
///
/// Entries carry the response body plus a `cached_at` timestamp. The store
/// is append-only - entries are written once and never invalidated by this
/// crate - so external processes sharing the directory read
/// stale-but-consistent data.
#[derive(Debug)]
pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    /// Creates a cache rooted at `dir`.
    ///
    /// The directory is created lazily on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl ResponseCache for DiskCache {
    fn get(&self, key: &str) -> Option<serde_json::Value> {
        let path = self.entry_path(key);
        let raw = std::fs::read_to_string(&path).ok()?;
        let entry: serde_json::Value = serde_json::from_str(&raw).ok()?;
        entry.get("data").cloned()
    }

    fn put(&self, key: &str, value: &serde_json::Value) {
        if let Err(error) = std::fs::create_dir_all(&self.dir) {
            tracing::warn!("Could not create cache directory {:?}: {error}", self.dir);
            return;
        }
        let entry = serde_json::json!({
            "cached_at": chrono::Utc::now().to_rfc3339(),
            "data": value,
        });
        let path = self.entry_path(key);
        if let Err(error) = std::fs::write(&path, entry.to_string()) {
            tracing::warn!("Could not write cache entry {path:?}: {error}");
        }
    }
}

/// In-memory response cache, primarily for tests.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, serde_json::Value>>,
}

impl MemoryCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored entries.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Returns `true` if no entries are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResponseCache for MemoryCache {
    fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: &serde_json::Value) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_signature_is_stable_and_distinct() {
        let a = request_signature("query { a }", None);
        let b = request_signature("query { a }", None);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);

        let with_vars = request_signature("query { a }", Some(&json!({"first": 50})));
        assert_ne!(a, with_vars);

        let other_vars = request_signature("query { a }", Some(&json!({"first": 100})));
        assert_ne!(with_vars, other_vars);
    }

    #[test]
    fn test_memory_cache_round_trip() {
        let cache = MemoryCache::new();
        assert!(cache.is_empty());
        assert!(cache.get("missing").is_none());

        cache.put("key", &json!({"metaobjects": []}));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("key"), Some(json!({"metaobjects": []})));
    }

    #[test]
    fn test_disk_cache_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path().join("responses"));

        assert!(cache.get("missing").is_none());

        let key = request_signature("query { shop }", None);
        cache.put(&key, &json!({"shop": {"name": "test"}}));
        assert_eq!(cache.get(&key), Some(json!({"shop": {"name": "test"}})));

        // The stored entry carries its timestamp alongside the data
        let raw = std::fs::read_to_string(
            dir.path().join("responses").join(format!("{key}.json")),
        )
        .unwrap();
        let entry: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(entry.get("cached_at").is_some());
    }

    #[test]
    fn test_disk_cache_ignores_corrupt_entries() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path());

        std::fs::write(dir.path().join("bad.json"), "not json").unwrap();
        assert!(cache.get("bad").is_none());
    }
}
