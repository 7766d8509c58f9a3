//! Process-scoped memoization of dimension, URL and loadability lookups.
//!
//! Every image reference on a page asks the same questions: is this source
//! loadable, which URL serves it through a filter, and how big is the
//! rendition. Answering them can mean storage round-trips and header reads,
//! so each answer is computed once and then shared by every render call in
//! the process.
//!
//! ## Cache keys
//!
//! Keys are SHA-256 over `(purpose, path, filter)`. The purpose is part of
//! the key so that a dimension entry and a URL entry for the same pair can
//! never collide, and so every key maps to exactly one [`CacheValue`]
//! variant.
//!
//! ## Concurrency
//!
//! Backed by `moka::sync::Cache`, which allows concurrent readers and runs
//! the initializer for a missing key at most once: concurrent callers for
//! the same key block until the first computation finishes and then share
//! its result.
//!
//! ## Lifetime
//!
//! Entries live until [`MemoCache::clear`] or until the entry bound evicts
//! them. There is no time-based expiry; call `clear` after changing filters
//! or replacing source images.

use crate::types::ImageSize;
use moka::sync::Cache;
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// What a cache entry answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    Dimensions,
    Url,
    Loadable,
}

impl Purpose {
    fn tag(self) -> &'static [u8] {
        match self {
            Purpose::Dimensions => b"dimensions\0",
            Purpose::Url => b"url\0",
            Purpose::Loadable => b"loadable\0",
        }
    }
}

/// A memoized answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheValue {
    /// Output size of a rendition, `None` when it could not be determined.
    Size(Option<ImageSize>),
    Url(String),
    Loadable(bool),
}

/// SHA-256 key of a lookup, returned as a hex string.
///
/// Inputs are separated by NUL so that `("ab", "c")` and `("a", "bc")` hash
/// differently.
pub fn cache_key(purpose: Purpose, path: &str, filter: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(purpose.tag());
    hasher.update(path.as_bytes());
    hasher.update(b"\0");
    hasher.update(filter.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Shared, compute-once cache injected into the resolvers.
pub struct MemoCache {
    entries: Cache<String, CacheValue>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoCache {
    pub fn new(max_entries: u64) -> Self {
        Self {
            entries: Cache::new(max_entries),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Return the cached value for `key`, computing it on first use.
    ///
    /// `compute` runs at most once per key even under concurrent callers.
    pub fn get_or_compute(&self, key: String, compute: impl FnOnce() -> CacheValue) -> CacheValue {
        let mut computed = false;
        let value = self.entries.get_with(key, || {
            computed = true;
            compute()
        });
        if computed {
            self.misses.fetch_add(1, Ordering::Relaxed);
        } else {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        value
    }

    /// Memoized rendition size for `(path, filter)`.
    pub fn dimensions(
        &self,
        path: &str,
        filter: &str,
        compute: impl FnOnce() -> Option<ImageSize>,
    ) -> Option<ImageSize> {
        let key = cache_key(Purpose::Dimensions, path, filter);
        match self.get_or_compute(key, || CacheValue::Size(compute())) {
            CacheValue::Size(size) => size,
            other => unreachable!("dimension key holds {other:?}"),
        }
    }

    /// Memoized browser URL for `(path, filter)`.
    pub fn url(&self, path: &str, filter: &str, compute: impl FnOnce() -> String) -> String {
        let key = cache_key(Purpose::Url, path, filter);
        match self.get_or_compute(key, || CacheValue::Url(compute())) {
            CacheValue::Url(url) => url,
            other => unreachable!("url key holds {other:?}"),
        }
    }

    /// Memoized loadability of the source behind `(path, filter)`.
    pub fn loadable(&self, path: &str, filter: &str, compute: impl FnOnce() -> bool) -> bool {
        let key = cache_key(Purpose::Loadable, path, filter);
        match self.get_or_compute(key, || CacheValue::Loadable(compute())) {
            CacheValue::Loadable(loadable) => loadable,
            other => unreachable!("loadable key holds {other:?}"),
        }
    }

    /// Drop every entry. Counters are kept.
    pub fn clear(&self) {
        self.entries.invalidate_all();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl Default for MemoCache {
    fn default() -> Self {
        Self::new(10_000)
    }
}

/// Hit/miss summary of a [`MemoCache`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn total(&self) -> u64 {
        self.hits + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits > 0 {
            write!(
                f,
                "{} cached, {} computed ({} total)",
                self.hits,
                self.misses,
                self.total()
            )
        } else {
            write!(f, "{} computed", self.misses)
        }
    }
}
