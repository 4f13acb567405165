//! Parsed permission string cache

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;

use crate::classifier::{parse, ParsedPermissions};

/// Hit and miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that had to parse
    pub misses: u64,
    /// Strings currently cached
    pub size: usize,
}

impl CacheStats {
    /// Fraction of lookups served from the cache, 0.0 before any lookup
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct Inner {
    entries: LruCache<String, Arc<ParsedPermissions>>,
    hits: u64,
    misses: u64,
}

/// LRU memo of `raw string -> parsed form`
///
/// Parsing is pure, so a cached result is always identical to a fresh parse.
pub struct ParseCache {
    inner: Option<Mutex<Inner>>,
}

impl ParseCache {
    /// Cache holding at most `capacity` strings; zero disables caching
    pub fn new(capacity: usize) -> Self {
        let inner = NonZeroUsize::new(capacity).map(|capacity| {
            Mutex::new(Inner {
                entries: LruCache::new(capacity),
                hits: 0,
                misses: 0,
            })
        });
        Self { inner }
    }

    /// Cache that never stores anything
    pub fn disabled() -> Self {
        Self::new(0)
    }

    /// Whether caching is active
    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Parse `raw`, reusing an earlier result when available
    pub fn get_or_parse(&self, raw: &str) -> Arc<ParsedPermissions> {
        let Some(inner) = &self.inner else {
            return Arc::new(parse(raw));
        };

        {
            let mut guard = inner.lock();
            if let Some(parsed) = guard.entries.get(raw).cloned() {
                guard.hits += 1;
                return parsed;
            }
            guard.misses += 1;
        }

        // Parse outside the lock; a concurrent miss on the same string only
        // costs a duplicate parse.
        let parsed = Arc::new(parse(raw));
        inner.lock().entries.put(raw.to_string(), Arc::clone(&parsed));
        parsed
    }

    /// Drop every cached entry and reset counters
    pub fn clear(&self) {
        if let Some(inner) = &self.inner {
            let mut guard = inner.lock();
            guard.entries.clear();
            guard.hits = 0;
            guard.misses = 0;
        }
    }

    /// Current counters
    pub fn stats(&self) -> CacheStats {
        match &self.inner {
            Some(inner) => {
                let guard = inner.lock();
                CacheStats {
                    hits: guard.hits,
                    misses: guard.misses,
                    size: guard.entries.len(),
                }
            }
            None => CacheStats::default(),
        }
    }
}

impl Default for ParseCache {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_PARSE_CACHE_CAPACITY)
    }
}

impl std::fmt::Debug for ParseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParseCache")
            .field("enabled", &self.is_enabled())
            .field("stats", &self.stats())
            .finish()
    }
}
