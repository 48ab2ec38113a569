//! cache
//!
//! Memoization of resolved values and rendered head blocks.
//!
//! # Keys
//!
//! ```text
//! {definition}.{sha256(scope)}[.{language}].{field}    field entry
//! {definition}.{sha256(scope)}[.{language}]            head block entry
//! ```
//!
//! `scope` is the request path exactly as the record store is queried with
//! it. Site-scoped definitions prefix it with the site domain (empty for no
//! site) and a NUL separator. The language segment is present only for
//! definitions with `use_i18n`; requests without a language use `-`.
//!
//! # Values
//!
//! Field entries hold the resolved raw value, with `""` meaning "resolved to
//! nothing". The head block entry holds rendered markup. Entries are never
//! invalidated proactively; expiry is up to the [`CacheStore`].
//!
//! # Example
//!
//! ```
//! use metahead::cache::{CacheKeys, CacheStore, MemoryCache};
//! use metahead::definition::default_definition;
//!
//! let definition = default_definition();
//! let keys = CacheKeys::new(&definition, "/about/", None, None);
//! assert!(keys.head().starts_with("DefaultMetadata."));
//! assert!(keys.field("title").ends_with(".title"));
//!
//! let cache = MemoryCache::new();
//! cache.set(&keys.field("title"), "About us");
//! assert_eq!(cache.get(&keys.field("title")).as_deref(), Some("About us"));
//! ```

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

use crate::core::types::{Language, Site};
use crate::definition::CompiledDefinition;

/// A string key-value cache shared by resolutions.
///
/// Caching is best-effort: implementations swallow their own failures and
/// report a miss instead.
pub trait CacheStore: Send + Sync {
    /// The cached value, if present and not expired.
    fn get(&self, key: &str) -> Option<String>;

    /// Store a value.
    fn set(&self, key: &str, value: &str);
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    stored_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct MemoryCacheInner {
    entries: HashMap<String, CacheEntry>,
    hits: u64,
    misses: u64,
}

/// In-process [`CacheStore`] with an optional time to live.
///
/// Clones share entries and counters.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    inner: Arc<Mutex<MemoryCacheInner>>,
    ttl: Option<Duration>,
}

impl MemoryCache {
    /// A cache whose entries never expire.
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache whose entries expire `ttl` after they were stored.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            inner: Arc::default(),
            ttl: Some(ttl),
        }
    }

    /// Number of lookups that found a live entry.
    pub fn hits(&self) -> u64 {
        self.lock().hits
    }

    /// Number of lookups that found nothing or an expired entry.
    pub fn misses(&self) -> u64 {
        self.lock().misses
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Drop every entry. Counters are kept.
    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    fn lock(&self) -> MutexGuard<'_, MemoryCacheInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_expired(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        self.ttl.is_some_and(|ttl| now - entry.stored_at >= ttl)
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        let now = Utc::now();
        let mut inner = self.lock();
        let live = inner
            .entries
            .get(key)
            .filter(|e| !self.is_expired(e, now))
            .map(|e| e.value.clone());
        match live {
            Some(value) => {
                inner.hits += 1;
                debug!(key, "cache hit");
                Some(value)
            }
            None => {
                inner.entries.remove(key);
                inner.misses += 1;
                debug!(key, "cache miss");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) {
        let entry = CacheEntry {
            value: value.to_string(),
            stored_at: Utc::now(),
        };
        self.lock().entries.insert(key.to_string(), entry);
    }
}

/// Cache keys for one (definition, path, site, language) scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKeys {
    prefix: String,
}

impl CacheKeys {
    /// Build the keys for a scope.
    ///
    /// `path` is hashed exactly as given, the same string the record store
    /// is queried with. `site` and `language` only take part when the
    /// definition enables the matching axis.
    pub fn new(
        definition: &CompiledDefinition,
        path: &str,
        site: Option<&Site>,
        language: Option<&Language>,
    ) -> Self {
        let options = definition.options();
        let mut hasher = Sha256::new();
        if options.use_sites {
            hasher.update(site.map(|s| s.domain.as_str()).unwrap_or("").as_bytes());
            hasher.update(b"\0");
        }
        hasher.update(path.as_bytes());
        let digest = hex::encode(hasher.finalize());

        let mut prefix = format!("{}.{digest}", definition.name());
        if options.use_i18n {
            prefix.push('.');
            prefix.push_str(language.map(Language::as_str).unwrap_or("-"));
        }
        Self { prefix }
    }

    /// Key of the rendered head block.
    pub fn head(&self) -> &str {
        &self.prefix
    }

    /// Key of one field's resolved value.
    pub fn field(&self, key: &str) -> String {
        format!("{}.{key}", self.prefix)
    }
}
