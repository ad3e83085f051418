use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use folio_core::cache_keys;
use moka::future::Cache;
use moka::Expiry;
use serde::Serialize;
use tokio::sync::RwLock;

/// Default entry lifetime (5 minutes).
pub const DEFAULT_TTL_SECS: u64 = 300;

/// Default maximum number of cached entries.
pub const DEFAULT_MAX_ENTRIES: u64 = 10_000;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub default_ttl: Duration,
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entry_count: u64,
}

/// Invalidation counters seen before a load started.
///
/// Taken with [`ResponseCache::generation`] and handed back to
/// [`ResponseCache::insert_if_current`], which drops the value when any
/// of its tags (or the whole cache) was invalidated in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheGeneration {
    epoch: u64,
    tags: Vec<u64>,
}

#[derive(Clone)]
struct CacheEntry {
    value: Arc<serde_json::Value>,
    tags: Arc<[String]>,
    ttl: Duration,
}

/// Expires each entry after its own TTL, restarting on overwrite.
struct EntryExpiry;

impl Expiry<String, CacheEntry> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-memory JSON response cache with per-entry TTL and tags.
pub struct ResponseCache {
    cache: Cache<String, CacheEntry>,
    default_ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    /// Bumped by key, pattern and full invalidations.
    epoch: AtomicU64,
    tag_generations: RwLock<HashMap<String, u64>>,
}

impl ResponseCache {
    pub fn new(config: CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_entries)
            .expire_after(EntryExpiry)
            .build();

        Self {
            cache,
            default_ttl: config.default_ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            epoch: AtomicU64::new(0),
            tag_generations: RwLock::new(HashMap::new()),
        }
    }

    /// Returns `None` if no entry exists or it has expired.
    pub async fn get(&self, key: &str) -> Option<serde_json::Value> {
        match self.cache.get(key).await {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.value.as_ref().clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a value with the default TTL.
    pub async fn insert(&self, key: impl Into<String>, value: serde_json::Value, tags: &[&str]) {
        self.insert_with_ttl(key, value, tags, self.default_ttl).await;
    }

    pub async fn insert_with_ttl(
        &self,
        key: impl Into<String>,
        value: serde_json::Value,
        tags: &[&str],
        ttl: Duration,
    ) {
        let entry = CacheEntry {
            value: Arc::new(value),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ttl,
        };
        self.cache.insert(key.into(), entry).await;
    }

    /// Snapshot the invalidation counters for `tags` before loading a value.
    pub async fn generation(&self, tags: &[&str]) -> CacheGeneration {
        let generations = self.tag_generations.read().await;
        CacheGeneration {
            epoch: self.epoch.load(Ordering::Acquire),
            tags: tags
                .iter()
                .map(|t| generations.get(*t).copied().unwrap_or(0))
                .collect(),
        }
    }

    /// Store a value loaded after `seen` was taken, unless `tags` were
    /// invalidated since. Returns whether the value was kept.
    ///
    /// Invalidations bump their counter before removing entries, so a
    /// value that slips in between the check and the insert is caught by
    /// the second check and removed here.
    pub async fn insert_if_current(
        &self,
        key: impl Into<String>,
        value: serde_json::Value,
        tags: &[&str],
        seen: &CacheGeneration,
    ) -> bool {
        if self.generation(tags).await != *seen {
            return false;
        }
        let key = key.into();
        self.insert(key.clone(), value, tags).await;
        if self.generation(tags).await != *seen {
            self.cache.remove(&key).await;
            return false;
        }
        true
    }

    /// Remove one key. Returns whether it was present.
    pub async fn invalidate(&self, key: &str) -> bool {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        self.cache.remove(key).await.is_some()
    }

    /// Remove every entry carrying `tag`. Returns the removed keys.
    pub async fn invalidate_tag(&self, tag: &str) -> Vec<String> {
        *self
            .tag_generations
            .write()
            .await
            .entry(tag.to_string())
            .or_insert(0) += 1;
        let removed = self
            .remove_where(|_, entry| entry.tags.iter().any(|t| t == tag))
            .await;
        tracing::debug!(tag, removed = removed.len(), "Cache invalidated by tag");
        removed
    }

    /// Remove every entry whose key matches the glob. Returns the removed keys.
    pub async fn invalidate_pattern(&self, pattern: &str) -> Vec<String> {
        let Ok(re) = cache_keys::compile_glob(pattern) else {
            return Vec::new();
        };
        self.epoch.fetch_add(1, Ordering::AcqRel);
        let removed = self.remove_where(|key, _| re.is_match(key)).await;
        tracing::debug!(pattern, removed = removed.len(), "Cache invalidated by pattern");
        removed
    }

    /// Drop every entry.
    pub async fn clear(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
        tracing::debug!("Cache cleared");
    }

    pub async fn stats(&self) -> CacheStats {
        self.cache.run_pending_tasks().await;
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entry_count: self.cache.entry_count(),
        }
    }

    async fn remove_where<F>(&self, pred: F) -> Vec<String>
    where
        F: Fn(&str, &CacheEntry) -> bool,
    {
        let keys: Vec<String> = self
            .cache
            .iter()
            .filter(|(key, entry)| pred(key.as_str(), entry))
            .map(|(key, _)| key.to_string())
            .collect();

        let mut removed = Vec::with_capacity(keys.len());
        for key in keys {
            if self.cache.remove(&key).await.is_some() {
                removed.push(key);
            }
        }
        removed.sort();
        removed
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cache() -> ResponseCache {
        ResponseCache::new(CacheConfig {
            default_ttl: Duration::from_secs(60),
            max_entries: 100,
        })
    }

    #[tokio::test]
    async fn miss_then_hit() {
        let cache = cache();
        assert!(cache.get("blog:list").await.is_none());

        cache.insert("blog:list", json!([1, 2, 3]), &["blog"]).await;
        assert_eq!(cache.get("blog:list").await, Some(json!([1, 2, 3])));

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entry_count, 1);
    }

    #[tokio::test]
    async fn overwrite_replaces_value() {
        let cache = cache();
        cache.insert("k", json!(1), &[]).await;
        cache.insert("k", json!(2), &[]).await;
        assert_eq!(cache.get("k").await, Some(json!(2)));
    }

    #[tokio::test]
    async fn invalidate_single_key() {
        let cache = cache();
        cache.insert("blog:item:1", json!({"id": 1}), &["blog"]).await;
        assert!(cache.invalidate("blog:item:1").await);
        assert!(!cache.invalidate("blog:item:1").await);
        assert!(cache.get("blog:item:1").await.is_none());
    }

    #[tokio::test]
    async fn tag_invalidation_removes_only_tagged_entries() {
        let cache = cache();
        cache.insert("blog:list", json!([]), &["blog"]).await;
        cache.insert("blog:item:1", json!({}), &["blog"]).await;
        cache.insert("products:list", json!([]), &["products"]).await;
        cache
            .insert("blog_categories:tree", json!([]), &["blog_categories", "blog"])
            .await;

        let removed = cache.invalidate_tag("blog").await;
        assert_eq!(removed, vec!["blog:item:1", "blog:list", "blog_categories:tree"]);

        assert!(cache.get("blog:list").await.is_none());
        assert!(cache.get("blog_categories:tree").await.is_none());
        assert!(cache.get("products:list").await.is_some());
    }

    #[tokio::test]
    async fn pattern_invalidation() {
        let cache = cache();
        cache.insert("media:list", json!([]), &["media"]).await;
        cache.insert("media:item:4", json!({}), &["media"]).await;
        cache.insert("blog:list", json!([]), &["blog"]).await;

        let removed = cache.invalidate_pattern("media:*").await;
        assert_eq!(removed, vec!["media:item:4", "media:list"]);
        assert!(cache.get("blog:list").await.is_some());
    }

    #[tokio::test]
    async fn pattern_with_no_matches_removes_nothing() {
        let cache = cache();
        cache.insert("blog:list", json!([]), &["blog"]).await;
        assert!(cache.invalidate_pattern("orders:*").await.is_empty());
        assert!(cache.get("blog:list").await.is_some());
    }

    #[tokio::test]
    async fn clear_drops_everything() {
        let cache = cache();
        cache.insert("a", json!(1), &["blog"]).await;
        cache.insert("b", json!(2), &["media"]).await;
        cache.clear().await;

        assert!(cache.get("a").await.is_none());
        assert!(cache.get("b").await.is_none());
        assert_eq!(cache.stats().await.entry_count, 0);
    }

    #[tokio::test]
    async fn load_that_straddles_a_tag_invalidation_is_not_cached() {
        let cache = cache();
        let seen = cache.generation(&["products"]).await;

        // A mutation lands while the load is still running.
        cache.invalidate_tag("products").await;

        let kept = cache
            .insert_if_current("products:list", json!(["stale"]), &["products"], &seen)
            .await;
        assert!(!kept);
        assert!(cache.get("products:list").await.is_none());

        let fresh = cache.generation(&["products"]).await;
        assert!(
            cache
                .insert_if_current("products:list", json!(["fresh"]), &["products"], &fresh)
                .await
        );
        assert_eq!(cache.get("products:list").await, Some(json!(["fresh"])));
    }

    #[tokio::test]
    async fn unrelated_tag_invalidation_keeps_the_load() {
        let cache = cache();
        let seen = cache.generation(&["blog"]).await;
        cache.invalidate_tag("media").await;

        assert!(
            cache
                .insert_if_current("blog:list", json!([]), &["blog"], &seen)
                .await
        );
        assert!(cache.get("blog:list").await.is_some());
    }

    #[tokio::test]
    async fn clear_and_pattern_invalidation_also_discard_inflight_loads() {
        let cache = cache();

        let seen = cache.generation(&["blog"]).await;
        cache.clear().await;
        assert!(!cache.insert_if_current("blog:list", json!([]), &["blog"], &seen).await);

        let seen = cache.generation(&["media"]).await;
        cache.invalidate_pattern("media:*").await;
        assert!(!cache.insert_if_current("media:list", json!([]), &["media"], &seen).await);

        assert_eq!(cache.stats().await.entry_count, 0);
    }

    #[tokio::test]
    async fn per_entry_ttl_expires() {
        let cache = cache();
        cache
            .insert_with_ttl("short", json!(1), &[], Duration::from_millis(100))
            .await;
        cache.insert("long", json!(2), &[]).await;

        tokio::time::sleep(Duration::from_millis(400)).await;

        assert!(cache.get("short").await.is_none());
        assert_eq!(cache.get("long").await, Some(json!(2)));
    }
}
