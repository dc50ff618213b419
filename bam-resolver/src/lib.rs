//! Path -> remote id resolution (C4), with a disk-backed positive cache, a
//! short-lived negative cache, and a separate short-lived view-context
//! cache. Every lookup that misses all three caches goes out to whatever
//! implements [`RemoteLookup`] (`bam-client`, in production; a stub in
//! tests), which is injected rather than linked directly so this crate
//! never depends on the HTTP stack.

mod disk;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bam_errors::BamResult;
use bam_util::CanonicalPath;
use dashmap::DashMap;
use time::OffsetDateTime;
use tracing::{debug, trace};

/// Looks a `(type_hint, canonical_path)` pair up against the remote server.
/// `Ok(None)` means the server confirmed the path does not exist (worth
/// negative-caching); `Err` means the lookup itself failed and should not
/// be cached either way.
#[async_trait]
pub trait RemoteLookup: Send + Sync {
    async fn lookup(&self, type_hint: &str, canonical_path: &CanonicalPath) -> BamResult<Option<i64>>;
}

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub cache_dir: PathBuf,
    pub positive_ttl: Duration,
    pub negative_ttl: Duration,
    pub view_context_ttl: Duration,
    pub bypass_cache: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(".resolver_cache"),
            positive_ttl: Duration::from_secs(3600),
            negative_ttl: Duration::from_secs(30),
            view_context_ttl: Duration::from_secs(300),
            bypass_cache: false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Timestamped<T> {
    value: T,
    inserted_at: OffsetDateTime,
}

impl<T> Timestamped<T> {
    fn fresh(value: T) -> Self {
        Self { value, inserted_at: now() }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        (now() - self.inserted_at) > ttl
    }
}

fn now() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

/// Path -> id resolver. One instance is shared (via `Arc`) across every
/// concurrent executor task for a session.
pub struct PathResolver {
    config: ResolverConfig,
    lookup: Arc<dyn RemoteLookup>,
    positive: DashMap<String, Timestamped<i64>>,
    negative: DashMap<String, OffsetDateTime>,
    view_context: DashMap<String, Timestamped<i64>>,
}

impl PathResolver {
    pub fn new(config: ResolverConfig, lookup: Arc<dyn RemoteLookup>) -> Self {
        if let Err(err) = std::fs::create_dir_all(&config.cache_dir) {
            trace!(?err, path = %config.cache_dir.display(), "could not create resolver cache dir; disk persistence disabled for this run");
        }
        Self {
            config,
            lookup,
            positive: DashMap::new(),
            negative: DashMap::new(),
            view_context: DashMap::new(),
        }
    }

    /// Resolves `path` (already normalized by the caller into a
    /// [`CanonicalPath`]) under `type_hint` to a remote numeric id.
    /// `Ok(None)` means a confirmed miss; repeated misses within
    /// `negative_ttl` are served from the negative cache without a second
    /// round trip.
    pub async fn resolve(&self, type_hint: &str, path: &CanonicalPath) -> BamResult<Option<i64>> {
        let key = cache_key(type_hint, path);

        if !self.config.bypass_cache {
            if let Some(id) = self.positive_hit(&key, path, type_hint) {
                return Ok(Some(id));
            }
            if self.negative_hit(&key) {
                trace!(%key, "serving confirmed-absent path from negative cache");
                return Ok(None);
            }
        }

        match self.lookup.lookup(type_hint, path).await? {
            Some(id) => {
                self.insert_positive(&key, path, type_hint, id);
                Ok(Some(id))
            }
            None => {
                self.negative.insert(key, now());
                Ok(None)
            }
        }
    }

    fn positive_hit(&self, key: &str, path: &CanonicalPath, type_hint: &str) -> Option<i64> {
        if let Some(entry) = self.positive.get(key) {
            if !entry.is_expired(self.config.positive_ttl) {
                return Some(entry.value);
            }
        }
        let address = path.content_address(type_hint);
        match disk::read(&self.config.cache_dir, &address) {
            Some(entry) if !entry.is_expired(self.config.positive_ttl) => {
                self.positive.insert(key.to_string(), entry);
                Some(entry.value)
            }
            _ => None,
        }
    }

    fn negative_hit(&self, key: &str) -> bool {
        match self.negative.get(key) {
            Some(inserted_at) => (now() - *inserted_at) <= self.config.negative_ttl,
            None => false,
        }
    }

    fn insert_positive(&self, key: &str, path: &CanonicalPath, type_hint: &str, id: i64) {
        let entry = Timestamped::fresh(id);
        self.positive.insert(key.to_string(), entry);
        self.negative.remove(key);
        let address = path.content_address(type_hint);
        if let Err(err) = disk::write(&self.config.cache_dir, &address, entry) {
            debug!(?err, "failed to persist resolver cache entry to disk");
        }
    }

    /// Resolves a view name within a short-lived, memory-only cache (not
    /// disk-persisted: a view context is only meaningful for the lifetime
    /// of one import session).
    pub async fn resolve_view(&self, view_name: &str) -> BamResult<Option<i64>> {
        let type_hint = "View";
        let path = CanonicalPath::new(view_name);

        if !self.config.bypass_cache {
            if let Some(entry) = self.view_context.get(view_name) {
                if !entry.is_expired(self.config.view_context_ttl) {
                    return Ok(Some(entry.value));
                }
            }
        }

        match self.lookup.lookup(type_hint, &path).await? {
            Some(id) => {
                self.view_context.insert(view_name.to_string(), Timestamped::fresh(id));
                Ok(Some(id))
            }
            None => Ok(None),
        }
    }

    /// Explicit flush, used by the `self-test`/`fix` CLI paths and between
    /// test cases.
    pub fn flush(&self) {
        self.positive.clear();
        self.negative.clear();
        self.view_context.clear();
    }
}

fn cache_key(type_hint: &str, path: &CanonicalPath) -> String {
    format!("{type_hint}\0{path}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingLookup {
        calls: AtomicUsize,
        answer: Option<i64>,
    }

    #[async_trait]
    impl RemoteLookup for CountingLookup {
        async fn lookup(&self, _type_hint: &str, _path: &CanonicalPath) -> BamResult<Option<i64>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.answer)
        }
    }

    fn config(dir: &std::path::Path) -> ResolverConfig {
        ResolverConfig {
            cache_dir: dir.to_path_buf(),
            ..ResolverConfig::default()
        }
    }

    #[tokio::test]
    async fn positive_hit_avoids_a_second_remote_call() {
        let dir = tempfile::tempdir().unwrap();
        let lookup = Arc::new(CountingLookup { calls: AtomicUsize::new(0), answer: Some(42) });
        let resolver = PathResolver::new(config(dir.path()), lookup.clone());
        let path = CanonicalPath::new("Default/10.0.0.0/8");

        assert_eq!(resolver.resolve("Block", &path).await.unwrap(), Some(42));
        assert_eq!(resolver.resolve("Block", &path).await.unwrap(), Some(42));
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn negative_hit_avoids_a_second_remote_call_for_misses() {
        let dir = tempfile::tempdir().unwrap();
        let lookup = Arc::new(CountingLookup { calls: AtomicUsize::new(0), answer: None });
        let resolver = PathResolver::new(config(dir.path()), lookup.clone());
        let path = CanonicalPath::new("Default/10.0.0.0/8");

        assert_eq!(resolver.resolve("Block", &path).await.unwrap(), None);
        assert_eq!(resolver.resolve("Block", &path).await.unwrap(), None);
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn bypass_cache_always_calls_through() {
        let dir = tempfile::tempdir().unwrap();
        let lookup = Arc::new(CountingLookup { calls: AtomicUsize::new(0), answer: Some(7) });
        let mut cfg = config(dir.path());
        cfg.bypass_cache = true;
        let resolver = PathResolver::new(cfg, lookup.clone());
        let path = CanonicalPath::new("Default/10.0.0.0/8");

        resolver.resolve("Block", &path).await.unwrap();
        resolver.resolve("Block", &path).await.unwrap();
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn positive_entries_survive_a_fresh_resolver_via_disk_cache() {
        let dir = tempfile::tempdir().unwrap();
        let lookup = Arc::new(CountingLookup { calls: AtomicUsize::new(0), answer: Some(99) });
        let path = CanonicalPath::new("Default/10.0.0.0/8");

        {
            let resolver = PathResolver::new(config(dir.path()), lookup.clone());
            resolver.resolve("Block", &path).await.unwrap();
        }

        let second_lookup = Arc::new(CountingLookup { calls: AtomicUsize::new(0), answer: Some(1) });
        let resolver = PathResolver::new(config(dir.path()), second_lookup.clone());
        assert_eq!(resolver.resolve("Block", &path).await.unwrap(), Some(99));
        assert_eq!(second_lookup.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn view_context_cache_is_independent_of_the_positive_path_cache() {
        let dir = tempfile::tempdir().unwrap();
        let lookup = Arc::new(CountingLookup { calls: AtomicUsize::new(0), answer: Some(5) });
        let resolver = PathResolver::new(config(dir.path()), lookup.clone());

        assert_eq!(resolver.resolve_view("Internal").await.unwrap(), Some(5));
        assert_eq!(resolver.resolve_view("Internal").await.unwrap(), Some(5));
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn flush_forces_every_cache_to_be_repopulated() {
        let dir = tempfile::tempdir().unwrap();
        let lookup = Arc::new(CountingLookup { calls: AtomicUsize::new(0), answer: Some(3) });
        let resolver = PathResolver::new(config(dir.path()), lookup.clone());
        let path = CanonicalPath::new("Default/10.0.0.0/8");

        resolver.resolve("Block", &path).await.unwrap();
        resolver.flush();
        resolver.resolve("Block", &path).await.unwrap();
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 2);
    }
}
