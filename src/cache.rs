//! In-process caching of fetched manifests and semantics documents
//!
//! The engine itself keeps no state between operations. `CachedSource` is
//! an optimization layer a caller may wrap around any `ManifestSource` so a
//! library read twice during one operation (for instance by `ChainSource`
//! probing for semantics) is only fetched once.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::library::Manifest;
use crate::semantics::SemanticsField;
use crate::source::ManifestSource;

/// Thread-safe map from repository name to a computed value
#[derive(Debug, Clone)]
pub struct MemoCache<V> {
    cache: Arc<Mutex<HashMap<String, V>>>,
}

impl<V: Clone> MemoCache<V> {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self {
            cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Get a cached value, or compute and cache it if not present
    ///
    /// Errors from `processor` are returned and not cached. The lock is not
    /// held while `processor` runs, so two threads may compute the same key
    /// concurrently; the last one to finish wins.
    pub fn get_or_process<F>(&self, key: &str, processor: F) -> Result<V>
    where
        F: FnOnce() -> Result<V>,
    {
        if let Some(cached) = self.get(key)? {
            return Ok(cached);
        }

        let result = processor()?;
        self.insert(key, result.clone())?;
        Ok(result)
    }

    /// Manually insert a value into the cache
    pub fn insert(&self, key: &str, value: V) -> Result<()> {
        self.lock()?.insert(key.to_string(), value);
        Ok(())
    }

    /// Get a value from cache without computing
    pub fn get(&self, key: &str) -> Result<Option<V>> {
        Ok(self.lock()?.get(key).cloned())
    }

    /// Get the number of cached entries
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, V>>> {
        self.cache.lock().map_err(|_| Error::LockPoisoned {
            context: "memo cache".to_string(),
        })
    }
}

impl<V: Clone> Default for MemoCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// A `ManifestSource` that remembers successful reads.
pub struct CachedSource<S> {
    inner: S,
    manifests: MemoCache<Manifest>,
    semantics: MemoCache<Option<Vec<SemanticsField>>>,
}

impl<S: ManifestSource> CachedSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            manifests: MemoCache::new(),
            semantics: MemoCache::new(),
        }
    }

    /// Number of manifests fetched so far.
    pub fn manifests_cached(&self) -> Result<usize> {
        self.manifests.len()
    }
}

impl<S: ManifestSource> ManifestSource for CachedSource<S> {
    fn manifest(&self, repo_name: &str) -> Result<Manifest> {
        self.manifests
            .get_or_process(repo_name, || self.inner.manifest(repo_name))
    }

    fn semantics(&self, repo_name: &str) -> Result<Option<Vec<SemanticsField>>> {
        self.semantics
            .get_or_process(repo_name, || self.inner.semantics(repo_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: AtomicUsize,
    }

    impl ManifestSource for CountingSource {
        fn manifest(&self, repo_name: &str) -> Result<Manifest> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if repo_name == "missing" {
                return Err(Error::LibraryNotFound {
                    repo_name: repo_name.to_string(),
                });
            }
            Manifest::from_json(
                repo_name,
                r#"{"machineName":"H5P.A","majorVersion":1,"minorVersion":2,"patchVersion":0}"#,
            )
        }

        fn semantics(&self, _repo_name: &str) -> Result<Option<Vec<SemanticsField>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }
    }

    #[test]
    fn test_memo_cache_get_or_process() {
        let cache: MemoCache<u32> = MemoCache::new();
        assert_eq!(cache.len().unwrap(), 0);

        assert_eq!(cache.get_or_process("a", || Ok(1)).unwrap(), 1);
        // Second call must not run the processor
        assert_eq!(
            cache
                .get_or_process("a", || panic!("processor called twice"))
                .unwrap(),
            1
        );
        assert_eq!(cache.get("a").unwrap(), Some(1));
        assert_eq!(cache.len().unwrap(), 1);
    }

    #[test]
    fn test_memo_cache_does_not_cache_errors() {
        let cache: MemoCache<u32> = MemoCache::new();
        let err = cache.get_or_process("a", || {
            Err(Error::LibraryNotFound {
                repo_name: "a".to_string(),
            })
        });
        assert!(err.is_err());
        assert!(cache.get("a").unwrap().is_none());
    }

    #[test]
    fn test_cached_source_fetches_once() {
        let source = CachedSource::new(CountingSource {
            calls: AtomicUsize::new(0),
        });

        source.manifest("repoA").unwrap();
        source.manifest("repoA").unwrap();
        source.semantics("repoA").unwrap();
        source.semantics("repoA").unwrap();

        assert_eq!(source.inner.calls.load(Ordering::SeqCst), 2);
        assert_eq!(source.manifests_cached().unwrap(), 1);
    }

    #[test]
    fn test_cached_source_retries_failures() {
        let source = CachedSource::new(CountingSource {
            calls: AtomicUsize::new(0),
        });

        assert!(source.manifest("missing").is_err());
        assert!(source.manifest("missing").is_err());
        assert_eq!(source.inner.calls.load(Ordering::SeqCst), 2);
    }
}
