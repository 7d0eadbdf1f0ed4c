//! Transform result cache.
//!
//! Keyed by a SHA-256 digest of the transform options and the source text.
//! A source is transformed at most once per key; failures are cached too.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicUsize, Ordering};
use warden_engine::transform::{self, TransformOptions, TransformOutput, TransformResult};

/// Thread-safe cache of transform results, shareable between sandboxes.
#[derive(Debug, Default)]
pub struct TransformCache {
    entries: Mutex<FxHashMap<String, TransformResult<TransformOutput>>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl TransformCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hex digest identifying `source` under `options`.
    pub fn key(source: &str, options: &TransformOptions) -> String {
        let mut hasher = Sha256::new();
        hasher.update([u8::from(options.allow_async)]);
        hasher.update(source.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// The cached result for `source`, transforming it on a miss.
    pub fn get_or_transform(&self, source: &str, options: &TransformOptions) -> TransformResult<TransformOutput> {
        let key = Self::key(source, options);
        let mut entries = self.entries.lock();
        if let Some(result) = entries.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return result.clone();
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        let result = transform::transform_with(source, options);
        entries.insert(key, result.clone());
        result
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cached entries
    pub entries: usize,
    /// Number of cache hits
    pub hits: usize,
    /// Number of cache misses
    pub misses: usize,
}

impl CacheStats {
    /// Cache hit ratio (0.0 to 1.0)
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use warden_engine::transform::TransformError;

    #[test]
    fn test_hit_after_miss() {
        let cache = TransformCache::new();
        let options = TransformOptions::default();
        let first = cache.get_or_transform("try {} catch (e) {}", &options).unwrap();
        let second = cache.get_or_transform("try {} catch (e) {}", &options).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            cache.stats(),
            CacheStats { entries: 1, hits: 1, misses: 1 }
        );
        assert_eq!(cache.stats().hit_ratio(), 0.5);
    }

    #[test]
    fn test_options_are_part_of_the_key() {
        let cache = TransformCache::new();
        let source = "async function f() {}";
        assert!(cache.get_or_transform(source, &TransformOptions { allow_async: true }).is_ok());
        assert_eq!(
            cache.get_or_transform(source, &TransformOptions { allow_async: false }),
            Err(TransformError::AsyncDisabled)
        );
        assert_eq!(cache.len(), 2);
        assert_ne!(
            TransformCache::key(source, &TransformOptions { allow_async: true }),
            TransformCache::key(source, &TransformOptions { allow_async: false })
        );
    }

    #[test]
    fn test_errors_are_cached() {
        let cache = TransformCache::new();
        let options = TransformOptions::default();
        assert!(cache.get_or_transform("let = ;", &options).is_err());
        assert!(cache.get_or_transform("let = ;", &options).is_err());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_shared_between_threads() {
        let cache = Arc::new(TransformCache::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || cache.get_or_transform("with (o) x;", &TransformOptions::default()))
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap().is_ok());
        }
        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 3);
        cache.clear();
        assert!(cache.is_empty());
    }
}
