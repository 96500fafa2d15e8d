use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use uuid::Uuid;

use crate::fingerprint::{MaterialFingerprint, fingerprint};
use crate::material::Material;

/// Hit/miss counters of a [`FingerprintCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Memoizes material fingerprints.
///
/// The cache is an explicit object owned by the caller: a pass creates one
/// for its own lifetime, or an editor service keeps one alive and calls
/// [`clear`](Self::clear) when it wants a clean slate. Entries are keyed by
/// `(uuid, version)`, so editing a material never serves a stale digest.
pub struct FingerprintCache {
    entries: Mutex<FxHashMap<(Uuid, u64), MaterialFingerprint>>,
    enabled: bool,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for FingerprintCache {
    fn default() -> Self {
        Self::new()
    }
}

impl FingerprintCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(FxHashMap::default()),
            enabled: true,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// A pass-through cache that recomputes every fingerprint.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new()
        }
    }

    /// Returns the cached fingerprint of `material`, computing it on a miss.
    pub fn get_or_compute(&self, material: &Material) -> MaterialFingerprint {
        if !self.enabled {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return fingerprint(material);
        }

        let key = (material.uuid(), material.version());
        if let Some(fp) = self.entries.lock().get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return *fp;
        }

        // Computed outside the lock.
        let fp = fingerprint(material);
        self.misses.fetch_add(1, Ordering::Relaxed);
        self.entries.lock().insert(key, fp);
        fp
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
