//! Process-wide resolution cache shared by all workers of one run.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use rustc_hash::FxBuildHasher;

use crate::{ClassArtifact, ResolutionKey};

/// Cached answer for one class name.
///
/// `NotFound` is stored explicitly: proving absence costs a full classpath
/// scan, and many pages probe the same absent names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolutionEntry {
    Found(Arc<ClassArtifact>),
    NotFound,
}

impl ResolutionEntry {
    pub fn found(artifact: ClassArtifact) -> Self {
        ResolutionEntry::Found(Arc::new(artifact))
    }

    pub fn is_found(&self) -> bool {
        matches!(self, ResolutionEntry::Found(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ResolutionEntry::NotFound)
    }

    pub fn artifact(&self) -> Option<&Arc<ClassArtifact>> {
        match self {
            ResolutionEntry::Found(artifact) => Some(artifact),
            ResolutionEntry::NotFound => None,
        }
    }
}

/// Counters describing how the cache was used during a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Distinct names with a published entry.
    pub entries: usize,
    /// Entries that are `Found`.
    pub found: usize,
    /// Entries that are `NotFound`.
    pub not_found: usize,
    /// Lookups answered from the cache.
    pub hits: usize,
    /// Lookups that had to scan.
    pub misses: usize,
}

/// Concurrent mapping from class name to [`ResolutionEntry`].
///
/// Entries are published whole: a reader either sees no entry or a fully
/// constructed one. Once a key is present it is never replaced.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: DashMap<ResolutionKey, ResolutionEntry, FxBuildHasher>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl ResolutionCache {
    pub fn new() -> Self {
        ResolutionCache {
            entries: DashMap::with_hasher(FxBuildHasher),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    /// Look up a published entry without computing anything.
    pub fn get(&self, key: &ResolutionKey) -> Option<ResolutionEntry> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Return the entry for `key`, computing and publishing it on a miss.
    ///
    /// `compute` runs with no shard lock held, so a slow classpath scan never
    /// blocks readers of other keys. When two threads miss on the same key
    /// concurrently both compute; the first insert wins and both callers get
    /// that entry back.
    pub fn get_or_compute<F>(&self, key: &ResolutionKey, compute: F) -> ResolutionEntry
    where
        F: FnOnce() -> ResolutionEntry,
    {
        // Fast path: already published
        if let Some(entry) = self.get(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return entry;
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let computed = compute();

        self.entries
            .entry(key.clone())
            .or_insert(computed)
            .value()
            .clone()
    }

    pub fn contains(&self, key: &ResolutionKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            ..CacheStats::default()
        };
        for entry in &self.entries {
            stats.entries += 1;
            if entry.value().is_found() {
                stats.found += 1;
            } else {
                stats.not_found += 1;
            }
        }
        stats
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
