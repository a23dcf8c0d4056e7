use super::*;
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use std::sync::Barrier;
use std::thread;

fn artifact(name: &str) -> ClassArtifact {
    ClassArtifact::from_bytes(
        ResolutionKey::new(name),
        vec![0xCA, 0xFE, 0xBA, 0xBE, 0, 0, 0, 52],
        PathBuf::from(format!("{name}.class")),
    )
    .unwrap()
}

#[test]
fn miss_then_hit() {
    let cache = ResolutionCache::new();
    let key = ResolutionKey::new("a.B");
    let mut computed = 0;

    let first = cache.get_or_compute(&key, || {
        computed += 1;
        ResolutionEntry::found(artifact("a.B"))
    });
    let second = cache.get_or_compute(&key, || {
        computed += 1;
        ResolutionEntry::NotFound
    });

    assert_eq!(computed, 1);
    assert_eq!(first, second);
    assert!(second.is_found());

    let stats = cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.found, 1);
}

#[test]
fn negative_entries_are_cached() {
    let cache = ResolutionCache::new();
    let key = ResolutionKey::new("no.Such");

    assert!(cache.get_or_compute(&key, || ResolutionEntry::NotFound).is_not_found());
    let again = cache.get_or_compute(&key, || ResolutionEntry::found(artifact("no.Such")));

    assert!(again.is_not_found(), "absent name must not be recomputed");
    assert_eq!(cache.stats().not_found, 1);
}

#[test]
fn first_published_entry_is_kept() {
    let cache = ResolutionCache::new();
    let key = ResolutionKey::new("a.B");

    // Simulate a racing writer publishing between our miss and our insert.
    let result = cache.get_or_compute(&key, || {
        cache.get_or_compute(&key, || ResolutionEntry::NotFound);
        ResolutionEntry::found(artifact("a.B"))
    });

    assert!(result.is_not_found());
    assert_eq!(cache.get(&key), Some(ResolutionEntry::NotFound));
    assert_eq!(cache.len(), 1);
}

#[test]
fn concurrent_lookups_agree() {
    let cache = ResolutionCache::new();
    let barrier = Barrier::new(8);
    let keys = ["a.Found", "a.Missing"];

    let results: Vec<Vec<ResolutionEntry>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    keys.iter()
                        .map(|name| {
                            let key = ResolutionKey::new(name);
                            cache.get_or_compute(&key, || {
                                if name.ends_with("Found") {
                                    ResolutionEntry::found(artifact(name))
                                } else {
                                    ResolutionEntry::NotFound
                                }
                            })
                        })
                        .collect()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for per_thread in &results {
        assert_eq!(per_thread, &results[0]);
    }
    assert!(results[0][0].is_found());
    assert!(results[0][1].is_not_found());
    assert_eq!(cache.len(), 2);
}

#[test]
fn stats_on_empty_cache() {
    let cache = ResolutionCache::new();
    assert!(cache.is_empty());
    assert_eq!(cache.stats(), CacheStats::default());
}
