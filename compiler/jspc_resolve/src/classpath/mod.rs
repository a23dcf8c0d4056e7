//! Classpath scanning: the slow path behind the resolution cache.

use std::io;
use std::path::{Path, PathBuf};

use crate::{ClassArtifact, ResolutionEntry, ResolutionKey};

/// Something that can prove a class exists (and load it) or prove it absent.
///
/// Implementations are called only on cache misses, concurrently from
/// several workers, so they must be `Send + Sync`.
pub trait ClassSource: Send + Sync {
    /// Scan for `key`, returning `Found` with its bytes or `NotFound`.
    ///
    /// Unreadable or malformed class files are reported as `NotFound`.
    fn scan(&self, key: &ResolutionKey) -> ResolutionEntry;
}

/// Ordered list of class directories searched front to back.
#[derive(Clone, Debug, Default)]
pub struct Classpath {
    entries: Vec<PathBuf>,
}

impl Classpath {
    /// Build a classpath from entries, keeping only directories.
    ///
    /// Archive and missing entries are skipped with a warning.
    pub fn new(entries: impl IntoIterator<Item = PathBuf>) -> Self {
        let entries = entries
            .into_iter()
            .filter(|entry| {
                if entry.is_dir() {
                    true
                } else if entry.exists() {
                    tracing::warn!(
                        entry = %entry.display(),
                        "classpath entry is not a directory, skipping"
                    );
                    false
                } else {
                    tracing::debug!(entry = %entry.display(), "classpath entry does not exist");
                    false
                }
            })
            .collect();
        Classpath { entries }
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn load(key: &ResolutionKey, path: &Path) -> io::Result<Option<ClassArtifact>> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        match ClassArtifact::from_bytes(key.clone(), bytes, path.to_path_buf()) {
            Ok(artifact) => Ok(Some(artifact)),
            Err(e) => {
                tracing::error!(class = %key, path = %path.display(), "compilation error: {e}");
                Ok(None)
            }
        }
    }
}

impl ClassSource for Classpath {
    fn scan(&self, key: &ResolutionKey) -> ResolutionEntry {
        let resource = key.resource_path();
        for entry in &self.entries {
            let path = entry.join(&resource);
            match Self::load(key, &path) {
                Ok(Some(artifact)) => return ResolutionEntry::found(artifact),
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(class = %key, path = %path.display(), "compilation error: {e}");
                    return ResolutionEntry::NotFound;
                }
            }
        }
        ResolutionEntry::NotFound
    }
}
