//! Change detection between runs.
//!
//! The orchestrator filters discovered pages through a [`ChangeDetector`]
//! before partitioning. [`FullBuild`] selects everything; [`HashManifest`]
//! compares content hashes against the previous successful compilation and
//! remembers the servlet declaration each compiled page produced, so pages
//! left out of an incremental run keep their place in the descriptor.

use std::collections::BTreeMap;
use std::hash::Hasher;
use std::io;
use std::path::{Path, PathBuf};

use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};

use crate::fragment::ServletMapping;
use crate::{JspcError, SourceFile};

/// Answers whether a page changed since the last build.
pub trait ChangeDetector {
    fn has_delta(&self, file: &SourceFile) -> bool;
}

/// Treats every page as changed.
#[derive(Copy, Clone, Debug, Default)]
pub struct FullBuild;

impl ChangeDetector for FullBuild {
    fn has_delta(&self, _file: &SourceFile) -> bool {
        true
    }
}

/// Keep only the pages `detector` reports as changed, preserving order.
pub fn filter_changed(files: Vec<SourceFile>, detector: &dyn ChangeDetector) -> Vec<SourceFile> {
    let total = files.len();
    let changed: Vec<SourceFile> = files.into_iter().filter(|f| detector.has_delta(f)).collect();
    if changed.len() < total {
        tracing::info!(
            "{} of {total} files changed since the last build",
            changed.len()
        );
    }
    if !changed.is_empty() {
        tracing::info!(
            "Files selected to precompile: {}",
            changed
                .iter()
                .map(|f| f.relative.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    changed
}

const MANIFEST_VERSION: u32 = 2;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct PageRecord {
    hash: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mapping: Option<ServletMapping>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ManifestFile {
    version: u32,
    files: BTreeMap<String, PageRecord>,
}

/// Content hashes and servlet declarations of the pages compiled
/// successfully by earlier runs.
#[derive(Debug)]
pub struct HashManifest {
    path: PathBuf,
    pages: BTreeMap<String, PageRecord>,
}

impl HashManifest {
    /// Load the manifest at `path`.
    ///
    /// A missing, unreadable or outdated manifest starts empty, which makes
    /// every page dirty.
    pub fn load(path: &Path) -> Self {
        let pages = match std::fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str::<ManifestFile>(&text) {
                Ok(file) if file.version == MANIFEST_VERSION => file.files,
                Ok(file) => {
                    tracing::info!(
                        version = file.version,
                        "ignoring build state from another version"
                    );
                    BTreeMap::new()
                }
                Err(e) => {
                    tracing::warn!("ignoring corrupt build state {}: {e}", path.display());
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                tracing::warn!("cannot read build state {}: {e}", path.display());
                BTreeMap::new()
            }
        };
        HashManifest {
            path: path.to_path_buf(),
            pages,
        }
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Record the current content of successfully compiled pages together
    /// with the servlet declaration each one produced.
    pub fn record<'a>(
        &mut self,
        pages: impl IntoIterator<Item = (&'a SourceFile, Option<&'a ServletMapping>)>,
    ) {
        for (file, mapping) in pages {
            match content_hash(&file.path) {
                Ok(hash) => {
                    let record = PageRecord {
                        hash,
                        mapping: mapping.cloned(),
                    };
                    self.pages.insert(file.relative.clone(), record);
                }
                Err(e) => {
                    tracing::debug!("cannot hash {}: {e}", file.path.display());
                    self.pages.remove(&file.relative);
                }
            }
        }
    }

    /// Forget pages, so the next run compiles them again.
    pub fn forget<'a>(&mut self, files: impl IntoIterator<Item = &'a SourceFile>) {
        for file in files {
            self.pages.remove(&file.relative);
        }
    }

    /// Servlet declaration recorded for `file` by the build that compiled it.
    pub fn mapping(&self, file: &SourceFile) -> Option<&ServletMapping> {
        self.pages.get(&file.relative)?.mapping.as_ref()
    }

    pub fn save(&self) -> Result<(), JspcError> {
        let file = ManifestFile {
            version: MANIFEST_VERSION,
            files: self.pages.clone(),
        };
        let text = serde_json::to_string_pretty(&file).map_err(|source| JspcError::State {
            path: self.path.clone(),
            source,
        })?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| JspcError::io("create", parent, e))?;
        }
        std::fs::write(&self.path, text).map_err(|e| JspcError::io("write", &self.path, e))
    }
}

impl ChangeDetector for HashManifest {
    fn has_delta(&self, file: &SourceFile) -> bool {
        let Some(recorded) = self.pages.get(&file.relative) else {
            return true;
        };
        content_hash(&file.path).map_or(true, |hash| hash != recorded.hash)
    }
}

fn content_hash(path: &Path) -> io::Result<u64> {
    let bytes = std::fs::read(path)?;
    let mut hasher = FxHasher::default();
    hasher.write_usize(bytes.len());
    hasher.write(&bytes);
    Ok(hasher.finish())
}
