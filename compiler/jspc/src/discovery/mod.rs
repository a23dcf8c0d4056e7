//! Page discovery.
//!
//! Walks the web application directory and selects files whose relative
//! path matches an include pattern and no exclude pattern. Matching is
//! case-insensitive and uses `/` as separator on every platform.

use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use crate::JspcError;

/// Exclusions applied in addition to the configured ones.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "**/.git/**",
    "**/.svn/**",
    "**/.hg/**",
    "**/CVS/**",
    "**/.DS_Store",
    "**/*~",
    "**/#*#",
    "**/.#*",
];

/// One page to compile.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceFile {
    /// Path relative to the web application root, `/`-separated.
    pub relative: String,
    /// Path on disk.
    pub path: PathBuf,
}

impl SourceFile {
    pub fn new(root: &Path, relative: impl Into<String>) -> Self {
        let relative = relative.into();
        SourceFile {
            path: root.join(&relative),
            relative,
        }
    }
}

/// Compiled include and exclude patterns.
#[derive(Clone, Debug)]
pub struct FileSelector {
    includes: GlobSet,
    excludes: GlobSet,
}

impl FileSelector {
    pub fn new<S: AsRef<str>>(includes: &[S], excludes: &[S]) -> Result<Self, JspcError> {
        let excludes = excludes
            .iter()
            .map(S::as_ref)
            .chain(DEFAULT_EXCLUDES.iter().copied());
        Ok(FileSelector {
            includes: build_set(includes.iter().map(S::as_ref))?,
            excludes: build_set(excludes)?,
        })
    }

    /// Whether a `/`-separated relative path is selected.
    pub fn is_selected(&self, relative: &str) -> bool {
        self.includes.is_match(relative) && !self.excludes.is_match(relative)
    }
}

fn build_set<'a>(patterns: impl Iterator<Item = &'a str>) -> Result<GlobSet, JspcError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .case_insensitive(true)
            .literal_separator(true)
            .build()
            .map_err(|source| JspcError::Pattern {
                pattern: pattern.to_string(),
                source,
            })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| JspcError::Pattern {
        pattern: "<set>".to_string(),
        source,
    })
}

/// Find every selected file under `root`, sorted by relative path.
///
/// A missing root yields no files.
pub fn discover(root: &Path, selector: &FileSelector) -> Vec<SourceFile> {
    if !root.is_dir() {
        tracing::warn!("source directory {} does not exist", root.display());
        return Vec::new();
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("skipping unreadable entry: {e}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let relative = to_slash(relative);
        if selector.is_selected(&relative) {
            files.push(SourceFile {
                relative,
                path: entry.into_path(),
            });
        }
    }
    files.sort();

    tracing::debug!(
        "Included files returned from directory scan: {}",
        files
            .iter()
            .map(|f| f.relative.as_str())
            .collect::<Vec<_>>()
            .join(",")
    );
    files
}

fn to_slash(path: &Path) -> String {
    let mut out = String::new();
    for (i, component) in path.components().enumerate() {
        if i > 0 {
            out.push('/');
        }
        out.push_str(&component.as_os_str().to_string_lossy());
    }
    out
}
