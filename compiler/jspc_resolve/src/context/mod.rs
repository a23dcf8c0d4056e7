//! Per-worker compilation context.
//!
//! The context answers the compiler's "does this class exist, and what are
//! its bytes" callbacks. It consults the shared [`ResolutionCache`] first and
//! falls back to its [`ClassSource`] on a miss.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{
    ClassArtifact, ClassSource, CompilerSettings, ResolutionCache, ResolutionEntry, ResolutionKey,
};

/// The unit currently being compiled by one context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetUnit {
    /// Class the unit compiles to.
    pub class_name: ResolutionKey,
    /// Translated source of the unit.
    pub source: PathBuf,
}

impl TargetUnit {
    pub fn new(class_name: impl Into<ResolutionKey>, source: impl Into<PathBuf>) -> Self {
        TargetUnit {
            class_name: class_name.into(),
            source: source.into(),
        }
    }
}

/// Answer to a class lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    Found(Arc<ClassArtifact>),
    NotFound,
    /// The name is the unit being compiled; its source is in progress.
    UnderCompilation(TargetUnit),
}

impl Resolution {
    /// True for anything that names an existing type.
    pub fn exists(&self) -> bool {
        !matches!(self, Resolution::NotFound)
    }
}

impl From<ResolutionEntry> for Resolution {
    fn from(entry: ResolutionEntry) -> Self {
        match entry {
            ResolutionEntry::Found(artifact) => Resolution::Found(artifact),
            ResolutionEntry::NotFound => Resolution::NotFound,
        }
    }
}

/// Class-resolution environment owned by one worker.
///
/// Settings are owned (copied per worker); the cache and class source are
/// shared by every context of the run.
pub struct CompilationContext {
    worker: usize,
    settings: CompilerSettings,
    cache: Arc<ResolutionCache>,
    source: Arc<dyn ClassSource>,
    target: Option<TargetUnit>,
}

impl CompilationContext {
    pub fn new(
        worker: usize,
        settings: CompilerSettings,
        cache: Arc<ResolutionCache>,
        source: Arc<dyn ClassSource>,
    ) -> Self {
        CompilationContext {
            worker,
            settings,
            cache,
            source,
            target: None,
        }
    }

    pub fn worker(&self) -> usize {
        self.worker
    }

    pub fn settings(&self) -> &CompilerSettings {
        &self.settings
    }

    pub fn output_dir(&self) -> &Path {
        &self.settings.output_dir
    }

    pub fn cache(&self) -> &Arc<ResolutionCache> {
        &self.cache
    }

    /// Mark `target` as the unit being compiled.
    pub fn begin_unit(&mut self, target: TargetUnit) {
        self.target = Some(target);
    }

    /// Clear the unit being compiled, returning it.
    pub fn end_unit(&mut self) -> Option<TargetUnit> {
        self.target.take()
    }

    pub fn target(&self) -> Option<&TargetUnit> {
        self.target.as_ref()
    }

    /// Resolve a dotted binary class name.
    pub fn resolve(&self, name: &str) -> Resolution {
        self.resolve_key(&ResolutionKey::new(name))
    }

    /// Resolve a compound name given as segments (`["java", "util", "List"]`).
    pub fn resolve_compound<S: AsRef<str>>(&self, segments: &[S]) -> Resolution {
        self.resolve_key(&ResolutionKey::from_segments(segments))
    }

    /// Resolve `type_name` inside `package`.
    pub fn resolve_in_package<S: AsRef<str>>(&self, type_name: &str, package: &[S]) -> Resolution {
        self.resolve_key(&ResolutionKey::qualified(package, type_name))
    }

    /// Resolve a key: the unit under compilation is answered directly and
    /// never cached; everything else goes through the shared cache.
    pub fn resolve_key(&self, key: &ResolutionKey) -> Resolution {
        if let Some(target) = self.target.as_ref().filter(|t| &t.class_name == key) {
            return Resolution::UnderCompilation(target.clone());
        }
        self.lookup(key).into()
    }

    /// Decide whether `parent.segment` names a package.
    ///
    /// A name is a package when it does not resolve to a class. Segments
    /// starting with an uppercase letter, or containing a dot, are taken to
    /// be type names and answered `false` without touching the classpath.
    pub fn is_package<S: AsRef<str>>(&self, parent: &[S], segment: &str) -> bool {
        if !needs_class_check(segment) {
            return false;
        }
        let key = ResolutionKey::qualified(parent, segment);
        self.is_package_name(&key)
    }

    /// Whether every prefix of a dotted name is a package (`a`, `a.b`, ...).
    pub fn is_package_path(&self, dotted: &str) -> bool {
        let segments: Vec<&str> = dotted.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return false;
        }
        (0..segments.len()).all(|i| self.is_package(&segments[..i], segments[i]))
    }

    fn is_package_name(&self, key: &ResolutionKey) -> bool {
        if self.target.as_ref().is_some_and(|t| &t.class_name == key) {
            return false;
        }
        self.lookup(key).is_not_found()
    }

    fn lookup(&self, key: &ResolutionKey) -> ResolutionEntry {
        let source = &self.source;
        self.cache.get_or_compute(key, || {
            tracing::trace!(worker = self.worker, class = %key, "classpath scan");
            source.scan(key)
        })
    }
}

/// Whether a single name segment could be a package and is worth a lookup.
fn needs_class_check(segment: &str) -> bool {
    match segment.chars().next() {
        None => false,
        Some(first) if first.is_uppercase() => false,
        Some(_) => !segment.contains('.'),
    }
}
