//! Class resolution shared by parallel compile workers.
//!
//! Every worker owns a [`CompilationContext`]; all contexts of one run hold a
//! reference to the same [`ResolutionCache`]. Reading and parsing a library
//! class therefore costs one classpath scan per distinct class name for the
//! whole run rather than one per worker.
//!
//! # Architecture
//!
//! ```text
//! compiler ──resolve(name)──► CompilationContext
//!                                  │  target under compilation? ──► UnderCompilation
//!                                  ▼
//!                             ResolutionCache (DashMap, shared)
//!                                  │  miss
//!                                  ▼
//!                             ClassSource::scan (Classpath)
//! ```
//!
//! # Concurrency Model
//!
//! The cache is the only state mutated by more than one thread. Lookups clone
//! an entry out of a shard and release the shard lock before returning. The
//! classpath scan on a miss runs with no lock held; the result is published
//! with insert-if-absent, so two workers racing on the same name both end up
//! with the first published entry. Negative answers are cached as well.

mod cache;
mod class_file;
mod classpath;
mod context;
mod key;
mod settings;

pub use cache::{CacheStats, ResolutionCache, ResolutionEntry};
pub use class_file::{parse_header, ClassArtifact, ClassFormatError, ClassMetadata};
pub use classpath::{ClassSource, Classpath};
pub use context::{CompilationContext, Resolution, TargetUnit};
pub use key::ResolutionKey;
pub use settings::{CompilerSettings, DecodeError, LanguageLevel, SourceEncoding};
