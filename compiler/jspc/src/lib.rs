//! Parallel ahead-of-time page precompiler.
//!
//! Discovers pages under a web application directory, splits them into
//! balanced shards, compiles each shard on its own worker thread, and merges
//! the servlet declarations every worker produced into the application
//! descriptor.
//!
//! # Architecture
//!
//! ```text
//! jspc.toml + CLI ──► ResolvedConfig
//!                          │
//!                          ▼
//! discover() ──► filter_changed() ──► partition()
//!                                          │  one WorkShard per worker
//!                                          ▼
//!                   pool::run ── run_worker(ctx_i, shard_i) ──► WorkerReport
//!                                          │        │
//!                                          │        └── fragment_i
//!                                          ▼
//!                                      aggregate() ──► BuildSummary
//!                                          │  success
//!                                          ▼
//!                                  FragmentMerger::merge()
//! ```
//!
//! Workers never talk to each other. Each owns a
//! [`jspc_resolve::CompilationContext`]; the contexts share one
//! [`jspc_resolve::ResolutionCache`] for the duration of the run.

pub mod compile;
pub mod config;
pub mod delta;
pub mod discovery;
pub mod error;
pub mod fragment;
pub mod orchestrator;
pub mod partition;
pub mod pool;
pub mod report;
pub mod tracing_setup;
pub mod worker;

pub use compile::{CompilationOutcome, CompileFault, DirectiveCompiler, UnitCompiler};
pub use config::{load_config, ConfigError, ConfigOverrides, JspcConfig, ResolvedConfig};
pub use discovery::SourceFile;
pub use error::JspcError;
pub use orchestrator::Precompiler;
pub use report::BuildSummary;
