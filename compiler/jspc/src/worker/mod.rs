//! One worker: compile a shard in order and report what happened.
//!
//! A worker owns its [`CompilationContext`] outright. The only state it
//! shares with other workers is the resolution cache inside that context.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::PathBuf;

use jspc_diagnostic::DiagnosticList;
use jspc_resolve::CompilationContext;

use crate::compile::{compile_unit, CompilationOutcome, UnitCompiler};
use crate::fragment::{write_fragment, ServletMapping};
use crate::partition::WorkShard;
use crate::{JspcError, SourceFile};

/// Per-run settings every worker shares.
#[derive(Clone, Debug)]
pub struct WorkerOptions {
    /// Abandon the rest of the shard after the first failed page.
    pub stop_at_first_error: bool,
    /// Where this worker writes its descriptor fragment.
    pub fragment_path: PathBuf,
    /// Declarations of unchanged pages carried over from the previous
    /// build, written ahead of the ones this worker produces.
    pub carried: Vec<ServletMapping>,
}

/// Everything one worker did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub worker: usize,
    /// Pages in the shard.
    pub assigned: usize,
    /// Pages that compiled, in shard order.
    pub compiled: Vec<SourceFile>,
    /// Pages that produced diagnostics, in shard order.
    pub failed: Vec<SourceFile>,
    /// Pages never attempted because the worker stopped early.
    pub skipped: usize,
    pub diagnostics: DiagnosticList,
    /// Servlet declarations of compiled pages, by relative path.
    pub mappings: BTreeMap<String, ServletMapping>,
    /// Fragment written by this worker, if it had anything to declare.
    pub fragment: Option<PathBuf>,
}

impl WorkerReport {
    fn new(worker: usize, assigned: usize) -> Self {
        WorkerReport {
            worker,
            assigned,
            ..WorkerReport::default()
        }
    }

    pub fn is_failure(&self) -> bool {
        !self.failed.is_empty()
    }

    /// Human-readable failure report, `None` when every page compiled.
    pub fn failure_summary(&self) -> Option<String> {
        if !self.is_failure() {
            return None;
        }
        let mut text = format!(
            "worker {} failed: {} of {} file(s) did not compile",
            self.worker,
            self.failed.len(),
            self.assigned
        );
        if self.skipped > 0 {
            let _ = write!(text, ", {} not attempted", self.skipped);
        }
        for diagnostic in &self.diagnostics {
            let _ = write!(text, "\n  {diagnostic}");
        }
        Some(text)
    }
}

/// Compile every page of `shard` in order inside `ctx`.
///
/// Page-level problems end up in the report. Only a [`CompileFault`] or a
/// failure to write the fragment is returned as an error.
///
/// [`CompileFault`]: crate::compile::CompileFault
#[tracing::instrument(level = "debug", skip_all, fields(worker = shard.index, files = shard.len()))]
pub fn run_worker(
    ctx: &mut CompilationContext,
    shard: WorkShard<'_, SourceFile>,
    compiler: &dyn UnitCompiler,
    options: &WorkerOptions,
) -> Result<WorkerReport, JspcError> {
    let mut report = WorkerReport::new(shard.index, shard.len());
    let mut mappings = options.carried.clone();

    for (position, file) in shard.items.iter().enumerate() {
        match compile_unit(compiler, file, ctx)? {
            CompilationOutcome::Success { mapping, .. } => {
                if let Some(mapping) = mapping {
                    mappings.push(mapping.clone());
                    report.mappings.insert(file.relative.clone(), mapping);
                }
                report.compiled.push(file.clone());
            }
            CompilationOutcome::Failure { diagnostics } => {
                report.diagnostics.extend(diagnostics);
                report.failed.push(file.clone());
                if options.stop_at_first_error {
                    report.skipped = shard.len() - position - 1;
                    if report.skipped > 0 {
                        tracing::debug!(
                            skipped = report.skipped,
                            "stopping at first error in {}",
                            file.relative
                        );
                    }
                    break;
                }
            }
        }
    }

    if !mappings.is_empty() {
        write_fragment(&options.fragment_path, &mappings)?;
        report.fragment = Some(options.fragment_path.clone());
    }
    Ok(report)
}
