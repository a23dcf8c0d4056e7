//! Aggregation of worker reports into the build verdict.

use std::time::Duration;

use jspc_resolve::CacheStats;

use crate::worker::WorkerReport;

/// Totals for one run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildSummary {
    /// Pages handed to the workers after the delta filter.
    pub total_files: usize,
    pub compiled: usize,
    pub failed: usize,
    /// Pages skipped by workers that stopped at their first error.
    pub skipped: usize,
    pub workers: usize,
    /// Indices of workers that reported failures, ascending.
    pub failed_workers: Vec<usize>,
    /// Error diagnostics across all workers.
    pub errors: usize,
    pub cache: CacheStats,
    pub elapsed: Duration,
}

impl BuildSummary {
    pub fn is_success(&self) -> bool {
        self.failed_workers.is_empty()
    }

    pub fn processed(&self) -> usize {
        self.compiled + self.failed
    }
}

/// Fold every worker report into one summary.
///
/// Every failing report is logged, not just the first, so a run without
/// stop-at-first-error surfaces all of its diagnostics.
pub fn aggregate(reports: &[WorkerReport], cache: CacheStats, elapsed: Duration) -> BuildSummary {
    let mut summary = BuildSummary {
        workers: reports.len(),
        cache,
        elapsed,
        ..BuildSummary::default()
    };

    for report in reports {
        summary.total_files += report.assigned;
        summary.compiled += report.compiled.len();
        summary.failed += report.failed.len();
        summary.skipped += report.skipped;
        summary.errors += report.diagnostics.error_count();
        if let Some(text) = report.failure_summary() {
            tracing::error!("{text}");
            summary.failed_workers.push(report.worker);
        }
    }
    summary.failed_workers.sort_unstable();

    tracing::info!(
        "Processed {} of {} file(s): {} compiled, {} failed, {} skipped",
        summary.processed(),
        summary.total_files,
        summary.compiled,
        summary.failed,
        summary.skipped
    );
    tracing::debug!(
        entries = cache.entries,
        found = cache.found,
        not_found = cache.not_found,
        hits = cache.hits,
        scans = cache.misses,
        "resolution cache"
    );
    if !summary.is_success() {
        tracing::error!(
            "{} of {} worker(s) failed with {} error(s)",
            summary.failed_workers.len(),
            summary.workers,
            summary.errors
        );
    }
    summary
}

/// Format a duration as `M min, S sec`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{} min, {} sec", secs / 60, secs % 60)
}
