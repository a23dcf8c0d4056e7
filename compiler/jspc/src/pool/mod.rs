//! Fixed-size worker pool.
//!
//! Runs one job per worker on a scoped rayon pool and waits for all of them.
//! Results come back in job order no matter which worker finishes first.

use std::panic::{catch_unwind, AssertUnwindSafe};

use rayon::prelude::*;

use crate::JspcError;

/// Run `work(index, job)` for every job on at most `threads` threads.
///
/// The pool lives only for this call. If it cannot be created the jobs run
/// sequentially on the calling thread. A job that panics does not take the
/// others down; the first panic (by job index) is returned once every job
/// has finished.
pub fn run<J, T, F>(threads: usize, jobs: Vec<J>, work: F) -> Result<Vec<T>, JspcError>
where
    J: Send,
    T: Send,
    F: Fn(usize, J) -> T + Sync,
{
    if jobs.is_empty() {
        return Ok(Vec::new());
    }
    let guarded = |(index, job): (usize, J)| {
        catch_unwind(AssertUnwindSafe(|| work(index, job))).map_err(|payload| {
            JspcError::WorkerPanicked {
                worker: index,
                message: panic_message(payload.as_ref()),
            }
        })
    };

    let mut pending = Some(jobs);
    let results = rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .thread_name(|i| format!("jspc-worker-{i}"))
        .build_scoped(rayon::ThreadBuilder::run, |pool| {
            let jobs = pending.take().unwrap_or_default();
            pool.install(|| {
                jobs.into_par_iter()
                    .enumerate()
                    .map(guarded)
                    .collect::<Vec<_>>()
            })
        })
        .unwrap_or_else(|e| {
            tracing::warn!("failed to create thread pool ({e}), running sequentially");
            pending
                .take()
                .unwrap_or_default()
                .into_iter()
                .enumerate()
                .map(guarded)
                .collect()
        });

    results.into_iter().collect()
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "worker panicked".to_string()
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
