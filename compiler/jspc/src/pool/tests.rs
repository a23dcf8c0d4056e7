use super::*;
use std::collections::HashSet;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

#[test]
fn results_follow_job_order() {
    // later jobs finish first
    let results = run(4, vec![40u64, 30, 20, 10], |index, delay| {
        thread::sleep(Duration::from_millis(delay));
        (index, delay)
    })
    .unwrap();

    assert_eq!(results, vec![(0, 40), (1, 30), (2, 20), (3, 10)]);
}

#[test]
fn jobs_run_on_several_threads() {
    let seen = Mutex::new(HashSet::new());
    let barrier = std::sync::Barrier::new(2);

    run(2, vec![(), ()], |_, ()| {
        // both jobs must be in flight together to get past the barrier
        barrier.wait();
        seen.lock().insert(thread::current().id());
    })
    .unwrap();

    assert_eq!(seen.lock().len(), 2);
}

#[test]
fn zero_threads_still_runs() {
    let results = run(0, vec![1, 2, 3], |_, n| n * 2).unwrap();
    assert_eq!(results, vec![2, 4, 6]);
}

#[test]
fn no_jobs() {
    let results: Vec<()> = run(3, Vec::<()>::new(), |_, ()| ()).unwrap();
    assert!(results.is_empty());
}

#[test]
fn panic_becomes_error_after_others_finish() {
    let finished = Mutex::new(Vec::new());

    let err = run(3, vec![0, 1, 2], |index, _| {
        if index == 1 {
            panic!("shard exploded");
        }
        finished.lock().push(index);
    })
    .unwrap_err();

    match err {
        JspcError::WorkerPanicked { worker, message } => {
            assert_eq!(worker, 1);
            assert_eq!(message, "shard exploded");
        }
        other => panic!("unexpected error: {other}"),
    }
    let mut finished = finished.into_inner();
    finished.sort_unstable();
    assert_eq!(finished, vec![0, 2]);
}
