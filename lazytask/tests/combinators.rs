use futures::executor::block_on;
use lazytask::{
    Cancel, Outcome, Status, StatusKind, Task, TaskFailure, all, parallel, race, sequence,
};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// A task that never settles and raises `flag` when cancelled.
fn pending(flag: &Arc<AtomicBool>) -> Task<i32, String> {
    let flag = flag.clone();

    Task::new(move |_resolver| {
        let flag = flag.clone();
        Cancel::new(move || flag.store(true, Ordering::SeqCst))
    })
}

fn wait(millis: u64, value: i32) -> Task<i32, String> {
    Task::wait(Duration::from_millis(millis), value)
}

#[test]
fn test_all_keeps_input_order() {
    let task = all([wait(30, 1), wait(10, 2), Task::of(3)]);

    let outcome = block_on(task.fork(|_| {}, |_| {}).settled());

    assert_eq!(outcome, Outcome::Resolved(vec![1, 2, 3]));
}

#[test]
fn test_all_empty_resolves() {
    let task = all(Vec::<Task<i32, String>>::new());

    assert_eq!(task.fork(|_| {}, |_| {}).inspect(), Status::Resolved(vec![]));
}

#[test]
fn test_all_rejects_and_cancels_others() {
    let cancelled = Arc::new(AtomicBool::new(false));
    let task = all([pending(&cancelled), Task::reject("no".to_owned())]);

    let execution = task.fork(|_| {}, |_| {});

    assert_eq!(execution.inspect(), Status::Rejected("no".to_owned()));
    assert!(
        cancelled.load(Ordering::SeqCst),
        "Pending constituents should be cancelled on failure"
    );
}

#[test]
fn test_all_cancel_cancels_constituents() {
    let (first, second) = (Arc::new(AtomicBool::new(false)), Arc::new(AtomicBool::new(false)));
    let execution = all([pending(&first), pending(&second)]).fork(|_| {}, |_| {});

    execution.cancel().unwrap();

    assert_eq!(execution.status(), StatusKind::Cancelled);
    assert!(first.load(Ordering::SeqCst));
    assert!(second.load(Ordering::SeqCst));
}

#[test]
fn test_race_first_wins() {
    let loser = Arc::new(AtomicBool::new(false));
    let task = race([pending(&loser), wait(10, 7)]);

    let execution = task.fork(|_| {}, |_| {});
    let outcome = block_on(execution.settled());

    assert_eq!(outcome, Outcome::Resolved(7));
    assert!(loser.load(Ordering::SeqCst), "Losers should be cancelled");
}

#[test]
fn test_race_rejection_wins() {
    let task = race([wait(50, 1), Task::reject("fast failure".to_owned())]);

    let execution = task.fork(|_| {}, |_| {});

    assert_eq!(execution.inspect(), Status::Rejected("fast failure".to_owned()));
}

#[test]
fn test_race_empty_stays_pending() {
    let execution = race(Vec::<Task<i32, String>>::new()).fork(|_| {}, |_| {});

    assert_eq!(execution.status(), StatusKind::Pending);
    assert!(execution.cancel().is_ok());
    assert_eq!(execution.status(), StatusKind::Cancelled);
}

#[test]
fn test_sequence_runs_one_after_another() {
    let task = sequence([wait(30, 1), wait(20, 2), wait(10, 3)]);

    let start = Instant::now();
    let outcome = block_on(task.fork(|_| {}, |_| {}).settled());
    let elapsed = start.elapsed();

    assert_eq!(outcome, Outcome::Resolved(vec![Ok(1), Ok(2), Ok(3)]));
    assert!(
        elapsed >= Duration::from_millis(60),
        "Sequence should wait for each task in turn"
    );
}

#[test]
fn test_sequence_records_failures() {
    let task = sequence([
        Task::of(1),
        Task::reject("second".to_owned()),
        Task::of(3),
    ]);

    assert_eq!(
        task.fork(|_| {}, |_| {}).inspect(),
        Status::Resolved(vec![
            Ok(1),
            Err(TaskFailure {
                index: 1,
                reason: "second".to_owned()
            }),
            Ok(3),
        ])
    );
}

#[test]
fn test_sequence_handles_long_synchronous_input() {
    let tasks: Vec<Task<usize, String>> = (0..10_000).map(Task::of).collect();

    let execution = sequence(tasks).fork(|_| {}, |_| {});

    let Status::Resolved(results) = execution.inspect() else {
        panic!("sequence of synchronous tasks should resolve synchronously");
    };
    assert_eq!(results.len(), 10_000);
    assert_eq!(results[9_999], Ok(9_999));
}

#[test]
fn test_sequence_cancel_stops_remaining() {
    let started = Arc::new(AtomicBool::new(false));
    let flag = started.clone();

    let last = Task::<i32, String>::new(move |resolver| {
        flag.store(true, Ordering::SeqCst);
        resolver.resolve(0);
        Cancel::noop()
    });

    let cancelled = Arc::new(AtomicBool::new(false));
    let execution = sequence([pending(&cancelled), last]).fork(|_| {}, |_| {});

    execution.cancel().unwrap();

    assert!(cancelled.load(Ordering::SeqCst));
    assert!(!started.load(Ordering::SeqCst));
}

#[test]
fn test_parallel_keeps_completion_order() {
    let task = parallel([wait(30, 1), wait(10, 2), Task::of(3)]);

    let outcome = block_on(task.fork(|_| {}, |_| {}).settled());

    assert_eq!(outcome, Outcome::Resolved(vec![Ok(3), Ok(2), Ok(1)]));
}

#[test]
fn test_parallel_records_failures() {
    let task = parallel([Task::reject("first".to_owned()), Task::of(2)]);

    assert_eq!(
        task.fork(|_| {}, |_| {}).inspect(),
        Status::Resolved(vec![
            Err(TaskFailure {
                index: 0,
                reason: "first".to_owned()
            }),
            Ok(2),
        ])
    );
}

#[test]
fn test_parallel_runs_concurrently() {
    let task = parallel([wait(40, 1), wait(40, 2), wait(40, 3)]);

    let start = Instant::now();
    let outcome = block_on(task.fork(|_| {}, |_| {}).settled());

    assert!(outcome.is_resolved());
    assert!(start.elapsed() >= Duration::from_millis(40));
}

#[test]
fn test_task_failure_display() {
    let failure = TaskFailure {
        index: 2,
        reason: "boom".to_owned(),
    };

    assert_eq!(failure.to_string(), "task #2 failed: \"boom\"");
}

#[test]
fn test_sequence_records_panicking_subscription() {
    let task = sequence([
        Task::<i32, String>::of(1),
        Task::new(|_resolver| panic!("bad source")),
        Task::of(3),
    ]);

    assert_eq!(
        task.fork(|_| {}, |_| {}).inspect(),
        Status::Resolved(vec![
            Ok(1),
            Err(TaskFailure {
                index: 1,
                reason: "defect in `sequence`: bad source".to_owned(),
            }),
            Ok(3),
        ])
    );
}

#[test]
fn test_sequence_survives_panic_after_wait() {
    let task = sequence([wait(10, 1), Task::new(|_resolver| panic!("late source"))]);

    let outcome = block_on(task.fork(|_| {}, |_| {}).settled());

    assert_eq!(
        outcome,
        Outcome::Resolved(vec![
            Ok(1),
            Err(TaskFailure {
                index: 1,
                reason: "defect in `sequence`: late source".to_owned(),
            }),
        ])
    );
}
