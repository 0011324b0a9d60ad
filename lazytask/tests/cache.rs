use futures::executor::block_on;
use lazytask::{Cancel, Outcome, Status, StatusKind, Task, all, race, sequence};

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn counting(runs: &Arc<AtomicUsize>) -> Task<usize, String> {
    let counter = runs.clone();

    Task::new(move |resolver| {
        resolver.resolve(counter.fetch_add(1, Ordering::SeqCst));
        Cancel::noop()
    })
}

#[test]
fn test_cache_runs_source_once() {
    let runs = Arc::new(AtomicUsize::new(0));
    let task = counting(&runs).cache();

    let first = task.fork(|_| {}, |_| {});
    let second = task.fork(|_| {}, |_| {});

    assert_eq!(first.inspect(), Status::Resolved(0));
    assert_eq!(second.inspect(), Status::Resolved(0));
    assert_eq!(runs.load(Ordering::SeqCst), 1, "Source should run exactly once");
}

#[test]
fn test_cache_shares_pending_execution() {
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = runs.clone();

    let task = Task::<usize, String>::new(move |resolver| {
        counter.fetch_add(1, Ordering::SeqCst);
        Task::<usize, String>::wait(Duration::from_millis(20), 5).fork(
            |_| {},
            move |value| resolver.resolve(value),
        );
        Cancel::noop()
    })
    .cache();

    let first = task.fork(|_| {}, |_| {});
    let second = task.fork(|_| {}, |_| {});

    assert_eq!(first.status(), StatusKind::Pending);
    assert_eq!(block_on(first.settled()), Outcome::Resolved(5));
    assert_eq!(block_on(second.settled()), Outcome::Resolved(5));
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn test_cache_replays_rejection() {
    let task = Task::<i32, String>::reject("once".to_owned()).cache();

    task.fork(|_| {}, |_| {});
    let later = task.fork(|_| {}, |_| {});

    assert_eq!(later.inspect(), Status::Rejected("once".to_owned()));
}

#[test]
fn test_cancelling_one_fork_cancels_all() {
    let task = Task::<i32, String>::wait(Duration::from_millis(100), 1).cache();

    let first = task.fork(|_| {}, |_| {});
    let second = task.fork(|_| {}, |_| {});

    first.cancel().unwrap();

    assert_eq!(first.inspect(), Status::Cancelled);
    assert_eq!(
        second.inspect(),
        Status::Cancelled,
        "Every fork shares the cancelled execution"
    );

    let third = task.fork(|_| {}, |_| {});
    assert_eq!(third.inspect(), Status::Cancelled);
}

#[test]
fn test_clone_shares_cache() {
    let runs = Arc::new(AtomicUsize::new(0));
    let task = counting(&runs).cache();
    let shared = task.clone();

    task.fork(|_| {}, |_| {});
    shared.fork(|_| {}, |_| {});

    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn test_duplicate_gets_fresh_cache() {
    let runs = Arc::new(AtomicUsize::new(0));
    let task = counting(&runs).cache();
    let copy = task.duplicate();

    assert_eq!(task.fork(|_| {}, |_| {}).inspect(), Status::Resolved(0));
    assert_eq!(copy.fork(|_| {}, |_| {}).inspect(), Status::Resolved(1));
    assert_eq!(task.fork(|_| {}, |_| {}).inspect(), Status::Resolved(0));
    assert_eq!(copy.fork(|_| {}, |_| {}).inspect(), Status::Resolved(1));
    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

#[test]
fn test_cache_lineage() {
    let task = Task::<i32, String>::of(1).map(|x| x + 1).cache();

    assert_eq!(task.lineage().to_string(), "of -> map -> cache");
}

#[test]
fn test_cancelling_shared_execution_reaches_derived_tasks() {
    let cached = Task::<i32, String>::wait(Duration::from_millis(50), 1).cache();

    let other = cached.fork(|_| {}, |_| {});
    let mapped = cached.map(|x| x + 1).fork(|_| {}, |_| {});
    let chained = Task::<i32, String>::of(0)
        .chain({
            let cached = cached.clone();
            move |_| cached.clone()
        })
        .fork(|_| {}, |_| {});
    let sequenced = sequence([cached.clone(), Task::of(2)]).fork(|_| {}, |_| {});
    let gathered = all([cached.clone(), Task::wait(Duration::from_millis(10), 2)])
        .fork(|_| {}, |_| {});
    let raced = race([cached.clone(), Task::wait(Duration::from_millis(200), 2)])
        .fork(|_| {}, |_| {});

    other.cancel().unwrap();

    for (name, status) in [
        ("map", mapped.status()),
        ("chain", chained.status()),
        ("sequence", sequenced.status()),
        ("all", gathered.status()),
        ("race", raced.status()),
    ] {
        assert_eq!(status, StatusKind::Cancelled, "{name} should be cancelled");
    }

    assert_eq!(block_on(mapped.settled()), Outcome::Cancelled);
    assert_eq!(block_on(sequenced.settled()), Outcome::Cancelled);
}

#[test]
fn test_deriving_from_cancelled_cache_settles() {
    let cached = Task::<i32, String>::wait(Duration::from_millis(50), 1).cache();

    cached.fork(|_| {}, |_| {}).cancel().unwrap();

    let mapped = cached.map(|x| x * 2).fork(|_| {}, |_| {});
    let repeated = cached.repeat(2).fork(|_| {}, |_| {});

    assert_eq!(mapped.status(), StatusKind::Cancelled);
    assert_eq!(
        repeated.status(),
        StatusKind::Pending,
        "repeat runs fresh duplicates, not the cancelled shared execution"
    );
    assert_eq!(block_on(repeated.settled()), Outcome::Resolved(vec![1, 1]));
}
