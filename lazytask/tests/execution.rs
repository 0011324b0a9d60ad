use futures::executor::block_on;
use lazytask::{Cancel, Outcome, Status, StatusKind, Task};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

#[test]
fn test_of_resolves_synchronously() {
    let execution = Task::<i32, String>::of(1).fork(|_| {}, |_| {});

    assert_eq!(execution.inspect(), Status::Resolved(1));
    assert_eq!(execution.status(), StatusKind::Resolved);
    assert_eq!(execution.status().to_string(), "RESOLVED");
}

#[test]
fn test_reject_rejects_synchronously() {
    let execution = Task::<i32, String>::reject("boom".to_owned()).fork(|_| {}, |_| {});

    assert_eq!(execution.inspect(), Status::Rejected("boom".to_owned()));
    assert_eq!(execution.status().to_string(), "REJECTED");
}

#[test]
fn test_fork_is_lazy() {
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = runs.clone();

    let task = Task::<(), String>::new(move |resolver| {
        counter.fetch_add(1, Ordering::SeqCst);
        resolver.resolve(());
        Cancel::noop()
    });

    assert_eq!(runs.load(Ordering::SeqCst), 0, "Building a task must not run it");

    task.fork(|_| {}, |_| {});
    task.fork(|_| {}, |_| {});

    assert_eq!(
        runs.load(Ordering::SeqCst),
        2,
        "Every fork should run the subscription"
    );
}

#[test]
fn test_callbacks_receive_outcome() {
    let (sender, receiver) = mpsc::channel();
    let resolved = sender.clone();

    Task::<i32, String>::of(7).fork(
        move |reason| sender.send(Err(reason)).unwrap(),
        move |value| resolved.send(Ok(value)).unwrap(),
    );

    assert_eq!(receiver.try_recv(), Ok(Ok(7)));
    assert!(receiver.try_recv().is_err(), "Only one callback should fire");
}

#[test]
fn test_cancel_pending_wait() {
    let fired = Arc::new(AtomicBool::new(false));
    let flag = fired.clone();

    let execution = Task::<i32, String>::wait(Duration::from_millis(50), 1)
        .fork(|_| {}, move |_| flag.store(true, Ordering::SeqCst));

    assert_eq!(execution.status(), StatusKind::Pending);
    assert!(execution.cancel().is_ok());
    assert_eq!(execution.inspect(), Status::Cancelled);

    thread::sleep(Duration::from_millis(100));

    assert!(
        !fired.load(Ordering::SeqCst),
        "A cancelled execution must not call its callbacks"
    );
    assert_eq!(execution.inspect(), Status::Cancelled);
}

#[test]
fn test_cancel_runs_cancel_operation() {
    let cancelled = Arc::new(AtomicBool::new(false));
    let flag = cancelled.clone();

    let task = Task::<i32, String>::new(move |_resolver| {
        let flag = flag.clone();
        Cancel::new(move || flag.store(true, Ordering::SeqCst))
    });

    let execution = task.fork(|_| {}, |_| {});
    assert!(!cancelled.load(Ordering::SeqCst));

    execution.cancel().unwrap();
    assert!(cancelled.load(Ordering::SeqCst));
}

#[test]
fn test_cancel_is_idempotent() {
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = runs.clone();

    let task = Task::<i32, String>::new(move |_resolver| {
        let counter = counter.clone();
        Cancel::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    });

    let execution = task.fork(|_| {}, |_| {});

    assert!(execution.cancel().is_ok());
    assert!(execution.cancel().is_ok());
    assert_eq!(runs.load(Ordering::SeqCst), 1, "Cancel operation should run once");
}

#[test]
fn test_first_resolution_wins() {
    let task = Task::<i32, String>::new(|resolver| {
        resolver.resolve(1);
        resolver.resolve(2);
        resolver.reject("late".to_owned());
        Cancel::noop()
    });

    let execution = task.fork(|_| {}, |_| {});

    assert_eq!(execution.inspect(), Status::Resolved(1));
}

#[test]
fn test_cancel_after_settle_keeps_status() {
    let execution = Task::<i32, String>::of(1).fork(|_| {}, |_| {});

    assert!(execution.cancel().is_ok());
    assert_eq!(execution.inspect(), Status::Resolved(1));
}

#[test]
fn test_resolve_from_another_thread() {
    let task = Task::<&'static str, String>::new(|resolver| {
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            resolver.resolve("remote");
        });
        Cancel::noop()
    });

    let execution = task.fork(|_| {}, |_| {});
    assert!(execution.is_pending());

    assert_eq!(block_on(execution.settled()), Outcome::Resolved("remote"));
    assert_eq!(execution.inspect(), Status::Resolved("remote"));
}

#[test]
fn test_execution_into_future() {
    let execution = Task::<i32, String>::wait(Duration::from_millis(10), 3).fork(|_| {}, |_| {});

    let outcome = block_on(async move { execution.await });

    assert_eq!(outcome.into_result(), Ok(3));
}

#[test]
fn test_settled_observes_cancellation() {
    let execution = Task::<i32, String>::wait(Duration::from_millis(200), 3).fork(|_| {}, |_| {});
    let settled = execution.settled();

    execution.cancel().unwrap();

    assert_eq!(block_on(settled), Outcome::Cancelled);
}

#[test]
fn test_fork_with_observes_defect() {
    let (sender, receiver) = mpsc::channel();
    let rejected = sender.clone();

    let task = Task::<i32, String>::of(1).map(|_| -> i32 { panic!("boom") });

    let execution = task.fork_with(
        move |reason| rejected.send(format!("reject: {reason}")).unwrap(),
        |_| {},
        move |defect| sender.send(format!("error: {}", defect.message())).unwrap(),
    );

    assert_eq!(receiver.try_recv().unwrap(), "error: boom");
    assert_eq!(
        receiver.try_recv().unwrap(),
        "reject: defect in `map`: boom",
        "The defect should reach the reject channel after the error callback"
    );
    assert_eq!(execution.status(), StatusKind::Rejected);
}

#[test]
fn test_run_resolves() {
    let (sender, receiver) = mpsc::channel();

    Task::<i32, String>::of(5).run(move |value| sender.send(value).unwrap());

    assert_eq!(receiver.try_recv(), Ok(5));
}
