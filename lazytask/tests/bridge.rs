use futures::channel::oneshot;
use futures::executor::block_on;
use lazytask::{Outcome, Status, StatusKind, Task, TaskError};

use std::thread;
use std::time::Duration;

fn bridged() -> (oneshot::Sender<i32>, Task<i32, String>) {
    let (sender, receiver) = oneshot::channel();

    let task = Task::from_future(async move { receiver.await.map_err(|error| error.to_string()) });

    (sender, task)
}

#[test]
fn test_from_future_resolves() {
    let (sender, task) = bridged();

    let execution = task.fork(|_| {}, |_| {});
    assert_eq!(execution.status(), StatusKind::Pending);

    sender.send(7).unwrap();

    assert_eq!(block_on(execution.settled()), Outcome::Resolved(7));
}

#[test]
fn test_from_future_resolves_from_another_thread() {
    let (sender, task) = bridged();

    let execution = task.map(|x| x * 2).fork(|_| {}, |_| {});

    thread::spawn(move || {
        thread::sleep(Duration::from_millis(10));
        sender.send(21).unwrap();
    });

    assert_eq!(block_on(execution.settled()), Outcome::Resolved(42));
}

#[test]
fn test_from_future_rejects() {
    let (sender, task) = bridged();

    let execution = task.fork(|_| {}, |_| {});
    drop(sender);

    assert_eq!(
        block_on(execution.settled()),
        Outcome::Rejected("oneshot canceled".to_owned())
    );
}

#[test]
fn test_from_future_ready_future() {
    let task = Task::<i32, String>::from_future(async { Ok(3) });

    assert_eq!(task.fork(|_| {}, |_| {}).inspect(), Status::Resolved(3));
}

#[test]
fn test_from_future_forks_share_future() {
    let (sender, task) = bridged();

    let first = task.fork(|_| {}, |_| {});
    let second = task.fork(|_| {}, |_| {});

    sender.send(5).unwrap();

    assert_eq!(block_on(first.settled()), Outcome::Resolved(5));
    assert_eq!(block_on(second.settled()), Outcome::Resolved(5));
}

#[test]
fn test_from_future_cancel_fails() {
    let (_sender, task) = bridged();

    let execution = task.fork(|_| {}, |_| {});
    let result = execution.cancel();

    assert!(
        matches!(result, Err(TaskError::Uncancellable { .. })),
        "Cancelling a foreign future should fail"
    );
    assert_eq!(
        execution.status(),
        StatusKind::Cancelled,
        "The execution is reported cancelled regardless"
    );
}

#[test]
fn test_from_future_cancel_fails_through_combinators() {
    let (_sender, task) = bridged();

    let execution = task.map(|x| x + 1).fork(|_| {}, |_| {});

    assert!(execution.cancel().is_err());
}

#[test]
fn test_duplicate_of_consumed_future_rejects() {
    let task = Task::<i32, String>::from_future(async { Ok(1) });

    task.fork(|_| {}, |_| {});
    let execution = task.duplicate().fork(|_| {}, |_| {});

    assert_eq!(
        execution.inspect(),
        Status::Rejected("defect in `from_future`: future was already consumed".to_owned())
    );
}
