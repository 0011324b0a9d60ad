//! Bridge from foreign futures.
//!
//! [`Task::from_future`] adapts a future produced elsewhere into a task. The
//! bridge is one-directional: futures cannot be aborted through the task, so
//! cancelling a bridged task fails with
//! [`TaskError::Uncancellable`](crate::TaskError::Uncancellable).

use crate::error::Defect;
use crate::execution::Cancel;
use crate::program::Driver;
use crate::task::{Task, Value};
use crate::utils::lock;

use std::future::Future;
use std::sync::Mutex;

impl<T: Value, E: Value + From<Defect>> Task<T, E> {
    /// Wraps a future resolving with `Ok` or rejecting with `Err`.
    ///
    /// A future runs at most once, so the task is cached: every fork observes
    /// the same future. The future is polled on the forking thread first,
    /// then on whichever thread wakes it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use futures::channel::oneshot;
    /// use lazytask::{Outcome, Task};
    ///
    /// let (sender, receiver) = oneshot::channel::<i32>();
    /// let task = Task::<i32, String>::from_future(async move {
    ///     receiver.await.map_err(|error| error.to_string())
    /// });
    ///
    /// let execution = task.fork(|_| {}, |_| {});
    /// sender.send(7).unwrap();
    ///
    /// assert_eq!(futures::executor::block_on(execution.settled()), Outcome::Resolved(7));
    /// ```
    pub fn from_future(future: impl Future<Output = Result<T, E>> + Send + 'static) -> Self {
        let future = Mutex::new(Some(Box::pin(future)));

        Self::named("from_future", move |resolver| {
            let Some(future) = lock(&future).take() else {
                resolver.defect(Defect::new("from_future", "future was already consumed"));
                return Cancel::noop();
            };

            // The driver stays alive through the waker the future holds.
            let _driver = Driver::spawn("from_future", resolver, future);
            Cancel::unsupported()
        })
        .cache()
    }
}
