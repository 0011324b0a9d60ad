//! Coroutine-style sequencing.
//!
//! [`Task::program`] turns an `async` body into a task. Inside the body,
//! every [`Co::step`] forks exactly one task and suspends the body until it
//! settles, so a program reads as straight-line code:
//!
//! ```rust
//! use lazytask::{Status, Task};
//!
//! let task = Task::<Vec<i32>, String>::program(|co| async move {
//!     let a = co.step(Task::of(1)).await?;
//!     let b = co.step(Task::of(2)).await?;
//!     let c = co.step(Task::of(3)).await?;
//!     Ok(vec![a, b, c])
//! });
//!
//! assert_eq!(task.fork(|_| {}, |_| {}).inspect(), Status::Resolved(vec![1, 2, 3]));
//! ```
//!
//! The body is not polled by an executor. It is driven by the completions
//! of its own steps, on whichever thread settles them.

mod driver;

pub(crate) use driver::Driver;

use crate::error::Defect;
use crate::execution::{Cancel, Execution, Handlers, Outcome, Settled};
use crate::runtime::Engine;
use crate::task::{Next, Task, Value};
use crate::utils::guard;

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// Handle given to a program body to run its steps.
pub struct Co<E> {
    /// Engine the program was forked under; steps are forked under it too.
    engine: Engine,

    /// Cancels the program. Used when a step is cancelled from outside.
    abort: Arc<dyn Fn() + Send + Sync>,

    marker: PhantomData<fn() -> E>,
}

impl<E: Value> Co<E> {
    /// Runs one step of the program.
    ///
    /// A task is forked immediately. A value or a `Result` completes the step
    /// at once. Awaiting the step yields `Err(reason)` if it rejected, so `?`
    /// skips the remaining steps and rejects the program.
    ///
    /// If the step is cancelled by someone else, the program is cancelled
    /// with it.
    pub fn step<U: Value>(&self, next: impl Into<Next<U, E>>) -> Step<U, E> {
        let state = match next.into() {
            Next::Value(value) => State::Ready(Some(Ok(value))),
            Next::Fail(reason) => State::Ready(Some(Err(reason))),
            Next::Task(task) => {
                let execution = task.fork_in(&self.engine, Handlers::detached());

                State::Running {
                    settled: execution.settled(),
                    execution,
                    abort: self.abort.clone(),
                }
            }
        };

        Step { state }
    }
}

impl<E> Clone for Co<E> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            abort: self.abort.clone(),
            marker: PhantomData,
        }
    }
}

impl<E> fmt::Debug for Co<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Co").field("engine", &self.engine).finish_non_exhaustive()
    }
}

enum State<U, E> {
    Ready(Option<Result<U, E>>),
    Running {
        execution: Execution<U, E>,
        settled: Settled<U, E>,
        abort: Arc<dyn Fn() + Send + Sync>,
    },
    Done,
}

/// A step of a program, returned by [`Co::step`].
///
/// Dropping a step before it completes cancels the task it forked.
#[must_use = "a step does nothing to the program unless awaited"]
pub struct Step<U: Value, E: Value> {
    state: State<U, E>,
}

impl<U: Value, E: Value> Unpin for Step<U, E> {}

impl<U: Value, E: Value> Future for Step<U, E> {
    type Output = Result<U, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        let outcome = match &mut this.state {
            State::Ready(result) => {
                return match result.take() {
                    Some(result) => {
                        this.state = State::Done;
                        Poll::Ready(result)
                    }
                    None => Poll::Pending,
                };
            }
            State::Running { settled, .. } => match Pin::new(settled).poll(cx) {
                Poll::Ready(outcome) => outcome,
                Poll::Pending => return Poll::Pending,
            },
            State::Done => return Poll::Pending,
        };

        let State::Running { abort, .. } = std::mem::replace(&mut this.state, State::Done) else {
            return Poll::Pending;
        };

        match outcome {
            Outcome::Resolved(value) => Poll::Ready(Ok(value)),
            Outcome::Rejected(reason) => Poll::Ready(Err(reason)),
            Outcome::Cancelled => {
                abort();
                Poll::Pending
            }
        }
    }
}

impl<U: Value, E: Value> Drop for Step<U, E> {
    fn drop(&mut self) {
        if let State::Running { execution, .. } = &self.state {
            execution.abandon();
        }
    }
}

impl<T: Value, E: Value + From<Defect>> Task<T, E> {
    /// Builds a task from an `async` body driven step by step.
    ///
    /// The body runs anew on every fork. The program resolves with the
    /// body's `Ok` value and rejects with its `Err`. Cancelling the program
    /// cancels the step in flight and drops the body.
    ///
    /// See the [module documentation](crate::program) for an example.
    pub fn program<B, Fut>(body: B) -> Self
    where
        B: Fn(Co<E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self::named("program", move |resolver| {
            let aborter = resolver.clone();
            let co = Co {
                engine: resolver.engine().clone(),
                abort: Arc::new(move || aborter.cancelled()),
                marker: PhantomData,
            };

            let future = match guard("program", || body(co)) {
                Ok(future) => future,
                Err(defect) => {
                    resolver.defect(defect);
                    return Cancel::noop();
                }
            };

            let driver = Driver::spawn("program", resolver, Box::pin(future));
            Cancel::new(move || driver.abort())
        })
    }
}
