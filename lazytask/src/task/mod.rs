//! The Task value.
//!
//! A [`Task`] is an inert description of a deferred computation. Building
//! one performs no work; [`Task::fork`] starts it and returns an
//! [`Execution`]. A task may be forked any number of times, each fork being
//! an independent run, unless it was built with [`Task::cache`].
//!
//! This module defines the value itself, its basic constructors and the
//! execution triggers. The combinators live in submodules:
//!
//! - transformations and sequencing (`map`, `chain`, `then`, `catch`, ...),
//! - sharing (`cache`, `duplicate`).

mod algebra;
mod cache;
mod lineage;
mod next;

pub use lineage::Lineage;
pub use next::Next;

use self::cache::CacheCell;
use crate::error::Defect;
use crate::execution::{self, Cancel, Execution, Handlers, Resolver};
use crate::runtime::Engine;

use std::fmt;
use std::sync::Arc;

/// Bound shared by task values and failure reasons.
///
/// Values are cloned into the status of an execution, to every listener of
/// a cached task, and to every fork of a constant task.
pub trait Value: Clone + Send + Sync + 'static {}

impl<X: Clone + Send + Sync + 'static> Value for X {}

/// The subscription every task wraps.
type Subscription<T, E> = dyn Fn(Resolver<T, E>) -> Cancel + Send + Sync;

enum Source<T, E> {
    Subscribe(Arc<Subscription<T, E>>),
    Cached(Arc<CacheCell<T, E>>),
}

/// A lazy, cancellable unit of deferred computation.
///
/// A `Task<T, E>` eventually resolves with a `T`, rejects with an `E`, or is
/// cancelled. Every combinator returns a new task and leaves the receiver
/// untouched.
///
/// Cloning a `Task` with [`Clone`] shares the same description, including
/// the cache cell of a cached task. Use [`Task::duplicate`] for a
/// structurally independent copy.
///
/// # Examples
///
/// ```rust
/// use lazytask::{Status, Task};
///
/// let task = Task::<i32, String>::of(41).map(|x| x + 1);
/// let execution = task.fork(|_| {}, |_| {});
///
/// assert_eq!(execution.inspect(), Status::Resolved(42));
/// ```
pub struct Task<T, E> {
    source: Source<T, E>,
    lineage: Lineage,
}

impl<T: Value, E: Value> Task<T, E> {
    /// Creates a task from a subscription.
    ///
    /// The subscription runs every time the task is forked. It receives a
    /// [`Resolver`] to settle the execution with, now or later from any
    /// thread, and returns the [`Cancel`] operation of whatever it started.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use lazytask::{Cancel, Task};
    ///
    /// let task = Task::<&'static str, String>::new(|resolver| {
    ///     resolver.resolve("done");
    ///     Cancel::noop()
    /// });
    /// # let _ = task;
    /// ```
    pub fn new(subscribe: impl Fn(Resolver<T, E>) -> Cancel + Send + Sync + 'static) -> Self {
        Self::named("task", subscribe)
    }

    pub(crate) fn named(
        name: &'static str,
        subscribe: impl Fn(Resolver<T, E>) -> Cancel + Send + Sync + 'static,
    ) -> Self {
        Self {
            source: Source::Subscribe(Arc::new(subscribe)),
            lineage: Lineage::root(name),
        }
    }

    /// Builds a task whose lineage extends this one with `name`.
    pub(crate) fn derive<U, F>(
        &self,
        name: &'static str,
        subscribe: impl Fn(Resolver<U, F>) -> Cancel + Send + Sync + 'static,
    ) -> Task<U, F>
    where
        U: Value,
        F: Value,
    {
        Task {
            source: Source::Subscribe(Arc::new(subscribe)),
            lineage: self.lineage.then(name),
        }
    }

    /// A task resolving synchronously with `value`.
    pub fn of(value: T) -> Self {
        Self::named("of", move |resolver| {
            resolver.resolve(value.clone());
            Cancel::noop()
        })
    }

    /// Alias of [`Task::of`].
    pub fn resolve(value: T) -> Self {
        Self::of(value)
    }

    /// A task rejecting synchronously with `reason`.
    pub fn reject(reason: E) -> Self {
        Self::named("reject", move |resolver| {
            resolver.reject(reason.clone());
            Cancel::noop()
        })
    }

    /// Names of the combinators this task was built from.
    pub fn lineage(&self) -> &Lineage {
        &self.lineage
    }

    /// Starts the task.
    ///
    /// The subscription runs immediately and synchronously. Exactly one of
    /// `on_reject` and `on_resolve` fires, unless the returned execution is
    /// cancelled first, in which case neither does.
    ///
    /// Diagnostics go to the default engine. See [`Engine::fork`] to choose
    /// another one.
    pub fn fork<R, S>(&self, on_reject: R, on_resolve: S) -> Execution<T, E>
    where
        R: FnOnce(E) + Send + 'static,
        S: FnOnce(T) + Send + 'static,
    {
        Engine::global().fork(self, on_reject, on_resolve)
    }

    /// Starts the task with an additional callback observing defects.
    pub fn fork_with<R, S, D>(&self, on_reject: R, on_resolve: S, on_error: D) -> Execution<T, E>
    where
        R: FnOnce(E) + Send + 'static,
        S: FnOnce(T) + Send + 'static,
        D: FnOnce(&Defect) + Send + 'static,
    {
        Engine::global().fork_with(self, on_reject, on_resolve, on_error)
    }

    /// Starts the task, reporting a rejection as a diagnostic instead of
    /// requiring a handler.
    pub fn run<S>(&self, on_resolve: S) -> Execution<T, E>
    where
        E: fmt::Debug,
        S: FnOnce(T) + Send + 'static,
    {
        Engine::global().run(self, on_resolve)
    }

    pub(crate) fn fork_in(&self, engine: &Engine, handlers: Handlers<T, E>) -> Execution<T, E> {
        match &self.source {
            Source::Subscribe(subscribe) => execution::start(
                engine,
                self.lineage.clone(),
                |resolver| subscribe(resolver),
                handlers,
            ),
            Source::Cached(cell) => cell.fork(engine, self.lineage.clone(), handlers),
        }
    }

    /// Forks under the engine of `resolver`, settling it with the outcome.
    ///
    /// If the forked execution is cancelled from elsewhere, `resolver` is
    /// cancelled too.
    pub(crate) fn fork_into(&self, resolver: &Resolver<T, E>) -> Execution<T, E> {
        let (on_reject, on_resolve) = (resolver.clone(), resolver.clone());

        let execution = self.fork_in(
            resolver.engine(),
            Handlers::new(
                move |reason| on_reject.reject(reason),
                move |value| on_resolve.resolve(value),
            ),
        );

        execution.cascade(resolver);
        execution
    }
}

impl<T, E> Clone for Task<T, E> {
    fn clone(&self) -> Self {
        let source = match &self.source {
            Source::Subscribe(subscribe) => Source::Subscribe(subscribe.clone()),
            Source::Cached(cell) => Source::Cached(cell.clone()),
        };

        Self {
            source,
            lineage: self.lineage.clone(),
        }
    }
}

impl<T, E> fmt::Debug for Task<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cached = matches!(self.source, Source::Cached(_));

        f.debug_struct("Task")
            .field("lineage", &self.lineage)
            .field("cached", &cached)
            .finish()
    }
}
