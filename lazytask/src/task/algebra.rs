//! Transformations and sequencing.
//!
//! Every combinator here is a thin wrapper over a single fold: fork the
//! source, feed its outcome to a user continuation, and settle with whatever
//! the continuation produced. Continuations and the forks of the tasks they
//! return run under a panic guard, so a panicking closure or subscription
//! rejects the derived task with a [`Defect`].
//!
//! A nested execution cancelled from elsewhere, such as one fork of a cached
//! task, cancels the derived execution with it.

use super::{Next, Task, Value};
use crate::error::{Defect, TaskError};
use crate::execution::{Cancel, Execution, Handlers, Resolver};
use crate::utils::{guard, lock};

use std::sync::{Arc, Mutex};

/// Per-fork state of a derived task.
struct Continuation<U, F> {
    name: &'static str,
    resolver: Resolver<U, F>,

    /// Execution of the task returned by the continuation, once started.
    inner: Mutex<Option<Execution<U, F>>>,
}

impl<U: Value, F: Value + From<Defect>> Continuation<U, F> {
    fn proceed(&self, step: Result<Next<U, F>, Defect>) {
        if !self.resolver.is_pending() {
            return;
        }

        match step {
            Err(defect) => self.resolver.defect(defect),
            Ok(Next::Value(value)) => self.resolver.resolve(value),
            Ok(Next::Fail(reason)) => self.resolver.reject(reason),
            Ok(Next::Task(task)) => match guard(self.name, || task.fork_into(&self.resolver)) {
                Ok(execution) => {
                    *lock(&self.inner) = Some(execution.clone());

                    // Cancelled while the inner task was being forked.
                    if !self.resolver.is_pending() {
                        execution.abandon();
                    }
                }
                Err(defect) => self.resolver.defect(defect),
            },
        }
    }

    fn halt(&self) -> Result<(), TaskError> {
        let inner = lock(&self.inner).take();

        match inner {
            Some(execution) => execution.halt(),
            None => Ok(()),
        }
    }
}

impl<T: Value, E: Value> Task<T, E> {
    /// Forks the receiver and continues with `on_resolve` or `on_reject`.
    ///
    /// Cancelling the derived execution cancels whichever of the source and
    /// the continuation's task is running. If it is cancelled while the
    /// source is still pending, the continuation never runs.
    fn fold<U, F>(
        &self,
        name: &'static str,
        on_resolve: impl Fn(T) -> Next<U, F> + Send + Sync + 'static,
        on_reject: impl Fn(E) -> Next<U, F> + Send + Sync + 'static,
    ) -> Task<U, F>
    where
        U: Value,
        F: Value + From<Defect>,
    {
        let source = self.clone();
        let on_resolve = Arc::new(on_resolve);
        let on_reject = Arc::new(on_reject);

        self.derive(name, move |resolver| {
            let engine = resolver.engine().clone();
            let continuation = Arc::new(Continuation {
                name,
                resolver,
                inner: Mutex::new(None),
            });

            let (resolved, on_resolve) = (continuation.clone(), on_resolve.clone());
            let (rejected, on_reject) = (continuation.clone(), on_reject.clone());

            let execution = source.fork_in(
                &engine,
                Handlers::new(
                    move |reason| rejected.proceed(guard(name, || (*on_reject)(reason))),
                    move |value| resolved.proceed(guard(name, || (*on_resolve)(value))),
                ),
            );

            execution.cascade(&continuation.resolver);

            Cancel::fallible(move || {
                let source = execution.halt();
                let inner = continuation.halt();
                source.and(inner)
            })
        })
    }

    /// Transforms the resolved value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use lazytask::{Status, Task};
    ///
    /// let doubled = Task::<i32, String>::of(21).map(|x| x * 2);
    /// assert_eq!(doubled.fork(|_| {}, |_| {}).inspect(), Status::Resolved(42));
    /// ```
    pub fn map<U: Value>(&self, f: impl Fn(T) -> U + Send + Sync + 'static) -> Task<U, E>
    where
        E: From<Defect>,
    {
        self.fold("map", move |value| Next::Value(f(value)), Next::Fail)
    }

    /// Transforms the resolved value with a fallible function.
    pub fn try_map<U: Value>(
        &self,
        f: impl Fn(T) -> Result<U, E> + Send + Sync + 'static,
    ) -> Task<U, E>
    where
        E: From<Defect>,
    {
        self.fold("try_map", move |value| Next::from(f(value)), Next::Fail)
    }

    /// Transforms the failure reason.
    pub fn map_err<F>(&self, f: impl Fn(E) -> F + Send + Sync + 'static) -> Task<T, F>
    where
        F: Value + From<Defect>,
    {
        self.fold("map_err", Next::Value, move |reason| Next::Fail(f(reason)))
    }

    /// Transforms both channels. Exactly one of the functions runs.
    pub fn bimap<U, F>(
        &self,
        on_reject: impl Fn(E) -> F + Send + Sync + 'static,
        on_resolve: impl Fn(T) -> U + Send + Sync + 'static,
    ) -> Task<U, F>
    where
        U: Value,
        F: Value + From<Defect>,
    {
        self.fold(
            "bimap",
            move |value| Next::Value(on_resolve(value)),
            move |reason| Next::Fail(on_reject(reason)),
        )
    }

    /// Continues with the task returned by `f`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use lazytask::{Status, Task};
    ///
    /// let task = Task::<i32, String>::of(1).chain(|x| Task::of(x + 1));
    /// assert_eq!(task.fork(|_| {}, |_| {}).inspect(), Status::Resolved(2));
    /// ```
    pub fn chain<U: Value>(
        &self,
        f: impl Fn(T) -> Task<U, E> + Send + Sync + 'static,
    ) -> Task<U, E>
    where
        E: From<Defect>,
    {
        self.fold("chain", move |value| Next::Task(f(value)), Next::Fail)
    }

    /// Alias of [`Task::chain`].
    pub fn flat_map<U: Value>(
        &self,
        f: impl Fn(T) -> Task<U, E> + Send + Sync + 'static,
    ) -> Task<U, E>
    where
        E: From<Defect>,
    {
        self.fold("flat_map", move |value| Next::Task(f(value)), Next::Fail)
    }

    /// Continues with whatever `f` returns: a task, a `Result`, or a
    /// [`Next`].
    pub fn then<U, N>(&self, f: impl Fn(T) -> N + Send + Sync + 'static) -> Task<U, E>
    where
        U: Value,
        N: Into<Next<U, E>>,
        E: From<Defect>,
    {
        self.fold("then", move |value| f(value).into(), Next::Fail)
    }

    /// Recovers from a failure. A resolved value passes through unchanged.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use lazytask::{Status, Task};
    ///
    /// let task = Task::<i32, String>::reject("boom".into()).catch(|_| Ok::<_, String>(0));
    /// assert_eq!(task.fork(|_| {}, |_| {}).inspect(), Status::Resolved(0));
    /// ```
    pub fn catch<F, N>(&self, f: impl Fn(E) -> N + Send + Sync + 'static) -> Task<T, F>
    where
        F: Value + From<Defect>,
        N: Into<Next<T, F>>,
    {
        self.fold("catch", Next::Value, move |reason| f(reason).into())
    }
}

impl<G: Value, E: Value + From<Defect>> Task<G, E> {
    /// Applies the function this task resolves with to the value of `arg`.
    ///
    /// The receiver runs first, then `arg`.
    pub fn ap<A, U>(&self, arg: &Task<A, E>) -> Task<U, E>
    where
        A: Value,
        U: Value,
        G: Fn(A) -> U,
    {
        let arg = arg.clone();
        self.fold("ap", move |function| Next::Task(arg.map(function)), Next::Fail)
    }
}
