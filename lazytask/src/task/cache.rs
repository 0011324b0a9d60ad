use super::{Lineage, Source, Task, Value};
use crate::execution::{self, Cancel, Execution, Handlers, Outcome};
use crate::runtime::Engine;

use std::sync::{Arc, OnceLock};

/// The single shared execution behind a cached task.
pub(super) struct CacheCell<T, E> {
    source: Task<T, E>,
    shared: OnceLock<Execution<T, E>>,
}

impl<T: Value, E: Value> CacheCell<T, E> {
    fn new(source: Task<T, E>) -> Self {
        Self {
            source,
            shared: OnceLock::new(),
        }
    }

    /// Forks the source on first use, then hands out a view of the shared
    /// execution to every fork.
    ///
    /// The shared execution runs under the engine of the first fork.
    pub(super) fn fork(
        &self,
        engine: &Engine,
        lineage: Lineage,
        handlers: Handlers<T, E>,
    ) -> Execution<T, E> {
        let shared = self
            .shared
            .get_or_init(|| self.source.fork_in(engine, Handlers::detached()))
            .clone();

        execution::start(
            engine,
            lineage,
            move |resolver| {
                let listener = resolver.clone();

                shared.listen(move |outcome| match outcome {
                    Outcome::Resolved(value) => listener.resolve(value),
                    Outcome::Rejected(reason) => listener.reject(reason),
                    Outcome::Cancelled => listener.cancelled(),
                });

                // Cancelling any fork cancels the shared execution, and
                // through it every other fork.
                Cancel::from(shared)
            },
            handlers,
        )
    }
}

impl<T: Value, E: Value> Task<T, E> {
    /// Memoizes the task.
    ///
    /// The first fork runs the receiver once; every later fork observes that
    /// same execution, settling immediately if it already settled.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    ///
    /// use lazytask::{Cancel, Task};
    ///
    /// let runs = Arc::new(AtomicUsize::new(0));
    /// let counter = runs.clone();
    ///
    /// let task = Task::<usize, String>::new(move |resolver| {
    ///     resolver.resolve(counter.fetch_add(1, Ordering::SeqCst));
    ///     Cancel::noop()
    /// })
    /// .cache();
    ///
    /// task.fork(|_| {}, |_| {});
    /// task.fork(|_| {}, |_| {});
    ///
    /// assert_eq!(runs.load(Ordering::SeqCst), 1);
    /// ```
    pub fn cache(&self) -> Self {
        Self {
            source: Source::Cached(Arc::new(CacheCell::new(self.clone()))),
            lineage: self.lineage.then("cache"),
        }
    }

    /// Returns a structurally independent copy of the task.
    ///
    /// Forking the copy runs the same subscription. A cached task gets a
    /// fresh cache cell, so the copy runs its source again.
    pub fn duplicate(&self) -> Self {
        match &self.source {
            Source::Subscribe(_) => self.clone(),
            Source::Cached(cell) => Self {
                source: Source::Cached(Arc::new(CacheCell::new(cell.source.duplicate()))),
                lineage: self.lineage.clone(),
            },
        }
    }
}
