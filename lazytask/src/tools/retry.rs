use crate::diagnostics::Diagnostic;
use crate::error::Defect;
use crate::execution::{Cancel, Execution, Handlers, Pump, Resolver};
use crate::runtime::Engine;
use crate::task::{Task, Value};
use crate::utils::{guard, lock};

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct Retry<T, E> {
    source: Task<T, E>,
    interval: Option<Duration>,

    /// Attempts allowed after the first one.
    times: usize,

    engine: Engine,
    resolver: Resolver<T, E>,
    pump: Pump,

    /// Number of attempts started so far.
    started: AtomicUsize,
    current: Mutex<Option<Execution<T, E>>>,
}

impl<T, E> Retry<T, E>
where
    T: Value,
    E: Value + fmt::Debug + From<Defect>,
{
    /// Starts attempts until one stays pending.
    fn drive(self: &Arc<Self>) {
        loop {
            if !self.resolver.is_pending() {
                return;
            }

            let attempt = self.started.fetch_add(1, Ordering::AcqRel);

            let task = if attempt == 0 {
                self.source.clone()
            } else {
                let fresh = self.source.duplicate();

                match self.interval {
                    Some(interval) => Task::wait(interval, ()).chain(move |()| fresh.clone()),
                    None => fresh,
                }
            };

            // Set once the attempt settled, by its callbacks or by a panic.
            let settled = Arc::new(AtomicBool::new(false));

            let (resolved, rejected) = (self.clone(), self.clone());
            let (on_resolve, on_reject) = (settled.clone(), settled.clone());
            let forked = guard("retry", || {
                task.fork_in(
                    &self.engine,
                    Handlers::new(
                        move |reason| {
                            if !on_reject.swap(true, Ordering::AcqRel) {
                                rejected.failed(attempt, reason);
                            }
                        },
                        move |value| {
                            on_resolve.store(true, Ordering::Release);
                            resolved.resolver.resolve(value);
                        },
                    ),
                )
            });

            match forked {
                Ok(execution) => {
                    execution.cascade(&self.resolver);
                    *lock(&self.current) = Some(execution.clone());

                    if !self.resolver.is_pending() {
                        execution.abandon();
                        return;
                    }
                }
                Err(defect) => {
                    self.engine.report(Diagnostic::Defect {
                        defect: defect.clone(),
                        lineage: task.lineage().to_string(),
                    });

                    // A panicking subscription counts as a failed attempt.
                    if !settled.swap(true, Ordering::AcqRel) {
                        self.failed(attempt, E::from(defect));
                    }
                }
            }

            if self.pump.park() {
                return;
            }
        }
    }

    fn failed(self: &Arc<Self>, attempt: usize, reason: E) {
        let remaining = self.times - attempt;

        if remaining == 0 {
            self.resolver.reject(reason);
            return;
        }

        self.engine.report(Diagnostic::RetryFailed {
            attempt: attempt + 1,
            remaining,
            reason: format!("{reason:?}"),
        });

        if self.pump.notify() {
            self.drive();
        }
    }
}

impl<T, E> Task<T, E>
where
    T: Value,
    E: Value + fmt::Debug + From<Defect>,
{
    /// Re-attempts the task up to `times` more times while it rejects.
    ///
    /// Every attempt after the first runs a fresh [`duplicate`](Task::duplicate)
    /// of the task. Each failure that will be retried is reported as
    /// [`Diagnostic::RetryFailed`]; the last failure rejects the retried
    /// task. A panicking subscription counts as a failed attempt.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    ///
    /// use lazytask::{Cancel, Status, Task};
    ///
    /// let attempts = Arc::new(AtomicUsize::new(0));
    /// let counter = attempts.clone();
    ///
    /// let flaky = Task::<&str, String>::new(move |resolver| {
    ///     if counter.fetch_add(1, Ordering::SeqCst) < 2 {
    ///         resolver.reject("not yet".to_owned());
    ///     } else {
    ///         resolver.resolve("ok");
    ///     }
    ///     Cancel::noop()
    /// });
    ///
    /// let execution = flaky.retry(3).fork(|_| {}, |_| {});
    ///
    /// assert_eq!(execution.inspect(), Status::Resolved("ok"));
    /// assert_eq!(attempts.load(Ordering::SeqCst), 3);
    /// ```
    pub fn retry(&self, times: usize) -> Self {
        self.retrying("retry", times, None)
    }

    /// Like [`retry`](Task::retry), waiting `interval` before each new
    /// attempt.
    pub fn retry_every(&self, times: usize, interval: Duration) -> Self {
        self.retrying("retry_every", times, Some(interval))
    }

    fn retrying(&self, name: &'static str, times: usize, interval: Option<Duration>) -> Self {
        let source = self.clone();

        self.derive(name, move |resolver| {
            let retry = Arc::new(Retry {
                source: source.clone(),
                interval,
                times,
                engine: resolver.engine().clone(),
                resolver,
                pump: Pump::running(),
                started: AtomicUsize::new(0),
                current: Mutex::new(None),
            });

            retry.drive();

            Cancel::fallible(move || {
                let current = lock(&retry.current).take();

                match current {
                    Some(execution) => execution.halt(),
                    None => Ok(()),
                }
            })
        })
    }
}
