use super::cancel::Cancel;
use super::{Handlers, Outcome, Status, StatusKind};
use crate::diagnostics::Diagnostic;
use crate::error::{Defect, TaskError};
use crate::runtime::Engine;
use crate::task::{Lineage, Value};
use crate::utils::lock;

use std::mem;
use std::sync::Mutex;
use std::task::Waker;

/// Someone waiting for the terminal transition of an execution.
pub(crate) enum Waiter<T, E> {
    /// A [`Settled`](super::Settled) future.
    Waker(Waker),

    /// A one-shot callback, used by cached tasks to fan the shared outcome
    /// out to every fork.
    Listener(Box<dyn FnOnce(Outcome<T, E>) + Send>),
}

impl<T: Clone, E: Clone> Waiter<T, E> {
    fn notify(self, outcome: &Outcome<T, E>) {
        match self {
            Self::Waker(waker) => waker.wake(),
            Self::Listener(listener) => listener(outcome.clone()),
        }
    }
}

/// Mutable part of an execution, guarded by a single lock.
struct State<T, E> {
    /// Current status. Leaves `Pending` at most once.
    status: Status<T, E>,

    /// Outcome callbacks of the forking caller, taken on the terminal
    /// transition. Cancellation drops them unused.
    handlers: Option<Handlers<T, E>>,

    /// Futures and listeners notified on the terminal transition.
    waiters: Vec<Waiter<T, E>>,
}

/// Where the cancel operation returned by the subscription currently is.
enum Slot {
    /// The subscription has not returned yet.
    Awaiting,

    /// Cancel was requested before the subscription returned; the operation
    /// runs as soon as it is handed over.
    Requested,

    /// The operation is ready to run.
    Armed(Cancel),

    /// Settled, cancelled, or consumed. Nothing to run anymore.
    Released,
}

/// Shared state behind an [`Execution`](super::Execution) and its
/// [`Resolver`](super::Resolver).
///
/// All transitions go through this type. Locks are never held while user
/// callbacks, listeners or cancel operations run, so any of them may freely
/// call back into the engine.
pub(crate) struct Core<T, E> {
    state: Mutex<State<T, E>>,
    cancel: Mutex<Slot>,

    /// Engine the execution was forked under.
    engine: Engine,

    /// Combinator steps of the forked task.
    lineage: Lineage,
}

impl<T: Value, E: Value> Core<T, E> {
    pub(crate) fn new(engine: Engine, lineage: Lineage, handlers: Handlers<T, E>) -> Self {
        Self {
            state: Mutex::new(State {
                status: Status::Pending,
                handlers: Some(handlers),
                waiters: Vec::new(),
            }),
            cancel: Mutex::new(Slot::Awaiting),
            engine,
            lineage,
        }
    }

    pub(crate) fn engine(&self) -> &Engine {
        &self.engine
    }

    pub(crate) fn lineage(&self) -> &Lineage {
        &self.lineage
    }

    pub(crate) fn status(&self) -> Status<T, E> {
        lock(&self.state).status.clone()
    }

    pub(crate) fn kind(&self) -> StatusKind {
        lock(&self.state).status.kind()
    }

    /// Moves the execution to `Resolved` or `Rejected`.
    ///
    /// Returns `false` and reports [`Diagnostic::AlreadySettled`] if the
    /// execution was already terminal.
    pub(crate) fn settle(&self, outcome: Outcome<T, E>) -> bool {
        let (handlers, waiters) = {
            let mut state = lock(&self.state);

            if !state.status.is_pending() {
                let current = state.status.kind();
                drop(state);

                self.engine.report(Diagnostic::AlreadySettled {
                    attempted: outcome.kind(),
                    current,
                    lineage: self.lineage.to_string(),
                });
                return false;
            }

            state.status = Status::from(outcome.clone());
            (state.handlers.take(), mem::take(&mut state.waiters))
        };

        self.release();

        tracing::trace!(
            target: "lazytask",
            status = %outcome.kind(),
            lineage = %self.lineage,
            "execution settled"
        );

        if let Some(handlers) = handlers {
            match outcome.clone() {
                Outcome::Resolved(value) => (handlers.on_resolve)(value),
                Outcome::Rejected(reason) => (handlers.on_reject)(reason),
                Outcome::Cancelled => {}
            }
        }

        for waiter in waiters {
            waiter.notify(&outcome);
        }

        true
    }

    /// Rejects the execution because user code panicked.
    ///
    /// The defect is reported, shown to the `on_error` callback if the
    /// caller supplied one, then converted into a domain failure.
    pub(crate) fn defect(&self, defect: Defect)
    where
        E: From<Defect>,
    {
        let on_error = {
            let mut state = lock(&self.state);

            if !state.status.is_pending() {
                let current = state.status.kind();
                drop(state);

                self.engine.report(Diagnostic::AlreadySettled {
                    attempted: StatusKind::Rejected,
                    current,
                    lineage: self.lineage.to_string(),
                });
                return;
            }

            state
                .handlers
                .as_mut()
                .and_then(|handlers| handlers.on_error.take())
        };

        self.engine.report(Diagnostic::Defect {
            defect: defect.clone(),
            lineage: self.lineage.to_string(),
        });

        if let Some(on_error) = on_error {
            on_error(&defect);
        }

        self.settle(Outcome::Rejected(E::from(defect)));
    }

    /// Moves the execution to `Cancelled` and runs the cancel operation.
    ///
    /// `explicit` distinguishes a caller cancelling a handle it holds, which
    /// reports [`Diagnostic::CancelAfterSettle`] on a terminal execution,
    /// from the engine tearing down constituents, which stays silent.
    pub(crate) fn cancel(&self, explicit: bool) -> Result<(), TaskError> {
        let (handlers, waiters) = {
            let mut state = lock(&self.state);

            if !state.status.is_pending() {
                let current = state.status.kind();
                drop(state);

                if explicit {
                    self.engine.report(Diagnostic::CancelAfterSettle {
                        current,
                        lineage: self.lineage.to_string(),
                    });
                }
                return Ok(());
            }

            state.status = Status::Cancelled;
            (state.handlers.take(), mem::take(&mut state.waiters))
        };

        // Neither outcome callback may fire once cancelled.
        drop(handlers);

        tracing::trace!(target: "lazytask", lineage = %self.lineage, "execution cancelled");

        for waiter in waiters {
            waiter.notify(&Outcome::Cancelled);
        }

        let cancel = {
            let mut slot = lock(&self.cancel);

            match mem::replace(&mut *slot, Slot::Released) {
                Slot::Armed(cancel) => Some(cancel),
                Slot::Awaiting => {
                    *slot = Slot::Requested;
                    None
                }
                Slot::Requested | Slot::Released => None,
            }
        };

        match cancel {
            Some(cancel) => cancel.invoke(&self.engine, &self.lineage),
            None => Ok(()),
        }
    }

    /// Hands over the cancel operation returned by the subscription.
    pub(crate) fn arm(&self, cancel: Cancel) {
        let mut slot = lock(&self.cancel);

        match mem::replace(&mut *slot, Slot::Released) {
            Slot::Awaiting => *slot = Slot::Armed(cancel),
            Slot::Requested => {
                drop(slot);

                if let Err(error) = cancel.invoke(&self.engine, &self.lineage) {
                    self.engine.report(Diagnostic::CancelFailed { error });
                }
            }
            Slot::Armed(previous) => {
                drop(slot);
                drop(previous);
                drop(cancel);
            }
            Slot::Released => {
                drop(slot);
                drop(cancel);
            }
        }
    }

    /// Drops the cancel operation once it can no longer be needed.
    fn release(&self) {
        let previous = mem::replace(&mut *lock(&self.cancel), Slot::Released);
        drop(previous);
    }

    /// Returns the outcome if terminal, otherwise registers `waker`.
    pub(crate) fn poll_outcome(&self, waker: &Waker) -> Option<Outcome<T, E>> {
        let mut state = lock(&self.state);

        if let Some(outcome) = state.status.outcome() {
            return Some(outcome);
        }

        let registered = state
            .waiters
            .iter()
            .any(|waiter| matches!(waiter, Waiter::Waker(existing) if existing.will_wake(waker)));

        if !registered {
            state.waiters.push(Waiter::Waker(waker.clone()));
        }

        None
    }

    /// Calls `listener` once with the terminal outcome, immediately if the
    /// execution already settled.
    pub(crate) fn listen(&self, listener: impl FnOnce(Outcome<T, E>) + Send + 'static) {
        let outcome = {
            let mut state = lock(&self.state);

            match state.status.outcome() {
                Some(outcome) => outcome,
                None => {
                    state.waiters.push(Waiter::Listener(Box::new(listener)));
                    return;
                }
            }
        };

        listener(outcome);
    }
}
