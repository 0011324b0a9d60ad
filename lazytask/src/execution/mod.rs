//! The execution engine.
//!
//! Forking a [`Task`](crate::Task) produces an [`Execution`]: the live,
//! single-resolution state of one run. The engine
//!
//! - invokes the subscription immediately and synchronously with a
//!   [`Resolver`],
//! - enforces at-most-once resolution: the first of resolve, reject, defect
//!   or cancel wins and later calls are reported, never raised,
//! - runs the [`Cancel`] operation returned by the subscription when the
//!   execution is cancelled while pending,
//! - exposes the status synchronously ([`Execution::inspect`]) and as a
//!   future ([`Execution::settled`]).

mod cancel;
mod core;
mod pump;
mod resolver;
mod settled;
mod state;

pub use cancel::Cancel;
pub use resolver::Resolver;
pub use settled::Settled;
pub use state::{Outcome, Status, StatusKind};

pub(crate) use pump::Pump;

use self::core::Core;
use crate::diagnostics::Diagnostic;
use crate::error::{Defect, TaskError};
use crate::runtime::Engine;
use crate::task::{Lineage, Value};

use std::fmt;
use std::future::IntoFuture;
use std::sync::Arc;

/// Outcome callbacks of a fork.
pub(crate) struct Handlers<T, E> {
    pub(crate) on_reject: Box<dyn FnOnce(E) + Send>,
    pub(crate) on_resolve: Box<dyn FnOnce(T) + Send>,
    pub(crate) on_error: Option<Box<dyn FnOnce(&Defect) + Send>>,
}

impl<T, E> Handlers<T, E> {
    pub(crate) fn new(
        on_reject: impl FnOnce(E) + Send + 'static,
        on_resolve: impl FnOnce(T) + Send + 'static,
    ) -> Self {
        Self {
            on_reject: Box::new(on_reject),
            on_resolve: Box::new(on_resolve),
            on_error: None,
        }
    }

    /// Callbacks that ignore the outcome.
    pub(crate) fn detached() -> Self {
        Self::new(|_| {}, |_| {})
    }

    pub(crate) fn on_error(mut self, on_error: impl FnOnce(&Defect) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(on_error));
        self
    }
}

/// Runs `subscribe` under a fresh execution.
pub(crate) fn start<T, E>(
    engine: &Engine,
    lineage: Lineage,
    subscribe: impl FnOnce(Resolver<T, E>) -> Cancel,
    handlers: Handlers<T, E>,
) -> Execution<T, E>
where
    T: Value,
    E: Value,
{
    let core = Arc::new(Core::new(engine.clone(), lineage, handlers));

    tracing::trace!(target: "lazytask", lineage = %core.lineage(), "forking task");

    let cancel = subscribe(Resolver::new(core.clone()));
    core.arm(cancel);

    Execution { core }
}

/// A handle to a forked task.
///
/// Cloning the handle does not fork again; every clone observes and
/// controls the same run.
pub struct Execution<T, E> {
    core: Arc<Core<T, E>>,
}

impl<T: Value, E: Value> Execution<T, E> {
    /// Cancels the execution.
    ///
    /// A pending execution becomes `Cancelled`, neither outcome callback
    /// fires afterwards, and the cancel operation of the source runs. For a
    /// composite task that cancels every constituent still pending.
    ///
    /// Cancelling a settled execution changes nothing and returns `Ok(())`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Uncancellable`] if the chain wraps a source that
    /// cannot be aborted, such as a foreign future. The execution is
    /// reported cancelled regardless.
    pub fn cancel(&self) -> Result<(), TaskError> {
        self.core.cancel(true)
    }

    /// Returns the current status, with the value or reason if terminal.
    pub fn inspect(&self) -> Status<T, E> {
        self.core.status()
    }

    /// Returns the current status without its payload.
    pub fn status(&self) -> StatusKind {
        self.core.kind()
    }

    pub fn is_pending(&self) -> bool {
        self.status() == StatusKind::Pending
    }

    /// Combinator steps of the task this execution was forked from.
    pub fn lineage(&self) -> &Lineage {
        self.core.lineage()
    }

    /// Returns a future resolving with the outcome of this execution.
    pub fn settled(&self) -> Settled<T, E> {
        Settled {
            core: self.core.clone(),
        }
    }

    /// Cancels as part of tearing down a composite task: silent if the
    /// execution already settled.
    pub(crate) fn halt(&self) -> Result<(), TaskError> {
        self.core.cancel(false)
    }

    /// Like [`halt`](Self::halt), for callers that have nobody to return the
    /// error to.
    pub(crate) fn abandon(&self) {
        if let Err(error) = self.halt() {
            self.core.engine().report(Diagnostic::CancelFailed { error });
        }
    }

    pub(crate) fn listen(&self, listener: impl FnOnce(Outcome<T, E>) + Send + 'static) {
        self.core.listen(listener);
    }

    /// Cancels `dependent` if this execution ends up cancelled, such as a
    /// shared cached execution cancelled through another fork.
    ///
    /// Silent when the dependent itself is what cancelled this execution.
    pub(crate) fn cascade<U: Value, F: Value>(&self, dependent: &Resolver<U, F>) {
        let dependent = dependent.clone();

        self.listen(move |outcome| {
            if let Outcome::Cancelled = outcome {
                dependent.cancelled();
            }
        });
    }
}

impl<T, E> Clone for Execution<T, E> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<T: Value, E: Value> IntoFuture for Execution<T, E> {
    type Output = Outcome<T, E>;
    type IntoFuture = Settled<T, E>;

    fn into_future(self) -> Self::IntoFuture {
        Settled { core: self.core }
    }
}

impl<T: Value, E: Value> fmt::Debug for Execution<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Execution")
            .field("status", &self.status())
            .field("lineage", self.lineage())
            .finish()
    }
}
