use super::Execution;
use crate::diagnostics::Diagnostic;
use crate::error::TaskError;
use crate::runtime::Engine;
use crate::task::{Lineage, Value};

use std::fmt;

/// The cancel operation a subscription hands back to the engine.
///
/// A subscription always returns a `Cancel`, but not every source can honour
/// one:
///
/// - [`Cancel::new`] runs a closure, e.g. clearing a timer.
/// - [`Cancel::noop`] is for sources that are already finished by the time
///   the subscription returns.
/// - [`Cancel::none`] marks a node without a cancellation handler. Cancelling
///   it reports [`Diagnostic::NotCancellable`] and still succeeds.
/// - [`Cancel::unsupported`] marks a source that can never be aborted.
///   Cancelling it fails with [`TaskError::Uncancellable`].
pub struct Cancel(Kind);

enum Kind {
    Noop,
    Action(Box<dyn FnOnce() -> Result<(), TaskError> + Send>),
    Missing,
    Unsupported,
}

impl Cancel {
    /// A cancel operation running `f`.
    pub fn new(f: impl FnOnce() + Send + 'static) -> Self {
        Self(Kind::Action(Box::new(move || {
            f();
            Ok(())
        })))
    }

    /// A cancel operation that may itself fail, typically because it
    /// cancels nested executions.
    pub fn fallible(f: impl FnOnce() -> Result<(), TaskError> + Send + 'static) -> Self {
        Self(Kind::Action(Box::new(f)))
    }

    /// A cancel operation with nothing to do.
    pub fn noop() -> Self {
        Self(Kind::Noop)
    }

    /// No cancel operation: the source cannot be stopped but cancelling is
    /// still accepted at Task level.
    pub fn none() -> Self {
        Self(Kind::Missing)
    }

    /// The source can never be aborted and cancelling must fail loudly.
    pub fn unsupported() -> Self {
        Self(Kind::Unsupported)
    }

    /// Runs the operation on behalf of the execution described by `lineage`.
    pub(crate) fn invoke(self, engine: &Engine, lineage: &Lineage) -> Result<(), TaskError> {
        match self.0 {
            Kind::Noop => Ok(()),
            Kind::Action(f) => f(),
            Kind::Missing => {
                engine.report(Diagnostic::NotCancellable {
                    lineage: lineage.to_string(),
                });
                Ok(())
            }
            Kind::Unsupported => Err(TaskError::Uncancellable {
                lineage: lineage.to_string(),
            }),
        }
    }
}

impl<T: Value, E: Value> From<Execution<T, E>> for Cancel {
    /// Cancelling forwards to the nested execution.
    fn from(execution: Execution<T, E>) -> Self {
        Self::fallible(move || execution.halt())
    }
}

impl fmt::Debug for Cancel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.0 {
            Kind::Noop => "Noop",
            Kind::Action(_) => "Action",
            Kind::Missing => "Missing",
            Kind::Unsupported => "Unsupported",
        };

        f.debug_tuple("Cancel").field(&kind).finish()
    }
}
