use super::core::Core;
use super::{Outcome, StatusKind};
use crate::diagnostics::Diagnostic;
use crate::error::Defect;
use crate::runtime::Engine;
use crate::task::Value;

use std::fmt;
use std::sync::Arc;

/// The callbacks a subscription uses to settle its execution.
///
/// A resolver is handed to the subscription when the task is forked. It can
/// be cloned and sent to whatever thread eventually completes the work.
/// Only the first of `resolve`, `reject` and `defect` takes effect; later
/// calls are discarded and reported as
/// [`Diagnostic::AlreadySettled`](crate::diagnostics::Diagnostic::AlreadySettled).
pub struct Resolver<T, E> {
    core: Arc<Core<T, E>>,
}

impl<T: Value, E: Value> Resolver<T, E> {
    pub(crate) fn new(core: Arc<Core<T, E>>) -> Self {
        Self { core }
    }

    /// Settles the execution with a value.
    pub fn resolve(&self, value: T) {
        self.core.settle(Outcome::Resolved(value));
    }

    /// Settles the execution with a failure.
    pub fn reject(&self, reason: E) {
        self.core.settle(Outcome::Rejected(reason));
    }

    /// Settles the execution with a failure caused by a panic in user code.
    pub fn defect(&self, defect: Defect)
    where
        E: From<Defect>,
    {
        self.core.defect(defect);
    }

    /// Returns `true` while the execution has not settled or been cancelled.
    ///
    /// Long-running sources may poll this to stop early.
    pub fn is_pending(&self) -> bool {
        self.status() == StatusKind::Pending
    }

    pub fn status(&self) -> StatusKind {
        self.core.kind()
    }

    /// The engine the execution was forked under.
    ///
    /// Nested tasks forked by a subscription should be forked under the same
    /// engine.
    pub fn engine(&self) -> &Engine {
        self.core.engine()
    }

    /// Marks the execution cancelled because its source was cancelled.
    pub(crate) fn cancelled(&self) {
        if let Err(error) = self.core.cancel(false) {
            self.core.engine().report(Diagnostic::CancelFailed { error });
        }
    }
}

impl<T, E> Clone for Resolver<T, E> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<T: Value, E: Value> fmt::Debug for Resolver<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("status", &self.core.kind())
            .field("lineage", self.core.lineage())
            .finish()
    }
}
