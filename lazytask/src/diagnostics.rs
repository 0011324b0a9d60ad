//! Non-fatal diagnostics.
//!
//! The engine never panics or returns an error for protocol violations such
//! as resolving an execution twice: these often come from legitimately racing
//! cleanup paths. They are reported to a [`DiagnosticSink`] instead.
//!
//! The sink is part of the [`Engine`](crate::Engine) an execution was forked
//! under, and nested executions started by combinators inherit it. The default
//! engine reports through [`TracingSink`].

use crate::error::{Defect, TaskError};
use crate::execution::StatusKind;
use crate::utils::lock;

use std::fmt;
use std::sync::{Arc, Mutex};

/// An event reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A resolve, reject or defect arrived after the execution settled.
    AlreadySettled {
        attempted: StatusKind,
        current: StatusKind,
        lineage: String,
    },

    /// `cancel` was called on an execution that had already settled.
    CancelAfterSettle { current: StatusKind, lineage: String },

    /// A node of the chain supplied no cancel operation.
    NotCancellable { lineage: String },

    /// Cancelling a constituent failed while no caller could observe the error.
    CancelFailed { error: TaskError },

    /// User code panicked and the panic was converted into a rejection.
    Defect { defect: Defect, lineage: String },

    /// A task started with `run` was rejected.
    UnhandledRejection { reason: String, lineage: String },

    /// A failed attempt of `retry` that will be attempted again.
    RetryFailed {
        attempt: usize,
        remaining: usize,
        reason: String,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadySettled {
                attempted,
                current,
                lineage,
            } => write!(
                f,
                "`{lineage}` is already {current}, ignoring transition to {attempted}"
            ),
            Self::CancelAfterSettle { current, lineage } => {
                write!(f, "`{lineage}` is already {current}, ignoring cancel")
            }
            Self::NotCancellable { lineage } => write!(
                f,
                "cannot cancel task chain `{lineage}`: one or more tasks has no cancellation handler"
            ),
            Self::CancelFailed { error } => write!(f, "{error}"),
            Self::Defect { defect, lineage } => write!(f, "`{lineage}` rejected by {defect}"),
            Self::UnhandledRejection { reason, lineage } => {
                write!(f, "unhandled rejection in `{lineage}`: {reason}")
            }
            Self::RetryFailed {
                attempt,
                remaining,
                reason,
            } => write!(
                f,
                "attempt #{attempt} failed ({reason}), {remaining} retries left"
            ),
        }
    }
}

/// Destination of engine diagnostics.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: &Diagnostic);
}

/// Forwards diagnostics to `tracing`.
///
/// Protocol violations and unhandled rejections are emitted at `WARN`,
/// defects at `ERROR`, and routine events (retries, late cancels) at `DEBUG`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: &Diagnostic) {
        match diagnostic {
            Diagnostic::AlreadySettled { .. }
            | Diagnostic::NotCancellable { .. }
            | Diagnostic::CancelFailed { .. }
            | Diagnostic::UnhandledRejection { .. } => {
                tracing::warn!(target: "lazytask", "{diagnostic}")
            }
            Diagnostic::Defect { .. } => tracing::error!(target: "lazytask", "{diagnostic}"),
            Diagnostic::CancelAfterSettle { .. } | Diagnostic::RetryFailed { .. } => {
                tracing::debug!(target: "lazytask", "{diagnostic}")
            }
        }
    }
}

/// Keeps every reported diagnostic in memory.
///
/// Clones share the same record, so a clone can be handed to an
/// [`EngineBuilder`](crate::EngineBuilder) while the original is inspected.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<Diagnostic>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the diagnostics reported so far.
    pub fn records(&self) -> Vec<Diagnostic> {
        lock(&self.records).clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.records).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.records).is_empty()
    }

    pub fn clear(&self) {
        lock(&self.records).clear();
    }
}

impl DiagnosticSink for MemorySink {
    fn report(&self, diagnostic: &Diagnostic) {
        lock(&self.records).push(diagnostic.clone());
    }
}
