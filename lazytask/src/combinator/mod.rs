//! Concurrency combinators.
//!
//! These functions aggregate many tasks of the same type into one:
//!
//! - [`all`] resolves with every value in input order, or rejects with the
//!   first failure.
//! - [`race`] settles like the first task to settle.
//! - [`sequence`] runs the tasks one after another and collects every
//!   outcome in input order.
//! - [`parallel`] runs the tasks concurrently and collects every outcome in
//!   completion order.
//!
//! Cancelling the aggregate cancels every constituent still pending, and a
//! constituent cancelled from elsewhere cancels the aggregate.
//! `sequence` and `parallel` never reject: a failed constituent is recorded
//! as a [`TaskFailure`] carrying its input index.

mod all;
mod parallel;
mod race;
mod sequence;

pub use all::all;
pub use parallel::parallel;
pub use race::race;
pub use sequence::sequence;

use crate::error::TaskError;
use crate::execution::Execution;
use crate::task::Value;
use crate::utils::lock;

use std::sync::Mutex;

/// A failed constituent of [`sequence`] or [`parallel`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("task #{index} failed: {reason:?}")]
pub struct TaskFailure<E> {
    /// Position of the task in the input.
    pub index: usize,

    /// Why the task rejected.
    pub reason: E,
}

/// The constituents forked by an aggregate.
pub(crate) struct Group<T, E> {
    executions: Mutex<Vec<Execution<T, E>>>,
}

impl<T: Value, E: Value> Group<T, E> {
    pub(crate) fn new() -> Self {
        Self {
            executions: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn push(&self, execution: Execution<T, E>) {
        lock(&self.executions).push(execution);
    }

    /// Cancels every constituent still pending, returning the first error.
    pub(crate) fn halt_all(&self) -> Result<(), TaskError> {
        let executions = lock(&self.executions).clone();

        executions
            .iter()
            .map(Execution::halt)
            .fold(Ok(()), |first, result| first.and(result))
    }

    /// Like [`halt_all`](Self::halt_all), once the aggregate already settled.
    pub(crate) fn abandon_all(&self) {
        let executions = lock(&self.executions).clone();

        for execution in &executions {
            execution.abandon();
        }
    }
}
