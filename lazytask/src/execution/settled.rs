use super::Outcome;
use super::core::Core;
use crate::task::Value;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// A future resolving with the outcome of an execution.
///
/// `Settled` bridges an [`Execution`](super::Execution) to `async` code. It
/// resolves immediately if the execution is already terminal, otherwise once
/// it settles. Cancellation is reported as [`Outcome::Cancelled`].
///
/// Dropping a `Settled` does **not** cancel the execution; it only discards
/// the ability to observe its outcome.
pub struct Settled<T, E> {
    /// Shared state of the observed execution.
    pub(crate) core: Arc<Core<T, E>>,
}

impl<T: Value, E: Value> Future for Settled<T, E> {
    type Output = Outcome<T, E>;

    /// Polls the execution.
    ///
    /// The waker is registered under the same lock that guards the status,
    /// so a terminal transition racing with this poll is never missed.
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.core.poll_outcome(cx.waker()) {
            Some(outcome) => Poll::Ready(outcome),
            None => Poll::Pending,
        }
    }
}
