//! Repetition utilities.
//!
//! This module provides [`Task::retry`](crate::Task::retry),
//! [`Task::retry_every`](crate::Task::retry_every) and
//! [`Task::repeat`](crate::Task::repeat). Each new run forks a fresh
//! [`duplicate`](crate::Task::duplicate) of the task, so a cached task is
//! run again rather than replaying its memoized outcome.

mod repeat;
mod retry;
