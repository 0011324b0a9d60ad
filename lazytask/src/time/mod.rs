//! Time-based task sources.
//!
//! This module provides [`Task::wait`](crate::Task::wait), a delayed-value
//! task backed by the timer reactor.

mod wait;
