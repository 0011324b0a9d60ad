//! Timer reactor.
//!
//! A single background thread owns a queue of timers and runs their
//! callbacks once their deadline is reached. It backs [`Task::wait`] and
//! [`Task::retry_every`], and is the only thread the crate ever spawns.
//!
//! Callbacks run on the reactor thread, so resolvers settled from a timer
//! run their continuations there too.
//!
//! [`Task::wait`]: crate::Task::wait
//! [`Task::retry_every`]: crate::Task::retry_every

mod core;
mod timer;

pub(crate) use core::ReactorHandle;
