//! # lazytask
//!
//! **lazytask** is a lazy, cancellable task algebra for Rust. A [`Task`]
//! describes one deferred computation that eventually resolves with a value,
//! rejects with a failure, or is cancelled. Nothing runs until the task is
//! forked.
//!
//! Unlike futures, tasks are not polled by an executor. Forking a task runs
//! its subscription immediately and synchronously; asynchronous sources then
//! settle the execution from whatever thread completes the work. The crate
//! itself spawns a single thread, the timer reactor backing [`Task::wait`].
//!
//! The crate provides:
//!
//! - An **execution engine** enforcing at-most-once resolution, with
//!   cancellation and synchronous status inspection
//! - A **combinator algebra**: `map`, `chain`, `then`, `catch`, `cache`,
//!   `retry`, `repeat` and more
//! - **Concurrency combinators**: [`all`], [`race`], [`sequence`] and
//!   [`parallel`]
//! - **Programs**: `async` bodies sequencing tasks step by step with
//!   [`Task::program`]
//! - **Diagnostics** for protocol violations, reported instead of raised
//!
//! ## Quick Start
//!
//! ```rust
//! use std::time::Duration;
//!
//! use lazytask::{Outcome, Task};
//!
//! let task = Task::<i32, String>::wait(Duration::from_millis(10), 20)
//!     .map(|x| x * 2)
//!     .chain(|x| Task::of(x + 2));
//!
//! // Nothing has run yet.
//! let execution = task.fork(
//!     |reason| eprintln!("failed: {reason}"),
//!     |value| println!("got {value}"),
//! );
//!
//! let outcome = futures::executor::block_on(execution.settled());
//! assert_eq!(outcome, Outcome::Resolved(42));
//! ```
//!
//! ## Modules
//!
//! - [`combinator`] — Aggregating many tasks into one
//! - [`program`] — Coroutine-style sequencing
//! - [`diagnostics`] — Non-fatal diagnostics and their sinks
//! - [`error`] — Defects and unsupported operations
//!
//! ## Getting Started
//!
//! Add lazytask to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! lazytask = { git = "https://github.com/Nebula-ecosystem/lazytask", package = "lazytask" }
//! ```

mod bridge;
mod execution;
mod reactor;
mod runtime;
mod task;
mod time;
mod tools;
mod utils;

pub mod combinator;
pub mod diagnostics;
pub mod error;
pub mod program;

pub use combinator::{TaskFailure, all, parallel, race, sequence};
pub use diagnostics::{Diagnostic, DiagnosticSink, MemorySink, TracingSink};
pub use error::{Defect, TaskError};
pub use execution::{Cancel, Execution, Outcome, Resolver, Settled, Status, StatusKind};
pub use program::{Co, Step};
pub use runtime::{Engine, EngineBuilder};
pub use task::{Lineage, Next, Task, Value};
