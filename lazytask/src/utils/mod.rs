//! Internal helpers shared by the engine and the combinators.
//!
//! - [`lock`] acquires a mutex without surfacing poisoning. Locks guarding
//!   execution state are never held while user code runs, so a poisoned
//!   lock only means a panic happened elsewhere and the data is consistent.
//! - [`guard`] runs user-supplied code and turns a panic into a
//!   [`Defect`](crate::error::Defect).

mod panic;
mod sync;

pub(crate) use panic::guard;
pub(crate) use sync::lock;
