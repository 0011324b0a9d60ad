use crate::error::Defect;

use std::panic::{self, AssertUnwindSafe};

/// Runs `f`, converting a panic into a [`Defect`] attributed to `combinator`.
///
/// User closures handed to combinators are the only code executed through
/// this function. The closure is asserted unwind-safe: on panic, none of the
/// state it touched is observed again by the engine.
pub(crate) fn guard<R>(combinator: &'static str, f: impl FnOnce() -> R) -> Result<R, Defect> {
    panic::catch_unwind(AssertUnwindSafe(f))
        .map_err(|payload| Defect::from_panic(combinator, payload))
}
