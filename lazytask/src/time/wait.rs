use crate::error::Defect;
use crate::execution::Cancel;
use crate::reactor::ReactorHandle;
use crate::task::{Task, Value};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

impl<T: Value, E: Value + From<Defect>> Task<T, E> {
    /// A task resolving with `value` once `duration` has elapsed.
    ///
    /// Each fork registers its own timer with the timer reactor. The value
    /// is delivered on the reactor thread. Cancelling a pending fork clears
    /// its timer.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::time::Duration;
    ///
    /// use lazytask::{Outcome, Task};
    ///
    /// let task = Task::<&str, String>::wait(Duration::from_millis(10), "done");
    /// let outcome = futures::executor::block_on(task.fork(|_| {}, |_| {}).settled());
    ///
    /// assert_eq!(outcome, Outcome::Resolved("done"));
    /// ```
    pub fn wait(duration: Duration, value: T) -> Self {
        Self::named("wait", move |resolver| {
            let cancelled = Arc::new(AtomicBool::new(false));
            let deadline = Instant::now() + duration;

            let (fire, value) = (resolver.clone(), value.clone());
            let registered = ReactorHandle::get().set_timer(deadline, cancelled.clone(), move || {
                fire.resolve(value)
            });

            if !registered {
                resolver.defect(Defect::new("wait", "timer reactor is not running"));
                return Cancel::noop();
            }

            Cancel::new(move || cancelled.store(true, Ordering::Release))
        })
    }
}
