use std::sync::atomic::{AtomicUsize, Ordering};

/// No driver is active; the next completion must drive.
const IDLE: usize = 0;

/// A driver is starting steps.
///
/// At most one caller observes this state at a time.
const RUNNING: usize = 1;

/// A step completed while the driver was still running.
///
/// The driver picks the completion up instead of the completing callback,
/// so synchronous completions never recurse.
const NOTIFIED: usize = 2;

/// Hands the role of driver between the code starting steps and the
/// callbacks reporting their completion.
///
/// Used wherever one step starts only after the previous one settled
/// (`sequence`, `repeat`, `retry`, programs). A step may settle synchronously
/// inside its own fork, on the forking thread, or later on any other thread;
/// the pump guarantees exactly one of them continues the loop.
pub(crate) struct Pump {
    state: AtomicUsize,
}

impl Pump {
    /// Creates a pump whose creator is the active driver.
    pub(crate) fn running() -> Self {
        Self {
            state: AtomicUsize::new(RUNNING),
        }
    }

    /// Signals that a step completed.
    ///
    /// Returns `true` if the caller became the driver and must continue the
    /// loop itself.
    pub(crate) fn notify(&self) -> bool {
        loop {
            match self.state.load(Ordering::Acquire) {
                IDLE => {
                    if self
                        .state
                        .compare_exchange(IDLE, RUNNING, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        return true;
                    }
                }
                RUNNING => {
                    if self
                        .state
                        .compare_exchange(RUNNING, NOTIFIED, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        return false;
                    }
                }
                _ => return false,
            }
        }
    }

    /// Gives up the driver role after starting a step.
    ///
    /// Returns `false` if the step already completed, in which case the
    /// caller stays the driver and must continue.
    pub(crate) fn park(&self) -> bool {
        if self
            .state
            .compare_exchange(RUNNING, IDLE, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            return true;
        }

        self.state.store(RUNNING, Ordering::Release);
        false
    }
}
