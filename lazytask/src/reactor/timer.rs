use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Instant;

/// An entry in the reactor timer queue.
///
/// `TimerEntry` represents a callback scheduled at a specific deadline. It
/// is stored inside a binary heap ordered by deadline, then by registration
/// order, so timers sharing a deadline fire in the order they were set.
///
/// The entry may be cancelled before it fires.
pub(crate) struct TimerEntry {
    /// The time at which the timer should fire.
    pub(crate) deadline: Instant,

    /// Registration order, breaking ties between equal deadlines.
    pub(crate) sequence: u64,

    /// Callback run on the reactor thread when the deadline is reached.
    pub(crate) callback: Box<dyn FnOnce() + Send>,

    /// Cancellation flag shared with the task that set the timer.
    pub(crate) cancelled: Arc<AtomicBool>,
}

impl TimerEntry {
    fn key(&self) -> (Instant, u64) {
        (self.deadline, self.sequence)
    }
}

impl Eq for TimerEntry {}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key().eq(&other.key())
    }
}

impl Ord for TimerEntry {
    /// Orders timer entries by deadline, then registration order.
    ///
    /// Note that the comparison is **reversed** so that a
    /// `BinaryHeap<TimerEntry>` behaves as a min-heap,
    /// where the earliest deadline is popped first.
    fn cmp(&self, other: &Self) -> Ordering {
        other.key().cmp(&self.key())
    }
}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for TimerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerEntry")
            .field("deadline", &self.deadline)
            .field("sequence", &self.sequence)
            .finish_non_exhaustive()
    }
}
