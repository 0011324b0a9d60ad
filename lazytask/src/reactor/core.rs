use super::timer::TimerEntry;

use std::collections::BinaryHeap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, channel};
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::Instant;

pub(crate) struct Reactor {
    receiver: Receiver<TimerEntry>,
    timers: BinaryHeap<TimerEntry>,
}

impl Reactor {
    pub(crate) fn new() -> (Self, Sender<TimerEntry>) {
        let (transmitter, receiver) = channel();

        (
            Self {
                receiver,
                timers: BinaryHeap::new(),
            },
            transmitter,
        )
    }

    /// Fires timers until every handle is dropped and the queue is empty.
    pub(crate) fn run(&mut self) {
        loop {
            let received = match self.timers.peek() {
                Some(timer) => {
                    let timeout = timer.deadline.saturating_duration_since(Instant::now());

                    match self.receiver.recv_timeout(timeout) {
                        Ok(entry) => Some(entry),
                        Err(RecvTimeoutError::Timeout) => None,
                        Err(RecvTimeoutError::Disconnected) => None,
                    }
                }
                None => match self.receiver.recv() {
                    Ok(entry) => Some(entry),
                    Err(_) => return,
                },
            };

            let mut arrived = received.is_some();

            if let Some(entry) = received {
                self.timers.push(entry);
            }

            while let Ok(entry) = self.receiver.try_recv() {
                self.timers.push(entry);
                arrived = true;
            }

            if arrived {
                self.prune();
            }

            self.fire_expired();
        }
    }

    /// Drops cancelled timers before their deadline, releasing whatever
    /// their callbacks hold.
    fn prune(&mut self) {
        self.timers.retain(|timer| !timer.cancelled.load(Ordering::Acquire));
    }

    fn fire_expired(&mut self) {
        let now = Instant::now();

        while self.timers.peek().is_some_and(|timer| timer.deadline <= now) {
            let Some(timer) = self.timers.pop() else {
                break;
            };

            if timer.cancelled.load(Ordering::Acquire) {
                continue;
            }

            // A panicking callback must not take the timer thread down.
            if panic::catch_unwind(AssertUnwindSafe(timer.callback)).is_err() {
                tracing::error!(
                    target: "lazytask",
                    sequence = timer.sequence,
                    "timer callback panicked"
                );
            }
        }
    }
}

/// Entry point to the process-wide timer reactor.
///
/// The reactor thread is spawned on first use and lives for the rest of the
/// process.
pub(crate) struct ReactorHandle {
    sender: Sender<TimerEntry>,
    sequence: AtomicU64,
}

impl ReactorHandle {
    pub(crate) fn get() -> &'static ReactorHandle {
        static HANDLE: OnceLock<ReactorHandle> = OnceLock::new();

        HANDLE.get_or_init(|| {
            let (mut reactor, sender) = Reactor::new();

            // If the thread cannot be spawned, the receiver is dropped and
            // every timer reports itself as never firing.
            if let Err(error) = thread::Builder::new()
                .name("lazytask-timer".into())
                .spawn(move || reactor.run())
            {
                tracing::error!(target: "lazytask", %error, "failed to spawn timer thread");
            }

            ReactorHandle {
                sender,
                sequence: AtomicU64::new(0),
            }
        })
    }

    /// Runs `callback` on the reactor thread once `deadline` is reached,
    /// unless `cancelled` is set first.
    ///
    /// Returns `false` if the reactor is gone and the timer will never fire.
    pub(crate) fn set_timer(
        &self,
        deadline: Instant,
        cancelled: Arc<AtomicBool>,
        callback: impl FnOnce() + Send + 'static,
    ) -> bool {
        let entry = TimerEntry {
            deadline,
            sequence: self.sequence.fetch_add(1, Ordering::Relaxed),
            callback: Box::new(callback),
            cancelled,
        };

        self.sender.send(entry).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    fn entry(sequence: u64, payload: &Arc<()>) -> (TimerEntry, Arc<AtomicBool>) {
        let cancelled = Arc::new(AtomicBool::new(false));
        let payload = payload.clone();

        let entry = TimerEntry {
            deadline: Instant::now() + Duration::from_secs(3600),
            sequence,
            callback: Box::new(move || drop(payload)),
            cancelled: cancelled.clone(),
        };

        (entry, cancelled)
    }

    #[test]
    fn prune_drops_cancelled_timers() {
        let (mut reactor, _sender) = Reactor::new();
        let payload = Arc::new(());

        for sequence in 0..4 {
            let (timer, cancelled) = entry(sequence, &payload);
            cancelled.store(sequence % 2 == 0, Ordering::Release);
            reactor.timers.push(timer);
        }

        reactor.prune();

        let mut kept: Vec<u64> = reactor.timers.iter().map(|timer| timer.sequence).collect();
        kept.sort_unstable();

        assert_eq!(kept, vec![1, 3]);
        assert_eq!(
            Arc::strong_count(&payload),
            3,
            "Pruned callbacks should be dropped"
        );
    }

    #[test]
    fn prune_keeps_pending_timers() {
        let (mut reactor, _sender) = Reactor::new();
        let payload = Arc::new(());

        let (timer, _cancelled) = entry(0, &payload);
        reactor.timers.push(timer);
        reactor.prune();

        assert_eq!(reactor.timers.len(), 1);
    }
}
