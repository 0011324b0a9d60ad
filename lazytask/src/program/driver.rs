use crate::error::Defect;
use crate::execution::{Pump, Resolver};
use crate::task::Value;
use crate::utils::{guard, lock};

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, TryLockError};
use std::task::{Context, Poll, Wake, Waker};

type BoxFuture<T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send>>;

/// Polls a future to completion without an executor, settling a resolver
/// with its output.
///
/// The driver is its own waker: whichever thread wakes it polls the future
/// right away, unless a poll is already in progress, in which case that poll
/// is repeated once it returns.
pub(crate) struct Driver<T, E> {
    /// Combinator the future belongs to, for defects.
    name: &'static str,

    /// `None` once the future completed or was dropped.
    future: Mutex<Option<BoxFuture<T, E>>>,

    pump: Pump,
    resolver: Resolver<T, E>,
}

impl<T: Value, E: Value + From<Defect>> Driver<T, E> {
    /// Starts driving `future`, polling it once on the calling thread.
    pub(crate) fn spawn(
        name: &'static str,
        resolver: Resolver<T, E>,
        future: BoxFuture<T, E>,
    ) -> Arc<Self> {
        let driver = Arc::new(Self {
            name,
            future: Mutex::new(Some(future)),
            pump: Pump::running(),
            resolver,
        });

        driver.drive();
        driver
    }

    fn drive(self: &Arc<Self>) {
        let waker = Waker::from(self.clone());
        let mut cx = Context::from_waker(&waker);

        loop {
            let polled = {
                let mut slot = lock(&self.future);

                slot.as_mut()
                    .map(|future| guard(self.name, || future.as_mut().poll(&mut cx)))
            };

            match polled {
                Some(Ok(Poll::Ready(Ok(value)))) => {
                    self.finish();
                    self.resolver.resolve(value);
                }
                Some(Ok(Poll::Ready(Err(reason)))) => {
                    self.finish();
                    self.resolver.reject(reason);
                }
                Some(Err(defect)) => {
                    self.finish();
                    self.resolver.defect(defect);
                }
                Some(Ok(Poll::Pending)) => {
                    // Cancelled while suspended: nothing will ever resume it.
                    if !self.resolver.is_pending() {
                        self.finish();
                    }
                }
                None => {}
            }

            if self.pump.park() {
                return;
            }
        }
    }

    /// Drops the future outside of its lock.
    fn finish(&self) {
        let future = lock(&self.future).take();
        drop(future);
    }

    /// Drops the future unless it is being polled right now.
    ///
    /// A poll in progress notices the cancelled resolver when it returns and
    /// drops the future itself.
    pub(crate) fn abort(&self) {
        let future = match self.future.try_lock() {
            Ok(mut slot) => slot.take(),
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner().take(),
            Err(TryLockError::WouldBlock) => None,
        };

        drop(future);
    }
}

impl<T: Value, E: Value + From<Defect>> Wake for Driver<T, E> {
    fn wake(self: Arc<Self>) {
        if self.pump.notify() {
            self.drive();
        }
    }

    fn wake_by_ref(self: &Arc<Self>) {
        if self.pump.notify() {
            self.drive();
        }
    }
}
