use crate::error::Defect;
use crate::execution::{Cancel, Execution, Handlers, Pump, Resolver};
use crate::runtime::Engine;
use crate::task::{Task, Value};
use crate::utils::{guard, lock};

use std::mem;
use std::sync::{Arc, Mutex};

struct Repeat<T, E> {
    source: Task<T, E>,
    count: usize,
    engine: Engine,
    resolver: Resolver<Vec<T>, E>,
    pump: Pump,
    values: Mutex<Vec<T>>,
    current: Mutex<Option<Execution<T, E>>>,
}

impl<T: Value, E: Value + From<Defect>> Repeat<T, E> {
    fn drive(self: &Arc<Self>) {
        loop {
            if !self.resolver.is_pending() {
                return;
            }

            if lock(&self.values).len() == self.count {
                let values = mem::take(&mut *lock(&self.values));
                self.resolver.resolve(values);
                return;
            }

            let (resolved, rejected) = (self.clone(), self.clone());
            let forked = guard("repeat", || {
                self.source.duplicate().fork_in(
                    &self.engine,
                    Handlers::new(
                        move |reason| rejected.resolver.reject(reason),
                        move |value| resolved.record(value),
                    ),
                )
            });

            let execution = match forked {
                Ok(execution) => execution,
                Err(defect) => {
                    self.resolver.defect(defect);
                    return;
                }
            };

            execution.cascade(&self.resolver);
            *lock(&self.current) = Some(execution.clone());

            if !self.resolver.is_pending() {
                execution.abandon();
                return;
            }

            if self.pump.park() {
                return;
            }
        }
    }

    fn record(self: &Arc<Self>, value: T) {
        lock(&self.values).push(value);

        if self.pump.notify() {
            self.drive();
        }
    }
}

impl<T: Value, E: Value + From<Defect>> Task<T, E> {
    /// Runs `count` fresh duplicates of the task one after another.
    ///
    /// Resolves with every value in order. The first failure rejects without
    /// starting the remaining runs. `repeat(0)` resolves with an empty
    /// vector.
    pub fn repeat(&self, count: usize) -> Task<Vec<T>, E> {
        let source = self.clone();

        self.derive("repeat", move |resolver| {
            let repeat = Arc::new(Repeat {
                source: source.clone(),
                count,
                engine: resolver.engine().clone(),
                resolver,
                pump: Pump::running(),
                values: Mutex::new(Vec::with_capacity(count)),
                current: Mutex::new(None),
            });

            repeat.drive();

            Cancel::fallible(move || {
                let current = lock(&repeat.current).take();

                match current {
                    Some(execution) => execution.halt(),
                    None => Ok(()),
                }
            })
        })
    }
}
