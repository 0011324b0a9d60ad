use super::Group;
use crate::execution::{Cancel, Handlers, Resolver};
use crate::task::{Task, Value};
use crate::utils::lock;

use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

struct Slots<T> {
    values: Vec<Option<T>>,
    remaining: usize,
}

struct Gather<T, E> {
    resolver: Resolver<Vec<T>, E>,
    slots: Mutex<Slots<T>>,
    failed: AtomicBool,
    group: Group<T, E>,
}

impl<T: Value, E: Value> Gather<T, E> {
    fn fill(&self, index: usize, value: T) {
        let values = {
            let mut slots = lock(&self.slots);
            slots.values[index] = Some(value);
            slots.remaining -= 1;

            if slots.remaining > 0 {
                return;
            }

            mem::take(&mut slots.values)
        };

        self.resolver.resolve(values.into_iter().flatten().collect());
    }

    fn fail(&self, reason: E) {
        if self.failed.swap(true, Ordering::AcqRel) {
            return;
        }

        self.resolver.reject(reason);
        self.group.abandon_all();
    }
}

/// Runs every task concurrently and resolves with their values in input
/// order.
///
/// The first rejection rejects the aggregate and cancels every other task.
/// A task cancelled from elsewhere cancels the aggregate the same way. An
/// empty input resolves with an empty vector.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
///
/// use lazytask::{Outcome, Task, all};
///
/// let task = all([
///     Task::<i32, String>::wait(Duration::from_millis(20), 1),
///     Task::wait(Duration::from_millis(10), 2),
/// ]);
///
/// let outcome = futures::executor::block_on(task.fork(|_| {}, |_| {}).settled());
/// assert_eq!(outcome, Outcome::Resolved(vec![1, 2]));
/// ```
pub fn all<T, E>(tasks: impl IntoIterator<Item = Task<T, E>>) -> Task<Vec<T>, E>
where
    T: Value,
    E: Value,
{
    let tasks: Arc<[Task<T, E>]> = tasks.into_iter().collect();

    Task::named("all", move |resolver| {
        if tasks.is_empty() {
            resolver.resolve(Vec::new());
            return Cancel::noop();
        }

        let engine = resolver.engine().clone();
        let gather = Arc::new(Gather {
            resolver,
            slots: Mutex::new(Slots {
                values: vec![None; tasks.len()],
                remaining: tasks.len(),
            }),
            failed: AtomicBool::new(false),
            group: Group::new(),
        });

        for (index, task) in tasks.iter().enumerate() {
            // A synchronous failure already settled the aggregate.
            if !gather.resolver.is_pending() {
                break;
            }

            let (resolved, rejected) = (gather.clone(), gather.clone());
            let execution = task.fork_in(
                &engine,
                Handlers::new(
                    move |reason| rejected.fail(reason),
                    move |value| resolved.fill(index, value),
                ),
            );

            execution.cascade(&gather.resolver);
            gather.group.push(execution);
        }

        if !gather.resolver.is_pending() {
            gather.group.abandon_all();
        }

        Cancel::fallible(move || gather.group.halt_all())
    })
}
