use super::{Group, TaskFailure};
use crate::execution::{Cancel, Handlers, Resolver};
use crate::task::{Task, Value};
use crate::utils::lock;

use std::mem;
use std::sync::{Arc, Mutex};

type Entry<T, E> = Result<T, TaskFailure<E>>;

struct Parallel<T, E> {
    resolver: Resolver<Vec<Entry<T, E>>, E>,
    expected: usize,
    results: Mutex<Vec<Entry<T, E>>>,
    group: Group<T, E>,
}

impl<T: Value, E: Value> Parallel<T, E> {
    fn record(&self, entry: Entry<T, E>) {
        let results = {
            let mut results = lock(&self.results);
            results.push(entry);

            if results.len() < self.expected {
                return;
            }

            mem::take(&mut *results)
        };

        self.resolver.resolve(results);
    }
}

/// Runs every task concurrently and resolves with one entry per task, in
/// completion order.
///
/// A failure is recorded as a [`TaskFailure`] carrying the input index of
/// the task. The aggregate never rejects, but a task cancelled from
/// elsewhere cancels it. An empty input resolves with an empty vector.
pub fn parallel<T, E>(
    tasks: impl IntoIterator<Item = Task<T, E>>,
) -> Task<Vec<Result<T, TaskFailure<E>>>, E>
where
    T: Value,
    E: Value,
{
    let tasks: Arc<[Task<T, E>]> = tasks.into_iter().collect();

    Task::named("parallel", move |resolver| {
        if tasks.is_empty() {
            resolver.resolve(Vec::new());
            return Cancel::noop();
        }

        let engine = resolver.engine().clone();
        let parallel = Arc::new(Parallel {
            resolver,
            expected: tasks.len(),
            results: Mutex::new(Vec::with_capacity(tasks.len())),
            group: Group::new(),
        });

        for (index, task) in tasks.iter().enumerate() {
            if !parallel.resolver.is_pending() {
                break;
            }

            let (resolved, rejected) = (parallel.clone(), parallel.clone());
            let execution = task.fork_in(
                &engine,
                Handlers::new(
                    move |reason| rejected.record(Err(TaskFailure { index, reason })),
                    move |value| resolved.record(Ok(value)),
                ),
            );

            execution.cascade(&parallel.resolver);
            parallel.group.push(execution);
        }

        if !parallel.resolver.is_pending() {
            parallel.group.abandon_all();
        }

        Cancel::fallible(move || parallel.group.halt_all())
    })
}
