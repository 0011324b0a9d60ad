use super::Group;
use crate::execution::{Cancel, Handlers, Outcome, Resolver};
use crate::task::{Task, Value};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

struct Race<T, E> {
    resolver: Resolver<T, E>,
    settled: AtomicBool,
    group: Group<T, E>,
}

impl<T: Value, E: Value> Race<T, E> {
    /// Settles the aggregate unless another constituent got there first.
    fn finish(&self, settle: impl FnOnce(&Resolver<T, E>)) {
        if self.settled.swap(true, Ordering::AcqRel) {
            return;
        }

        settle(&self.resolver);
        self.group.abandon_all();
    }
}

/// Runs every task concurrently and settles like the first one to settle.
///
/// The losers are cancelled. A task cancelled from elsewhere counts as
/// settling first and cancels the race. An empty input never settles.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
///
/// use lazytask::{Outcome, Task, race};
///
/// let task = race([
///     Task::<&str, String>::wait(Duration::from_millis(50), "slow"),
///     Task::wait(Duration::from_millis(5), "fast"),
/// ]);
///
/// let outcome = futures::executor::block_on(task.fork(|_| {}, |_| {}).settled());
/// assert_eq!(outcome, Outcome::Resolved("fast"));
/// ```
pub fn race<T, E>(tasks: impl IntoIterator<Item = Task<T, E>>) -> Task<T, E>
where
    T: Value,
    E: Value,
{
    let tasks: Arc<[Task<T, E>]> = tasks.into_iter().collect();

    Task::named("race", move |resolver| {
        if tasks.is_empty() {
            return Cancel::noop();
        }

        let engine = resolver.engine().clone();
        let race = Arc::new(Race {
            resolver,
            settled: AtomicBool::new(false),
            group: Group::new(),
        });

        for task in tasks.iter() {
            if !race.resolver.is_pending() {
                break;
            }

            let (resolved, rejected) = (race.clone(), race.clone());
            let execution = task.fork_in(
                &engine,
                Handlers::new(
                    move |reason| rejected.finish(|resolver| resolver.reject(reason)),
                    move |value| resolved.finish(|resolver| resolver.resolve(value)),
                ),
            );

            let cancelled = race.clone();
            execution.listen(move |outcome| {
                if let Outcome::Cancelled = outcome {
                    cancelled.finish(Resolver::cancelled);
                }
            });

            race.group.push(execution);
        }

        if !race.resolver.is_pending() {
            race.group.abandon_all();
        }

        Cancel::fallible(move || race.group.halt_all())
    })
}
