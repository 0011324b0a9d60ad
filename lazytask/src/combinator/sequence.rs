use super::TaskFailure;
use crate::diagnostics::Diagnostic;
use crate::error::Defect;
use crate::execution::{Cancel, Execution, Handlers, Pump, Resolver};
use crate::runtime::Engine;
use crate::task::{Task, Value};
use crate::utils::{guard, lock};

use std::mem;
use std::sync::{Arc, Mutex};

type Entry<T, E> = Result<T, TaskFailure<E>>;

struct Sequence<T, E> {
    tasks: Arc<[Task<T, E>]>,
    engine: Engine,
    resolver: Resolver<Vec<Entry<T, E>>, E>,
    pump: Pump,

    /// One entry per settled task; its length is the index of the next one.
    results: Mutex<Vec<Entry<T, E>>>,
    current: Mutex<Option<Execution<T, E>>>,
}

impl<T: Value, E: Value + From<Defect>> Sequence<T, E> {
    /// Forks tasks one at a time until one stays pending.
    fn drive(self: &Arc<Self>) {
        loop {
            if !self.resolver.is_pending() {
                return;
            }

            let index = lock(&self.results).len();

            if index == self.tasks.len() {
                let results = mem::take(&mut *lock(&self.results));
                self.resolver.resolve(results);
                return;
            }

            let task = &self.tasks[index];
            let (resolved, rejected) = (self.clone(), self.clone());
            let forked = guard("sequence", || {
                task.fork_in(
                    &self.engine,
                    Handlers::new(
                        move |reason| rejected.record(Err(TaskFailure { index, reason })),
                        move |value| resolved.record(Ok(value)),
                    ),
                )
            });

            match forked {
                Ok(execution) => {
                    execution.cascade(&self.resolver);
                    *lock(&self.current) = Some(execution.clone());

                    if !self.resolver.is_pending() {
                        execution.abandon();
                        return;
                    }
                }
                Err(defect) => {
                    self.engine.report(Diagnostic::Defect {
                        defect: defect.clone(),
                        lineage: task.lineage().to_string(),
                    });

                    // Counts as a failure unless the task settled before panicking.
                    let recorded = lock(&self.results).len() > index;
                    if !recorded {
                        self.record(Err(TaskFailure {
                            index,
                            reason: E::from(defect),
                        }));
                    }
                }
            }

            if self.pump.park() {
                return;
            }
        }
    }

    fn record(self: &Arc<Self>, entry: Entry<T, E>) {
        lock(&self.results).push(entry);

        if self.pump.notify() {
            self.drive();
        }
    }
}

/// Runs the tasks one after another, each starting once the previous one
/// settled.
///
/// Resolves with one entry per task, in input order. A failure does not
/// stop the sequence and is recorded as a [`TaskFailure`], and so is a
/// panic in the subscription of a task. The aggregate never rejects, but it
/// is cancelled if a task it runs is cancelled from elsewhere.
///
/// # Examples
///
/// ```rust
/// use lazytask::{Status, Task, TaskFailure, sequence};
///
/// let task = sequence([
///     Task::<i32, String>::of(1),
///     Task::reject("boom".to_owned()),
///     Task::of(3),
/// ]);
///
/// assert_eq!(
///     task.fork(|_| {}, |_| {}).inspect(),
///     Status::Resolved(vec![
///         Ok(1),
///         Err(TaskFailure { index: 1, reason: "boom".to_owned() }),
///         Ok(3),
///     ])
/// );
/// ```
pub fn sequence<T, E>(
    tasks: impl IntoIterator<Item = Task<T, E>>,
) -> Task<Vec<Result<T, TaskFailure<E>>>, E>
where
    T: Value,
    E: Value + From<Defect>,
{
    let tasks: Arc<[Task<T, E>]> = tasks.into_iter().collect();

    Task::named("sequence", move |resolver| {
        let sequence = Arc::new(Sequence {
            tasks: tasks.clone(),
            engine: resolver.engine().clone(),
            resolver,
            pump: Pump::running(),
            results: Mutex::new(Vec::with_capacity(tasks.len())),
            current: Mutex::new(None),
        });

        sequence.drive();

        Cancel::fallible(move || {
            let current = lock(&sequence.current).take();

            match current {
                Some(execution) => execution.halt(),
                None => Ok(()),
            }
        })
    })
}
