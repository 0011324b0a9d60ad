use super::Task;

/// What a continuation produces: a plain value, a failure, or another task.
///
/// [`Task::then`], [`Task::catch`] and program steps accept anything
/// convertible into `Next`, so a continuation may return a [`Task`] or a
/// `Result` directly. Plain values are wrapped with [`Next::Value`].
pub enum Next<T, E> {
    /// Resolve immediately with this value.
    Value(T),

    /// Reject immediately with this reason.
    Fail(E),

    /// Fork this task and settle with its outcome.
    Task(Task<T, E>),
}

impl<T, E> From<Task<T, E>> for Next<T, E> {
    fn from(task: Task<T, E>) -> Self {
        Self::Task(task)
    }
}

impl<T, E> From<Result<T, E>> for Next<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Value(value),
            Err(reason) => Self::Fail(reason),
        }
    }
}
