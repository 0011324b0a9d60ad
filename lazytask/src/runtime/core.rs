use crate::diagnostics::{Diagnostic, DiagnosticSink, TracingSink};
use crate::error::Defect;
use crate::execution::{Execution, Handlers};
use crate::task::{Task, Value};

use std::fmt;
use std::sync::{Arc, OnceLock};

/// The context executions are forked under.
///
/// An `Engine` carries the diagnostic sink every execution reports to. The
/// engine used to fork a task is handed down to every nested execution a
/// combinator starts on its behalf, so a whole chain reports to one sink.
///
/// [`Task::fork`] and [`Task::run`] use a process-wide default engine that
/// reports through `tracing`. Build a dedicated one with
/// [`EngineBuilder`](crate::EngineBuilder).
#[derive(Clone)]
pub struct Engine {
    /// Destination of diagnostics.
    sink: Arc<dyn DiagnosticSink>,
}

impl Engine {
    pub(crate) fn new(sink: Arc<dyn DiagnosticSink>) -> Self {
        Self { sink }
    }

    /// Returns the process-wide default engine.
    pub(crate) fn global() -> &'static Engine {
        static GLOBAL: OnceLock<Engine> = OnceLock::new();
        GLOBAL.get_or_init(Engine::default)
    }

    /// Reports a diagnostic to the configured sink.
    ///
    /// Collaborators wrapping their own asynchronous sources may use this to
    /// surface non-fatal conditions alongside the engine's own reports.
    pub fn report(&self, diagnostic: Diagnostic) {
        self.sink.report(&diagnostic);
    }

    /// Forks `task` under this engine.
    ///
    /// The subscription runs immediately and synchronously. Exactly one of
    /// `on_reject` and `on_resolve` fires, unless the execution is cancelled
    /// first, in which case neither does.
    pub fn fork<T, E, R, S>(
        &self,
        task: &Task<T, E>,
        on_reject: R,
        on_resolve: S,
    ) -> Execution<T, E>
    where
        T: Value,
        E: Value,
        R: FnOnce(E) + Send + 'static,
        S: FnOnce(T) + Send + 'static,
    {
        task.fork_in(self, Handlers::new(on_reject, on_resolve))
    }

    /// Forks `task` with an additional callback observing defects.
    ///
    /// `on_error` runs when user code of the outermost combinator panics,
    /// right before the resulting rejection reaches `on_reject`.
    pub fn fork_with<T, E, R, S, D>(
        &self,
        task: &Task<T, E>,
        on_reject: R,
        on_resolve: S,
        on_error: D,
    ) -> Execution<T, E>
    where
        T: Value,
        E: Value,
        R: FnOnce(E) + Send + 'static,
        S: FnOnce(T) + Send + 'static,
        D: FnOnce(&Defect) + Send + 'static,
    {
        task.fork_in(self, Handlers::new(on_reject, on_resolve).on_error(on_error))
    }

    /// Forks `task`, reporting a rejection as
    /// [`Diagnostic::UnhandledRejection`] instead of requiring a handler.
    pub fn run<T, E, S>(&self, task: &Task<T, E>, on_resolve: S) -> Execution<T, E>
    where
        T: Value,
        E: Value + fmt::Debug,
        S: FnOnce(T) + Send + 'static,
    {
        let engine = self.clone();
        let lineage = task.lineage().to_string();

        self.fork(
            task,
            move |reason| {
                engine.report(Diagnostic::UnhandledRejection {
                    reason: format!("{reason:?}"),
                    lineage,
                })
            },
            on_resolve,
        )
    }
}

impl Default for Engine {
    /// An engine reporting through [`TracingSink`].
    fn default() -> Self {
        Self::new(Arc::new(TracingSink))
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine").finish_non_exhaustive()
    }
}
