use super::Engine;
use crate::diagnostics::{DiagnosticSink, TracingSink};

use std::sync::Arc;

/// Builder for configuring and creating an [`Engine`].
///
/// `EngineBuilder` allows customizing where the engine reports its
/// diagnostics before any task is forked under it.
///
/// # Examples
///
/// ```rust
/// use lazytask::EngineBuilder;
/// use lazytask::diagnostics::MemorySink;
///
/// let sink = MemorySink::new();
/// let engine = EngineBuilder::new()
///     .diagnostics(sink.clone())
///     .build();
/// # let _ = engine;
/// ```
pub struct EngineBuilder {
    /// Destination of protocol violations and other diagnostics.
    sink: Arc<dyn DiagnosticSink>,
}

impl EngineBuilder {
    /// Creates a new `EngineBuilder` with default configuration.
    ///
    /// By default, diagnostics are forwarded to `tracing` through
    /// [`TracingSink`].
    pub fn new() -> Self {
        Self {
            sink: Arc::new(TracingSink),
        }
    }

    /// Sets the sink receiving the engine diagnostics.
    ///
    /// Every execution forked under the built engine, including the nested
    /// executions started by combinators, reports to this sink.
    pub fn diagnostics(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.sink = Arc::new(sink);
        self
    }

    /// Sets an already shared sink.
    pub fn shared_diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Builds the engine with the configured options.
    pub fn build(self) -> Engine {
        Engine::new(self.sink)
    }
}

impl Default for EngineBuilder {
    /// Creates a default `EngineBuilder`.
    fn default() -> Self {
        Self::new()
    }
}
