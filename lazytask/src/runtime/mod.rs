//! Engine configuration.
//!
//! The engine is the context every execution is forked under. It does not
//! schedule anything: subscriptions run synchronously on fork and complete
//! whenever their collaborators call back. What the engine carries is the
//! configuration shared by a whole chain of executions, currently the
//! diagnostic sink.

mod builder;
mod core;

pub use builder::EngineBuilder;
pub use core::Engine;
