//! Error types surfaced by the engine.
//!
//! Failures travel through three distinct channels:
//!
//! - **Domain failures** are the `E` of a [`Task<T, E>`](crate::Task) and flow
//!   along the reject channel until caught.
//! - **Defects** are panics raised by user code inside a combinator. They are
//!   caught where the code runs and re-expressed as a domain failure through
//!   `E: From<Defect>`.
//! - **Unsupported operations** ([`TaskError`]) are returned to the caller,
//!   e.g. when cancelling a chain that wraps a foreign future.
//!
//! Protocol violations (double resolution, cancelling a settled execution)
//! are not errors at all; they are reported through
//! [`diagnostics`](crate::diagnostics).

use std::any::Any;

/// A panic raised by user code running inside a combinator.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("defect in `{combinator}`: {message}")]
pub struct Defect {
    combinator: &'static str,
    message: String,
}

impl Defect {
    /// Creates a defect attributed to `combinator`.
    pub fn new(combinator: &'static str, message: impl Into<String>) -> Self {
        Self {
            combinator,
            message: message.into(),
        }
    }

    /// Builds a defect from a payload returned by `catch_unwind`.
    pub(crate) fn from_panic(combinator: &'static str, payload: Box<dyn Any + Send>) -> Self {
        let message = match payload.downcast::<String>() {
            Ok(message) => *message,
            Err(payload) => match payload.downcast::<&'static str>() {
                Ok(message) => (*message).to_owned(),
                Err(_) => "non-string panic payload".to_owned(),
            },
        };

        Self::new(combinator, message)
    }

    /// Name of the combinator whose user code panicked.
    pub fn combinator(&self) -> &'static str {
        self.combinator
    }

    /// The panic message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<Defect> for String {
    fn from(defect: Defect) -> Self {
        defect.to_string()
    }
}

/// An operation the engine cannot honour.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// The chain contains a node whose source can never be aborted.
    #[error("cannot cancel task chain `{lineage}`: the underlying source is not abortable")]
    Uncancellable { lineage: String },
}
