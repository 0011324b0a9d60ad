use std::fmt;

/// The observable state of an execution.
///
/// `Resolved` carries the value and `Rejected` the reason. Once an execution
/// leaves `Pending` its status never changes again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status<T, E> {
    Pending,
    Resolved(T),
    Rejected(E),
    Cancelled,
}

impl<T, E> Status<T, E> {
    /// Returns the payload-free tag of this status.
    pub fn kind(&self) -> StatusKind {
        match self {
            Self::Pending => StatusKind::Pending,
            Self::Resolved(_) => StatusKind::Resolved,
            Self::Rejected(_) => StatusKind::Rejected,
            Self::Cancelled => StatusKind::Cancelled,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Returns the terminal outcome, or `None` while pending.
    pub fn outcome(&self) -> Option<Outcome<T, E>>
    where
        T: Clone,
        E: Clone,
    {
        match self {
            Self::Pending => None,
            Self::Resolved(value) => Some(Outcome::Resolved(value.clone())),
            Self::Rejected(reason) => Some(Outcome::Rejected(reason.clone())),
            Self::Cancelled => Some(Outcome::Cancelled),
        }
    }
}

impl<T, E> From<Outcome<T, E>> for Status<T, E> {
    fn from(outcome: Outcome<T, E>) -> Self {
        match outcome {
            Outcome::Resolved(value) => Self::Resolved(value),
            Outcome::Rejected(reason) => Self::Rejected(reason),
            Outcome::Cancelled => Self::Cancelled,
        }
    }
}

/// The status vocabulary without payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKind {
    Pending,
    Resolved,
    Rejected,
    Cancelled,
}

impl StatusKind {
    pub fn is_terminal(self) -> bool {
        self != Self::Pending
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "PENDING",
            Self::Resolved => "RESOLVED",
            Self::Rejected => "REJECTED",
            Self::Cancelled => "CANCELLED",
        })
    }
}

/// The terminal state an execution settled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T, E> {
    Resolved(T),
    Rejected(E),
    Cancelled,
}

impl<T, E> Outcome<T, E> {
    pub fn kind(&self) -> StatusKind {
        match self {
            Self::Resolved(_) => StatusKind::Resolved,
            Self::Rejected(_) => StatusKind::Rejected,
            Self::Cancelled => StatusKind::Cancelled,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Converts into a `Result`, with `None` standing for cancellation.
    pub fn into_result(self) -> Result<T, Option<E>> {
        match self {
            Self::Resolved(value) => Ok(value),
            Self::Rejected(reason) => Err(Some(reason)),
            Self::Cancelled => Err(None),
        }
    }
}
