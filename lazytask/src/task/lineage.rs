use std::fmt;
use std::sync::Arc;

/// The combinator steps a task was built from, innermost first.
///
/// Lineage is carried for diagnostics only and never affects semantics.
/// It displays as the step names joined by `->`, e.g. `wait -> map -> chain`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lineage(Arc<[&'static str]>);

impl Lineage {
    pub(crate) fn root(name: &'static str) -> Self {
        Self(Arc::from([name]))
    }

    /// Returns a lineage extended with `name`.
    pub(crate) fn then(&self, name: &'static str) -> Self {
        let mut steps = self.0.to_vec();
        steps.push(name);
        Self(steps.into())
    }

    pub fn steps(&self) -> &[&'static str] {
        &self.0
    }

    /// The outermost step.
    pub fn last(&self) -> Option<&'static str> {
        self.0.last().copied()
    }
}

impl fmt::Display for Lineage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" -> "))
    }
}
