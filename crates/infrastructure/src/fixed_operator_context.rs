use flowtrail_application::log_ports::OperatorContext;
use flowtrail_core::OperatorIdentity;

/// Operator context carrying one fixed identity.
///
/// Used by background jobs and tools where no per-request operator exists;
/// constructed with `None` it makes every write fall back to the system
/// identity.
pub struct FixedOperatorContext {
    operator: Option<OperatorIdentity>,
}

impl FixedOperatorContext {
    /// Creates a context that always reports the given operator.
    #[must_use]
    pub fn new(operator: OperatorIdentity) -> Self {
        Self {
            operator: Some(operator),
        }
    }

    /// Creates a context with no operator.
    #[must_use]
    pub fn anonymous() -> Self {
        Self { operator: None }
    }
}

impl OperatorContext for FixedOperatorContext {
    fn current_operator(&self) -> Option<OperatorIdentity> {
        self.operator.clone()
    }
}
