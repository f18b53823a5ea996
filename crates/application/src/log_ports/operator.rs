use flowtrail_core::OperatorIdentity;

/// Ambient accessor for the operator behind the current request.
///
/// Background jobs have no ambient operator; writers accept an explicit
/// override and fall back to the system identity when both are absent.
pub trait OperatorContext: Send + Sync {
    /// Returns the operator of the current request, if any.
    fn current_operator(&self) -> Option<OperatorIdentity>;
}
