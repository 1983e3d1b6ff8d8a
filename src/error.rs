//! The error taxonomy shared by every fallible operation in the crate.

use crate::model::Number;

/// Errors that can be produced while building or solving a problem.
///
/// Every fallible surface in the crate returns `Result<_, SolverError>`; there is no panicking
/// path for a user-reachable mistake such as an empty domain, a division by the literal zero, or
/// an unknown solve mode.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SolverError {
    /// A value fell outside a variable's declared domain, a division or modulo by the literal
    /// zero was attempted at build time, or a variable was constructed with an empty domain.
    #[error("{0}")]
    DomainError(String),

    /// Preprocessing emptied a domain, or proved a constraint literally false under the
    /// bindings derived so far.
    #[error("problem is infeasible: {0}")]
    Infeasible(String),

    /// Preprocessing recorded two different values for the same variable. This indicates a bug
    /// in the caller's constraints or in the solver itself, not a user-correctable mistake.
    #[error("internal inconsistency: {0}")]
    InternalInconsistency(String),

    /// An unknown solve mode was requested, `optimal` was requested without an objective, or a
    /// non-expression value was supplied where an objective expression was required.
    #[error("invalid solver configuration: {0}")]
    ConfigError(String),

    /// An expression was built with too few operands, or with a malformed combination of
    /// constructor arguments.
    #[error("malformed expression: {0}")]
    BuildError(String),
}

impl SolverError {
    pub(crate) fn domain(message: impl Into<String>) -> Self {
        SolverError::DomainError(message.into())
    }

    pub(crate) fn infeasible(message: impl Into<String>) -> Self {
        SolverError::Infeasible(message.into())
    }

    pub(crate) fn internal_inconsistency(message: impl Into<String>) -> Self {
        SolverError::InternalInconsistency(message.into())
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        SolverError::ConfigError(message.into())
    }

    pub(crate) fn build(message: impl Into<String>) -> Self {
        SolverError::BuildError(message.into())
    }
}

/// Convenience alias used throughout the crate.
pub type SolverResult<T> = Result<T, SolverError>;

/// Formats a value out of its domain for use in an error message.
pub(crate) fn not_in_domain(name: &str, value: Number) -> SolverError {
    SolverError::domain(format!("value {value} is not in the domain of variable {name:?}"))
}
