use thiserror::Error;

use crate::session::Mode;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Invalid baseline: missing {missing:?}, unexpected {extra:?}")]
    InvalidBaseline { missing: Vec<String>, extra: Vec<String> },

    #[error("Illegal operation '{operation}' while {state}")]
    IllegalStateTransition { operation: &'static str, state: Mode },

    #[error("Unknown label: {label}")]
    UnknownLabel { label: String },

    #[error("Step {requested} out of range [0, {max}]")]
    StepOutOfRange { requested: f64, max: usize },
}

impl CoreError {
    /// Caller bugs: a UI that gates its affordances never triggers these.
    pub fn is_contract_violation(&self) -> bool {
        match self {
            CoreError::InvalidBaseline { .. } => true,
            CoreError::IllegalStateTransition { .. } => true,
            CoreError::UnknownLabel { .. } => false,
            CoreError::StepOutOfRange { .. } => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

/// Reports a contract violation and hands the error back for propagation.
///
/// With the `strict_contracts` feature the violation panics instead, so CI
/// runs surface the offending call site.
pub(crate) fn contract_violation(err: CoreError) -> CoreError {
    debug_assert!(err.is_contract_violation());
    #[cfg(feature = "strict_contracts")]
    panic!("contract violation: {}", err);
    #[cfg(not(feature = "strict_contracts"))]
    {
        tracing::error!(error = %err, "contract violation");
        err
    }
}
