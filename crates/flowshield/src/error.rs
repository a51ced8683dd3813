//! Error types for the FlowShield library.

use thiserror::Error;

/// Main error type for FlowShield operations.
///
/// Structural errors (schema, profile, mismatch) abort a run before any row
/// is processed. Data-level findings are never raised as errors; they are
/// collected as [`Violation`](crate::validation::Violation)s instead. The one
/// exception is strict-mode repair, which promotes residual error-severity
/// violations to [`FlowShieldError::Unrepairable`].
#[derive(Debug, Error)]
pub enum FlowShieldError {
    /// Malformed schema definition.
    #[error("schema error: {0}")]
    Schema(String),

    /// Malformed profile or relation rule definition.
    #[error("profile error: {0}")]
    Profile(String),

    /// Dataset columns do not match the declared schema.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Strict-mode repair left error-severity violations unresolved.
    #[error("unrepairable: {residual} error-severity violation(s) survived {passes} repair pass(es)")]
    Unrepairable { residual: usize, passes: usize },
}

/// Result type alias for FlowShield operations.
pub type Result<T> = std::result::Result<T, FlowShieldError>;
