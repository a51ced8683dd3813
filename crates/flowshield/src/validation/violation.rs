//! Violation type: the unit of the validation audit trail.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::rules::Severity;

/// A detected failure of a constraint or relation rule.
///
/// Immutable once produced; violations are always collected, never thrown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Stable identifier of the failed rule or check.
    pub rule_id: String,
    /// Severity level.
    pub severity: Severity,
    /// Affected row, or `None` for schema-wide findings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_index: Option<usize>,
    /// Affected column(s).
    pub columns: Vec<String>,
    /// Human-readable description.
    pub message: String,
    /// The offending value(s).
    pub observed: JsonValue,
}

impl Violation {
    /// Create a new violation.
    pub fn new(
        rule_id: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            severity,
            row_index: None,
            columns: Vec::new(),
            message: message.into(),
            observed: JsonValue::Null,
        }
    }

    /// Set the affected row.
    pub fn at_row(mut self, row: usize) -> Self {
        self.row_index = Some(row);
        self
    }

    /// Set the affected columns.
    pub fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.columns = columns;
        self
    }

    /// Set the observed value.
    pub fn with_observed(mut self, observed: JsonValue) -> Self {
        self.observed = observed;
        self
    }

    /// Returns true for error-severity violations.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder() {
        let v = Violation::new("range_check", Severity::Error, "'packets' below minimum")
            .at_row(7)
            .with_columns(vec!["packets".into()])
            .with_observed(json!(-5));

        assert_eq!(v.row_index, Some(7));
        assert!(v.is_error());
        assert_eq!(v.columns, vec!["packets".to_string()]);
    }
}
