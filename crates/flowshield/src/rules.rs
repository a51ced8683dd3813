//! Rule model: column constraints and cross-column relation rules.
//!
//! Rules are pure functions of row state plus schema, so validation is
//! reproducible given the same dataset + schema + profile triple. Relation
//! rules whose referenced value is missing or non-numeric do not fire; null
//! handling belongs to the per-column pass.

use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};

use crate::dataset::RowView;
use crate::schema::Dtype;

/// Comparison slack for floating-point relation checks.
///
/// Also the floor applied to `SumBound` tolerances, so that rounding noise
/// introduced by a repair cannot re-trigger the rule it just satisfied.
pub const RELATION_EPSILON: f64 = 1e-9;

/// Tolerance when deciding whether a float carries a fractional part.
///
/// Validation and repair share this value, so repair never coerces a cell
/// that validation accepted as integral.
pub(crate) const INTEGER_TOLERANCE: f64 = 1e-6;

/// Severity level of a violated rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Potential issue that should be reviewed.
    Warning,
    /// Definite issue that blocks downstream use.
    Error,
}

impl Severity {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Warning => "Warning",
            Severity::Error => "Error",
        }
    }
}

/// Comparison operator for a `SumBound` rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundOp {
    /// Sum must be at most the bound.
    Le,
    /// Sum must be at least the bound.
    Ge,
    /// Sum must equal the bound (within tolerance).
    Eq,
}

/// Comparison operator for an `OrderRelation` rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderOp {
    Le,
    Lt,
    Ge,
    Gt,
}

impl OrderOp {
    /// Symbol for message templates.
    pub fn symbol(&self) -> &'static str {
        match self {
            OrderOp::Le => "<=",
            OrderOp::Lt => "<",
            OrderOp::Ge => ">=",
            OrderOp::Gt => ">",
        }
    }
}

/// Comparison operator for a conditional rule's trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CondOp {
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
}

/// Trigger condition for a `ConditionalExpectation` rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Column whose value is tested.
    pub column: String,
    /// Comparison operator.
    pub op: CondOp,
    /// Value compared against.
    pub value: f64,
}

impl Condition {
    /// Evaluate the trigger on a row. Missing values never trigger.
    pub fn holds(&self, row: &RowView<'_>) -> bool {
        let Some(observed) = row.numeric(&self.column) else {
            return false;
        };
        match self.op {
            CondOp::Eq => (observed - self.value).abs() <= RELATION_EPSILON,
            CondOp::Lt => observed < self.value,
            CondOp::Le => observed <= self.value,
            CondOp::Gt => observed > self.value,
            CondOp::Ge => observed >= self.value,
        }
    }
}

/// A single-column constraint.
///
/// The validation engine derives implicit constraints from the schema; a
/// profile may carry additional explicit ones to tighten a column beyond its
/// schema spec (e.g. a narrower range, or `NotNull` on a nullable column).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    /// Column the constraint applies to.
    pub column: String,
    /// What is being constrained.
    pub kind: ConstraintKind,
    /// Severity of a violation.
    pub severity: Severity,
}

/// The closed set of single-column constraint kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConstraintKind {
    /// Numeric values must lie in a range.
    Range { min: Option<f64>, max: Option<f64> },
    /// Values must not be null.
    NotNull,
    /// Values must be coercible to the given dtype.
    Dtype(Dtype),
    /// Values must be one of the given labels.
    Category(Vec<String>),
}

impl Constraint {
    /// Evaluate the constraint against a cell value.
    pub fn holds(&self, value: &crate::dataset::Value) -> bool {
        match &self.kind {
            ConstraintKind::NotNull => !value.is_null(),
            ConstraintKind::Range { min, max } => {
                if value.is_null() {
                    return true;
                }
                match value.numeric() {
                    Some(n) => {
                        !min.is_some_and(|m| n < m) && !max.is_some_and(|m| n > m)
                    }
                    None => true,
                }
            }
            ConstraintKind::Dtype(dtype) => {
                if value.is_null() {
                    return true;
                }
                match dtype {
                    Dtype::Integer => value
                        .numeric()
                        .is_some_and(|n| (n - n.round()).abs() <= INTEGER_TOLERANCE),
                    Dtype::Float => value.numeric().is_some(),
                    Dtype::Categorical => matches!(value, crate::dataset::Value::Text(_)),
                }
            }
            ConstraintKind::Category(labels) => match value {
                crate::dataset::Value::Text(s) => labels.iter().any(|l| l == s),
                v if v.is_null() => true,
                _ => false,
            },
        }
    }

    /// Human-readable description of the expectation.
    pub fn describe(&self) -> String {
        match &self.kind {
            ConstraintKind::Range { min, max } => format!(
                "'{}' must be in [{}, {}]",
                self.column,
                min.map_or("-inf".to_string(), |m| m.to_string()),
                max.map_or("inf".to_string(), |m| m.to_string()),
            ),
            ConstraintKind::NotNull => format!("'{}' must not be null", self.column),
            ConstraintKind::Dtype(dtype) => {
                format!("'{}' must be of type {dtype:?}", self.column)
            }
            ConstraintKind::Category(labels) => {
                format!("'{}' must be one of {labels:?}", self.column)
            }
        }
    }
}

/// A cross-column relation rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationRule {
    /// Stable identifier, reported with every violation.
    pub id: String,
    /// Severity of a violation.
    pub severity: Severity,
    /// The relation itself.
    pub kind: RelationKind,
}

/// The closed set of relation rule kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelationKind {
    /// Sum of columns compared against a bound.
    SumBound {
        columns: Vec<String>,
        op: BoundOp,
        bound: f64,
        #[serde(default)]
        tolerance: f64,
    },
    /// Two columns in a fixed order.
    OrderRelation {
        lhs: String,
        rhs: String,
        op: OrderOp,
    },
    /// Ratio of two columns within bounds.
    RatioBound {
        numerator: String,
        denominator: String,
        min_ratio: f64,
        max_ratio: f64,
    },
    /// A constraint that only applies when a trigger condition holds.
    ConditionalExpectation {
        condition: Condition,
        then: Constraint,
    },
    /// Non-decreasing ordering over a percentile group.
    ///
    /// Expanded at profile-load time into one `OrderRelation` per
    /// consecutive rank pair; the engines never see this variant.
    NonDecreasingGroup { group: String },
}

impl RelationRule {
    /// Create a relation rule.
    pub fn new(id: impl Into<String>, severity: Severity, kind: RelationKind) -> Self {
        Self {
            id: id.into(),
            severity,
            kind,
        }
    }

    /// Columns this rule reads or writes.
    pub fn columns(&self) -> Vec<&str> {
        match &self.kind {
            RelationKind::SumBound { columns, .. } => {
                columns.iter().map(|c| c.as_str()).collect()
            }
            RelationKind::OrderRelation { lhs, rhs, .. } => vec![lhs, rhs],
            RelationKind::RatioBound {
                numerator,
                denominator,
                ..
            } => vec![numerator, denominator],
            RelationKind::ConditionalExpectation { condition, then } => {
                vec![condition.column.as_str(), then.column.as_str()]
            }
            RelationKind::NonDecreasingGroup { .. } => Vec::new(),
        }
    }

    /// Evaluate the rule on a row.
    ///
    /// Returns true when the relation is satisfied or does not apply
    /// (missing values, condition not triggered).
    pub fn holds(&self, row: &RowView<'_>) -> bool {
        match &self.kind {
            RelationKind::SumBound {
                columns,
                op,
                bound,
                tolerance,
            } => {
                let Some(sum) = sum_of(row, columns) else {
                    return true;
                };
                let tol = tolerance.max(RELATION_EPSILON);
                match op {
                    BoundOp::Le => sum <= bound + tol,
                    BoundOp::Ge => sum >= bound - tol,
                    BoundOp::Eq => (sum - bound).abs() <= tol,
                }
            }
            RelationKind::OrderRelation { lhs, rhs, op } => {
                let (Some(lv), Some(rv)) = (row.numeric(lhs), row.numeric(rhs)) else {
                    return true;
                };
                match op {
                    OrderOp::Le => lv <= rv + RELATION_EPSILON,
                    OrderOp::Lt => lv < rv,
                    OrderOp::Ge => lv >= rv - RELATION_EPSILON,
                    OrderOp::Gt => lv > rv,
                }
            }
            RelationKind::RatioBound {
                numerator,
                denominator,
                min_ratio,
                max_ratio,
            } => {
                let (Some(n), Some(d)) = (row.numeric(numerator), row.numeric(denominator))
                else {
                    return true;
                };
                if d == 0.0 {
                    // Undefined ratio; the denominator's own range constraint
                    // is the place to forbid zeros.
                    return true;
                }
                let ratio = n / d;
                ratio >= min_ratio - RELATION_EPSILON && ratio <= max_ratio + RELATION_EPSILON
            }
            RelationKind::ConditionalExpectation { condition, then } => {
                if !condition.holds(row) {
                    return true;
                }
                match row.value(&then.column) {
                    Some(value) => then.holds(value),
                    None => true,
                }
            }
            // Expanded at profile load; nothing to evaluate here.
            RelationKind::NonDecreasingGroup { .. } => true,
        }
    }

    /// Human-readable message template for violations.
    pub fn describe(&self) -> String {
        match &self.kind {
            RelationKind::SumBound {
                columns, op, bound, ..
            } => {
                let sum = columns.join(" + ");
                match op {
                    BoundOp::Le => format!("sum({sum}) must be <= {bound}"),
                    BoundOp::Ge => format!("sum({sum}) must be >= {bound}"),
                    BoundOp::Eq => format!("sum({sum}) must equal {bound}"),
                }
            }
            RelationKind::OrderRelation { lhs, rhs, op } => {
                format!("'{lhs}' must be {} '{rhs}'", op.symbol())
            }
            RelationKind::RatioBound {
                numerator,
                denominator,
                min_ratio,
                max_ratio,
            } => format!(
                "'{numerator}' / '{denominator}' must be in [{min_ratio}, {max_ratio}]"
            ),
            RelationKind::ConditionalExpectation { condition, then } => format!(
                "when '{}' {} {}: {}",
                condition.column,
                match condition.op {
                    CondOp::Eq => "==",
                    CondOp::Lt => "<",
                    CondOp::Le => "<=",
                    CondOp::Gt => ">",
                    CondOp::Ge => ">=",
                },
                condition.value,
                then.describe(),
            ),
            RelationKind::NonDecreasingGroup { group } => {
                format!("percentile group '{group}' must be non-decreasing")
            }
        }
    }

    /// Observed values for the violation audit trail.
    pub fn observed(&self, row: &RowView<'_>) -> JsonValue {
        match &self.kind {
            RelationKind::SumBound { columns, .. } => {
                json!({ "sum": sum_of(row, columns) })
            }
            RelationKind::OrderRelation { lhs, rhs, .. } => {
                json!({ lhs.as_str(): row.numeric(lhs), rhs.as_str(): row.numeric(rhs) })
            }
            RelationKind::RatioBound {
                numerator,
                denominator,
                ..
            } => {
                let ratio = match (row.numeric(numerator), row.numeric(denominator)) {
                    (Some(n), Some(d)) if d != 0.0 => Some(n / d),
                    _ => None,
                };
                json!({ "ratio": ratio })
            }
            RelationKind::ConditionalExpectation { then, .. } => {
                json!({ then.column.as_str(): row.numeric(&then.column) })
            }
            RelationKind::NonDecreasingGroup { .. } => JsonValue::Null,
        }
    }
}

/// Sum of the named columns on a row, skipping missing values.
///
/// Returns `None` only when every referenced value is missing.
pub(crate) fn sum_of(row: &RowView<'_>, columns: &[String]) -> Option<f64> {
    let mut sum = 0.0;
    let mut seen = false;
    for column in columns {
        if let Some(v) = row.numeric(column) {
            sum += v;
            seen = true;
        }
    }
    seen.then_some(sum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Dataset, Value};

    fn row_of(columns: &[&str], values: Vec<Value>) -> Dataset {
        Dataset::new(columns.iter().map(|c| c.to_string()).collect(), vec![values])
    }

    #[test]
    fn test_order_relation() {
        let data = row_of(&["p50", "p95"], vec![Value::Float(80.0), Value::Float(50.0)]);
        let rule = RelationRule::new(
            "percentile_order",
            Severity::Error,
            RelationKind::OrderRelation {
                lhs: "p50".into(),
                rhs: "p95".into(),
                op: OrderOp::Le,
            },
        );
        assert!(!rule.holds(&data.row(0)));

        let ok = row_of(&["p50", "p95"], vec![Value::Float(40.0), Value::Float(50.0)]);
        assert!(rule.holds(&ok.row(0)));
    }

    #[test]
    fn test_order_skips_missing() {
        let data = row_of(&["p50", "p95"], vec![Value::Null, Value::Float(50.0)]);
        let rule = RelationRule::new(
            "percentile_order",
            Severity::Error,
            RelationKind::OrderRelation {
                lhs: "p50".into(),
                rhs: "p95".into(),
                op: OrderOp::Le,
            },
        );
        assert!(rule.holds(&data.row(0)));
    }

    #[test]
    fn test_sum_bound() {
        let data = row_of(
            &["http_bytes", "other_bytes"],
            vec![Value::Int(600), Value::Int(500)],
        );
        let rule = RelationRule::new(
            "byte_split",
            Severity::Warning,
            RelationKind::SumBound {
                columns: vec!["http_bytes".into(), "other_bytes".into()],
                op: BoundOp::Le,
                bound: 1000.0,
                tolerance: 0.0,
            },
        );
        assert!(!rule.holds(&data.row(0)));
    }

    #[test]
    fn test_ratio_bound_zero_denominator_skipped() {
        let data = row_of(&["http", "total"], vec![Value::Int(5), Value::Int(0)]);
        let rule = RelationRule::new(
            "http_share",
            Severity::Warning,
            RelationKind::RatioBound {
                numerator: "http".into(),
                denominator: "total".into(),
                min_ratio: 0.0,
                max_ratio: 1.0,
            },
        );
        assert!(rule.holds(&data.row(0)));
    }

    #[test]
    fn test_conditional_fires_only_when_triggered() {
        let rule = RelationRule::new(
            "active_flow_bytes",
            Severity::Warning,
            RelationKind::ConditionalExpectation {
                condition: Condition {
                    column: "duration".into(),
                    op: CondOp::Gt,
                    value: 0.0,
                },
                then: Constraint {
                    column: "bytes".into(),
                    kind: ConstraintKind::Range {
                        min: Some(1.0),
                        max: None,
                    },
                    severity: Severity::Warning,
                },
            },
        );

        let triggered = row_of(&["duration", "bytes"], vec![Value::Float(2.0), Value::Int(0)]);
        assert!(!rule.holds(&triggered.row(0)));

        let dormant = row_of(&["duration", "bytes"], vec![Value::Float(0.0), Value::Int(0)]);
        assert!(rule.holds(&dormant.row(0)));
    }

    #[test]
    fn test_constraint_category() {
        let constraint = Constraint {
            column: "proto".into(),
            kind: ConstraintKind::Category(vec!["tcp".into(), "udp".into()]),
            severity: Severity::Error,
        };
        assert!(constraint.holds(&Value::Text("tcp".into())));
        assert!(!constraint.holds(&Value::Text("icmp".into())));
        assert!(constraint.holds(&Value::Null));
    }
}
