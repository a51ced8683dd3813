//! Validation engine: evaluates all checks against a dataset snapshot.

use serde_json::json;

use crate::dataset::{Dataset, Value};
use crate::error::{FlowShieldError, Result};
use crate::profile::Profile;
use crate::rules::{ConstraintKind, INTEGER_TOLERANCE, Severity};
use crate::schema::{ColumnSpec, Dtype, Schema};

use super::violation::Violation;

/// Deterministic, side-effect-free evaluation of schema checks, profile
/// constraints, and relation rules over a dataset snapshot.
#[derive(Debug, Default)]
pub struct ValidationEngine {
    sample_limit: Option<usize>,
}

impl ValidationEngine {
    /// Create a new validation engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the number of rows examined per run; rows past the cap are not
    /// validated. Useful for a quick look at a large export.
    pub fn with_sample_limit(mut self, limit: usize) -> Self {
        self.sample_limit = Some(limit);
        self
    }

    /// Validate a dataset against a schema and profile.
    ///
    /// Violations come back in a stable order, row index ascending and then
    /// rule declaration order, which downstream repair and reporting rely
    /// on. Fails with [`FlowShieldError::SchemaMismatch`] before any row is
    /// examined when the dataset is missing a declared column, carries a
    /// ragged row, or (in strict mode) carries undeclared columns.
    pub fn validate(
        &self,
        dataset: &Dataset,
        schema: &Schema,
        profile: &Profile,
    ) -> Result<Vec<Violation>> {
        self.check_columns(dataset, schema, profile)?;

        let row_cap = self
            .sample_limit
            .map_or(dataset.row_count(), |limit| limit.min(dataset.row_count()));

        let mut violations = Vec::new();
        for row_idx in 0..row_cap {
            for spec in schema.columns() {
                // Presence guaranteed by the structural check above.
                if let Some(value) = dataset.get_named(row_idx, &spec.name) {
                    self.check_cell(row_idx, spec, value, profile, &mut violations);
                }
            }

            for constraint in &profile.constraints {
                if let Some(value) = dataset.get_named(row_idx, &constraint.column) {
                    if !constraint.holds(value) {
                        violations.push(
                            Violation::new(
                                constraint_rule_id(&constraint.column, &constraint.kind),
                                constraint.severity,
                                constraint.describe(),
                            )
                            .at_row(row_idx)
                            .with_columns(vec![constraint.column.clone()])
                            .with_observed(json!(value.to_string())),
                        );
                    }
                }
            }

            let row = dataset.row(row_idx);
            for rule in &profile.relations {
                if !rule.holds(&row) {
                    violations.push(
                        Violation::new(rule.id.clone(), rule.severity, rule.describe())
                            .at_row(row_idx)
                            .with_columns(
                                rule.columns().into_iter().map(String::from).collect(),
                            )
                            .with_observed(rule.observed(&row)),
                    );
                }
            }
        }

        Ok(violations)
    }

    /// Structural check: declared columns must be present and every row must
    /// carry one cell per dataset column; extra columns are ignored with a
    /// log line unless the profile is strict.
    fn check_columns(&self, dataset: &Dataset, schema: &Schema, profile: &Profile) -> Result<()> {
        for name in schema.names() {
            if dataset.column_index(name).is_none() {
                return Err(FlowShieldError::SchemaMismatch(format!(
                    "dataset is missing declared column '{name}'"
                )));
            }
        }

        if let Some((row_idx, row)) = dataset
            .rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != dataset.column_count())
        {
            return Err(FlowShieldError::SchemaMismatch(format!(
                "row {row_idx} has {} cell(s), expected {}",
                row.len(),
                dataset.column_count()
            )));
        }

        let extras: Vec<&str> = dataset
            .columns
            .iter()
            .map(|c| c.as_str())
            .filter(|c| schema.get(c).is_none())
            .collect();
        if !extras.is_empty() {
            if profile.repair.strict {
                return Err(FlowShieldError::SchemaMismatch(format!(
                    "dataset carries undeclared column(s) {extras:?} in strict mode"
                )));
            }
            log::info!("ignoring undeclared dataset column(s): {extras:?}");
        }

        Ok(())
    }

    /// Schema-derived checks for one cell: dtype coercibility, nullability,
    /// range, category membership. Every failing check emits its own
    /// violation; there is no early exit per cell beyond what a failed
    /// dtype check makes meaningless.
    fn check_cell(
        &self,
        row_idx: usize,
        spec: &ColumnSpec,
        value: &Value,
        profile: &Profile,
        out: &mut Vec<Violation>,
    ) {
        if value.is_null() {
            if !spec.nullable || profile.repair.strict {
                out.push(
                    Violation::new(
                        "null_check",
                        Severity::Error,
                        format!("'{}' does not allow nulls", spec.name),
                    )
                    .at_row(row_idx)
                    .with_columns(vec![spec.name.clone()]),
                );
            }
            return;
        }

        match spec.dtype {
            Dtype::Integer | Dtype::Float => {
                let Some(numeric) = value.numeric() else {
                    out.push(
                        Violation::new(
                            "type_check",
                            Severity::Error,
                            format!("'{}' value is not numeric", spec.name),
                        )
                        .at_row(row_idx)
                        .with_columns(vec![spec.name.clone()])
                        .with_observed(json!(value.to_string())),
                    );
                    return;
                };

                // Parseable text is repairable but still the wrong storage
                // type for a numeric column.
                if matches!(value, Value::Text(_)) {
                    out.push(
                        Violation::new(
                            "type_check",
                            Severity::Error,
                            format!("'{}' numeric value stored as text", spec.name),
                        )
                        .at_row(row_idx)
                        .with_columns(vec![spec.name.clone()])
                        .with_observed(json!(value.to_string())),
                    );
                }

                if spec.dtype == Dtype::Integer
                    && (numeric - numeric.round()).abs() > INTEGER_TOLERANCE
                {
                    out.push(
                        Violation::new(
                            "integer_check",
                            Severity::Error,
                            format!("'{}' requires integer values", spec.name),
                        )
                        .at_row(row_idx)
                        .with_columns(vec![spec.name.clone()])
                        .with_observed(json!(numeric)),
                    );
                }

                if let Some(min) = spec.min.filter(|m| numeric < *m) {
                    out.push(
                        Violation::new(
                            "range_check",
                            Severity::Error,
                            format!("'{}' below minimum {min}", spec.name),
                        )
                        .at_row(row_idx)
                        .with_columns(vec![spec.name.clone()])
                        .with_observed(json!(numeric)),
                    );
                }
                if let Some(max) = spec.max.filter(|m| numeric > *m) {
                    out.push(
                        Violation::new(
                            "range_check",
                            Severity::Error,
                            format!("'{}' above maximum {max}", spec.name),
                        )
                        .at_row(row_idx)
                        .with_columns(vec![spec.name.clone()])
                        .with_observed(json!(numeric)),
                    );
                }
            }
            Dtype::Categorical => {
                let Value::Text(label) = value else {
                    out.push(
                        Violation::new(
                            "type_check",
                            Severity::Error,
                            format!("'{}' categorical value must be text", spec.name),
                        )
                        .at_row(row_idx)
                        .with_columns(vec![spec.name.clone()])
                        .with_observed(json!(value.to_string())),
                    );
                    return;
                };
                if let Some(ref categories) = spec.categories {
                    if !categories.iter().any(|c| c == label) {
                        out.push(
                            Violation::new(
                                "category_check",
                                Severity::Error,
                                format!("unexpected category for '{}'", spec.name),
                            )
                            .at_row(row_idx)
                            .with_columns(vec![spec.name.clone()])
                            .with_observed(json!(label)),
                        );
                    }
                }
            }
        }
    }
}

/// Stable rule id for an explicit profile constraint.
fn constraint_rule_id(column: &str, kind: &ConstraintKind) -> String {
    let tag = match kind {
        ConstraintKind::Range { .. } => "range",
        ConstraintKind::NotNull => "not_null",
        ConstraintKind::Dtype(_) => "dtype",
        ConstraintKind::Category(_) => "category",
    };
    format!("constraint:{column}:{tag}")
}
