//! Constraint profiles: rule bundles plus repair-strategy parameters.

use serde::{Deserialize, Serialize};

use crate::error::{FlowShieldError, Result};
use crate::rules::{Constraint, OrderOp, RelationKind, RelationRule};
use crate::schema::Schema;

/// How null numeric cells are filled during repair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputeStrategy {
    /// Column-wise median of currently-valid values.
    Median,
    /// Column-wise mean of currently-valid values.
    Mean,
    /// Constant zero.
    Zero,
    /// Mark the whole row for removal (deferred to end of all passes).
    DropRow,
}

/// How out-of-range values are clipped during repair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipMode {
    /// Clip immediately, before relation repair.
    Hard,
    /// Clip after relation repair within the same pass, so relation
    /// adjustments get the first chance to move the value.
    Soft,
}

/// Repair-strategy parameters carried by a profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RepairConfig {
    /// Null-fill strategy for numeric columns.
    pub impute: ImputeStrategy,
    /// Range clipping behavior.
    pub clip_mode: ClipMode,
    /// Strict mode: nulls rejected regardless of schema, extra dataset
    /// columns rejected, and residual error violations after repair are
    /// fatal.
    pub strict: bool,
    /// Hard upper bound on repair pass cycles.
    pub max_passes: usize,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            impute: ImputeStrategy::Median,
            clip_mode: ClipMode::Hard,
            strict: false,
            max_passes: 4,
        }
    }
}

/// A named bundle of constraints, relation rules, and repair parameters.
///
/// Immutable once constructed. Built-in preset names (`flow_safe`,
/// `strict_flow`, `telemetry_noisy`) are external configuration data; the
/// engine treats every profile opaquely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Profile name, for reports.
    pub name: String,
    /// Explicit column constraints tightening the schema.
    pub constraints: Vec<Constraint>,
    /// Cross-column relation rules, with percentile groups already expanded.
    pub relations: Vec<RelationRule>,
    /// Repair-strategy parameters.
    pub repair: RepairConfig,
}

impl Profile {
    /// Build a profile against a schema, checking load-time invariants.
    ///
    /// `NonDecreasingGroup` rules are expanded here into one
    /// `OrderRelation` per consecutive rank pair. Fails with
    /// [`FlowShieldError::Profile`] when `max_passes` is zero, when a strict
    /// profile selects `DropRow` imputation (a strict run must never
    /// silently drop a row), when a group has fewer than two members, or
    /// when a rule references a column the schema does not declare.
    pub fn new(
        name: impl Into<String>,
        constraints: Vec<Constraint>,
        relations: Vec<RelationRule>,
        repair: RepairConfig,
        schema: &Schema,
    ) -> Result<Self> {
        if repair.max_passes == 0 {
            return Err(FlowShieldError::Profile(
                "max_passes must be at least 1".to_string(),
            ));
        }
        if repair.strict && repair.impute == ImputeStrategy::DropRow {
            return Err(FlowShieldError::Profile(
                "strict profiles may not use drop_row imputation".to_string(),
            ));
        }

        for constraint in &constraints {
            if schema.get(&constraint.column).is_none() {
                return Err(FlowShieldError::Profile(format!(
                    "constraint references unknown column '{}'",
                    constraint.column
                )));
            }
        }

        let mut expanded = Vec::with_capacity(relations.len());
        for rule in relations {
            match rule.kind {
                RelationKind::NonDecreasingGroup { ref group } => {
                    expanded.extend(expand_group(&rule, group, schema)?);
                }
                _ => {
                    for column in rule.columns() {
                        if schema.get(column).is_none() {
                            return Err(FlowShieldError::Profile(format!(
                                "rule '{}' references unknown column '{column}'",
                                rule.id
                            )));
                        }
                    }
                    expanded.push(rule);
                }
            }
        }

        Ok(Self {
            name: name.into(),
            constraints,
            relations: expanded,
            repair,
        })
    }
}

/// Expand a `NonDecreasingGroup` rule into pairwise order relations.
fn expand_group(rule: &RelationRule, group: &str, schema: &Schema) -> Result<Vec<RelationRule>> {
    let groups = schema.percentile_groups();
    let members = groups.get(group).map(Vec::as_slice).unwrap_or_default();
    if members.len() < 2 {
        return Err(FlowShieldError::Profile(format!(
            "rule '{}': percentile group '{group}' has {} member(s), need at least 2",
            rule.id,
            members.len()
        )));
    }

    Ok(members
        .windows(2)
        .map(|pair| {
            RelationRule::new(
                format!("{}:{}..{}", rule.id, pair[0].name, pair[1].name),
                rule.severity,
                RelationKind::OrderRelation {
                    lhs: pair[0].name.clone(),
                    rhs: pair[1].name.clone(),
                    op: OrderOp::Le,
                },
            )
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Severity;
    use crate::schema::{ColumnSpec, Dtype};

    fn latency_schema() -> Schema {
        Schema::new(vec![
            ColumnSpec::new("p50", Dtype::Float).with_percentile("latency", 1),
            ColumnSpec::new("p95", Dtype::Float).with_percentile("latency", 2),
            ColumnSpec::new("p99", Dtype::Float).with_percentile("latency", 3),
        ])
        .unwrap()
    }

    fn group_rule(group: &str) -> RelationRule {
        RelationRule::new(
            "percentile_order",
            Severity::Error,
            RelationKind::NonDecreasingGroup {
                group: group.into(),
            },
        )
    }

    #[test]
    fn test_group_expansion() {
        let schema = latency_schema();
        let profile = Profile::new(
            "test",
            Vec::new(),
            vec![group_rule("latency")],
            RepairConfig::default(),
            &schema,
        )
        .unwrap();

        assert_eq!(profile.relations.len(), 2);
        assert_eq!(profile.relations[0].id, "percentile_order:p50..p95");
        assert_eq!(profile.relations[1].id, "percentile_order:p95..p99");
        assert!(matches!(
            profile.relations[0].kind,
            RelationKind::OrderRelation { op: OrderOp::Le, .. }
        ));
    }

    #[test]
    fn test_undersized_group_rejected() {
        let schema = Schema::new(vec![
            ColumnSpec::new("p50", Dtype::Float).with_percentile("latency", 1),
        ])
        .unwrap();
        let result = Profile::new(
            "test",
            Vec::new(),
            vec![group_rule("latency")],
            RepairConfig::default(),
            &schema,
        );
        assert!(matches!(result, Err(FlowShieldError::Profile(_))));
    }

    #[test]
    fn test_unknown_group_rejected() {
        let schema = latency_schema();
        let result = Profile::new(
            "test",
            Vec::new(),
            vec![group_rule("throughput")],
            RepairConfig::default(),
            &schema,
        );
        assert!(matches!(result, Err(FlowShieldError::Profile(_))));
    }

    #[test]
    fn test_strict_drop_row_rejected() {
        let schema = latency_schema();
        let repair = RepairConfig {
            impute: ImputeStrategy::DropRow,
            strict: true,
            ..RepairConfig::default()
        };
        let result = Profile::new("test", Vec::new(), Vec::new(), repair, &schema);
        assert!(matches!(result, Err(FlowShieldError::Profile(_))));
    }

    #[test]
    fn test_zero_passes_rejected() {
        let schema = latency_schema();
        let repair = RepairConfig {
            max_passes: 0,
            ..RepairConfig::default()
        };
        let result = Profile::new("test", Vec::new(), Vec::new(), repair, &schema);
        assert!(matches!(result, Err(FlowShieldError::Profile(_))));
    }

    #[test]
    fn test_unknown_rule_column_rejected() {
        let schema = latency_schema();
        let rule = RelationRule::new(
            "order",
            Severity::Warning,
            RelationKind::OrderRelation {
                lhs: "p50".into(),
                rhs: "p75".into(),
                op: OrderOp::Le,
            },
        );
        let result = Profile::new(
            "test",
            Vec::new(),
            vec![rule],
            RepairConfig::default(),
            &schema,
        );
        assert!(matches!(result, Err(FlowShieldError::Profile(_))));
    }
}
