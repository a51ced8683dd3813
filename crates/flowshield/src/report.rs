//! Report assembler: aggregates violations and repairs into a structured
//! summary for the external CLI/report-rendering layers.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::dataset::{Dataset, Value};
use crate::repair::RepairOutcome;
use crate::rules::Severity;
use crate::schema::Schema;
use crate::validation::Violation;

/// Counts of violations by severity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub error: usize,
    pub warning: usize,
}

impl SeverityCounts {
    fn tally(violations: &[Violation]) -> Self {
        let mut counts = Self::default();
        for v in violations {
            match v.severity {
                Severity::Error => counts.error += 1,
                Severity::Warning => counts.warning += 1,
            }
        }
        counts
    }
}

/// Summary statistics for one column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnStats {
    /// Total number of values.
    pub count: usize,
    /// Number of null/missing values.
    pub null_count: usize,
    /// Minimum observed numeric value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Maximum observed numeric value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Mean of observed numeric values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
}

impl ColumnStats {
    /// Compute stats for one dataset column.
    pub fn compute(dataset: &Dataset, column: &str) -> Self {
        let Some(col_idx) = dataset.column_index(column) else {
            return Self {
                count: 0,
                null_count: 0,
                min: None,
                max: None,
                mean: None,
            };
        };

        let count = dataset.row_count();
        let mut null_count = 0;
        let mut numerics = Vec::new();
        for row_idx in 0..count {
            match dataset.get(row_idx, col_idx) {
                Some(v) if v.is_null() => null_count += 1,
                Some(v) => {
                    if let Some(n) = v.numeric() {
                        numerics.push(n);
                    }
                }
                None => null_count += 1,
            }
        }

        let (min, max, mean) = if numerics.is_empty() {
            (None, None, None)
        } else {
            let min = numerics.iter().copied().fold(f64::INFINITY, f64::min);
            let max = numerics.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let mean = numerics.iter().sum::<f64>() / numerics.len() as f64;
            (Some(min), Some(max), Some(mean))
        };

        Self {
            count,
            null_count,
            min,
            max,
            mean,
        }
    }
}

/// Before/after statistics for one column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub column: String,
    pub before: ColumnStats,
    /// Present only for repair reports.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<ColumnStats>,
}

/// Structured summary of a validation or repair run.
///
/// The external CLI layer maps `has_blocking_errors` to process exit status
/// (exit code 2 is reserved for error-severity findings on the validate
/// path); the engine only exposes the flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Rows examined.
    pub total_rows: usize,
    /// Violation counts by severity.
    pub violations_by_severity: SeverityCounts,
    /// Violation counts keyed by rule id, in first-seen order.
    pub violations_by_rule: IndexMap<String, usize>,
    /// Repair counts keyed by column, in first-seen order.
    pub repairs_by_column: IndexMap<String, usize>,
    /// Total number of cell mutations.
    pub total_repairs: usize,
    /// Counts of violations that survived repair.
    pub unresolved_by_severity: SeverityCounts,
    /// Per-column before/after statistics.
    pub columns: Vec<ColumnSummary>,
    /// True when error-severity findings should block downstream use.
    pub has_blocking_errors: bool,
}

impl Report {
    /// Assemble a report for a validation-only run.
    pub fn from_validation(violations: &[Violation], dataset: &Dataset, schema: &Schema) -> Self {
        Self {
            total_rows: dataset.row_count(),
            violations_by_severity: SeverityCounts::tally(violations),
            violations_by_rule: count_by_rule(violations),
            repairs_by_column: IndexMap::new(),
            total_repairs: 0,
            unresolved_by_severity: SeverityCounts::default(),
            columns: column_summaries(dataset, None, schema),
            has_blocking_errors: violations.iter().any(Violation::is_error),
        }
    }

    /// Assemble a report for a repair run.
    ///
    /// `violations` are the pre-repair findings; blocking status is judged
    /// on what survived repair, not on what repair fixed.
    pub fn from_repair(
        violations: &[Violation],
        outcome: &RepairOutcome,
        original: &Dataset,
        schema: &Schema,
    ) -> Self {
        let mut repairs_by_column: IndexMap<String, usize> = IndexMap::new();
        for record in &outcome.records {
            *repairs_by_column.entry(record.column.clone()).or_insert(0) += 1;
        }

        Self {
            total_rows: original.row_count(),
            violations_by_severity: SeverityCounts::tally(violations),
            violations_by_rule: count_by_rule(violations),
            repairs_by_column,
            total_repairs: outcome.records.len(),
            unresolved_by_severity: SeverityCounts::tally(&outcome.unresolved),
            columns: column_summaries(original, Some(&outcome.dataset), schema),
            has_blocking_errors: outcome.unresolved.iter().any(Violation::is_error),
        }
    }
}

fn count_by_rule(violations: &[Violation]) -> IndexMap<String, usize> {
    let mut counts = IndexMap::new();
    for v in violations {
        *counts.entry(v.rule_id.clone()).or_insert(0) += 1;
    }
    counts
}

fn column_summaries(
    before: &Dataset,
    after: Option<&Dataset>,
    schema: &Schema,
) -> Vec<ColumnSummary> {
    schema
        .columns()
        .map(|spec| ColumnSummary {
            column: spec.name.clone(),
            before: ColumnStats::compute(before, &spec.name),
            after: after.map(|d| ColumnStats::compute(d, &spec.name)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnSpec, Dtype};

    fn sample() -> (Dataset, Schema) {
        let schema = Schema::new(vec![
            ColumnSpec::new("bytes", Dtype::Integer).with_range(Some(0.0), None),
        ])
        .unwrap();
        let data = Dataset::new(
            vec!["bytes".into()],
            vec![
                vec![Value::Int(10)],
                vec![Value::Null],
                vec![Value::Int(30)],
            ],
        );
        (data, schema)
    }

    #[test]
    fn test_column_stats() {
        let (data, _) = sample();
        let stats = ColumnStats::compute(&data, "bytes");
        assert_eq!(stats.count, 3);
        assert_eq!(stats.null_count, 1);
        assert_eq!(stats.min, Some(10.0));
        assert_eq!(stats.max, Some(30.0));
        assert_eq!(stats.mean, Some(20.0));
    }

    #[test]
    fn test_validation_report_blocking() {
        let (data, schema) = sample();
        let violations = vec![
            Violation::new("range_check", Severity::Error, "below minimum").at_row(0),
            Violation::new("byte_order", Severity::Warning, "out of order").at_row(1),
        ];

        let report = Report::from_validation(&violations, &data, &schema);
        assert!(report.has_blocking_errors);
        assert_eq!(report.violations_by_severity.error, 1);
        assert_eq!(report.violations_by_severity.warning, 1);
        assert_eq!(report.violations_by_rule["range_check"], 1);

        let warn_only = Report::from_validation(&violations[1..], &data, &schema);
        assert!(!warn_only.has_blocking_errors);
    }
}
