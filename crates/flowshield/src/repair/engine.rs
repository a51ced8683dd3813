//! Repair engine: bounded multi-pass fixed-point repair.
//!
//! Each pass cycle applies three sweeps in order: type/null repair, range
//! clipping, and relation repair. Cycles repeat until one makes no mutation
//! or `max_passes` is reached; whatever still fails validation afterwards is
//! surfaced as unresolved rather than looped on forever.

use std::collections::BTreeSet;

use indexmap::IndexMap;

use crate::dataset::{Dataset, Value};
use crate::error::{FlowShieldError, Result};
use crate::profile::{ClipMode, ImputeStrategy, Profile};
use crate::rules::{
    BoundOp, Condition, Constraint, ConstraintKind, INTEGER_TOLERANCE, OrderOp, RelationKind,
    RelationRule, sum_of,
};
use crate::schema::{ColumnSpec, Dtype, Schema};
use crate::validation::ValidationEngine;

use super::record::{RepairOutcome, RepairRecord};

/// Produces a repaired snapshot plus a full audit trail.
///
/// The input dataset is never mutated; repair operates on a clone and
/// returns it, so the original stays available for diffing.
#[derive(Debug, Default)]
pub struct RepairEngine {
    validator: ValidationEngine,
}

impl RepairEngine {
    /// Create a new repair engine.
    pub fn new() -> Self {
        Self {
            validator: ValidationEngine::new(),
        }
    }

    /// Repair a dataset against a schema and profile.
    ///
    /// Runs validation first, so structural errors surface before any cell
    /// is touched. In strict mode, error-severity violations surviving all
    /// passes fail the whole run with [`FlowShieldError::Unrepairable`]
    /// instead of being returned as unresolved.
    pub fn repair(
        &self,
        dataset: &Dataset,
        schema: &Schema,
        profile: &Profile,
    ) -> Result<RepairOutcome> {
        let initial = self.validator.validate(dataset, schema, profile)?;
        log::debug!(
            "repair starting: {} violation(s), up to {} pass(es)",
            initial.len(),
            profile.repair.max_passes
        );

        let mut working = dataset.clone();
        let mut records: Vec<RepairRecord> = Vec::new();
        let mut dropped: BTreeSet<usize> = BTreeSet::new();
        let mut passes_run = 0;

        for pass in 1..=profile.repair.max_passes {
            passes_run = pass;
            let before = records.len();

            self.pass_types(&mut working, schema, profile, &mut records, &mut dropped);
            if profile.repair.clip_mode == ClipMode::Hard {
                self.pass_ranges(&mut working, schema, &mut records, &dropped);
            }
            self.pass_relations(&mut working, schema, profile, &mut records, &mut dropped);
            if profile.repair.clip_mode == ClipMode::Soft {
                self.pass_ranges(&mut working, schema, &mut records, &dropped);
            }

            let mutations = records.len() - before;
            log::debug!("pass {pass}: {mutations} mutation(s)");
            if mutations == 0 {
                break;
            }
        }

        // Row removal deferred until here so earlier passes saw stable indices.
        for idx in dropped.iter().rev() {
            working.rows.remove(*idx);
        }

        let unresolved = self.validator.validate(&working, schema, profile)?;
        if profile.repair.strict {
            let residual = unresolved.iter().filter(|v| v.is_error()).count();
            if residual > 0 {
                return Err(FlowShieldError::Unrepairable {
                    residual,
                    passes: passes_run,
                });
            }
        }

        Ok(RepairOutcome {
            dataset: working,
            records,
            unresolved,
            passes_run,
        })
    }

    /// Pass A: coerce coercible values to the declared dtype and fill nulls.
    ///
    /// Impute statistics are computed once over the current snapshot before
    /// any row in this sweep is mutated.
    fn pass_types(
        &self,
        working: &mut Dataset,
        schema: &Schema,
        profile: &Profile,
        records: &mut Vec<RepairRecord>,
        dropped: &mut BTreeSet<usize>,
    ) {
        let stats = ImputeStats::compute(working, schema, dropped);
        let columns = column_positions(working, schema);

        for row_idx in 0..working.row_count() {
            if dropped.contains(&row_idx) {
                continue;
            }
            for &(col_idx, spec) in &columns {
                let value = working.get(row_idx, col_idx).cloned().unwrap_or(Value::Null);

                if value.is_null() {
                    // Allowed nulls are left alone; repairing them would
                    // touch cells that violate nothing.
                    if !spec.nullable || profile.repair.strict {
                        self.fill_null(
                            working, row_idx, col_idx, spec, &value, profile.repair.impute,
                            &stats, "null_check", records, dropped,
                        );
                    }
                    continue;
                }

                match spec.dtype {
                    Dtype::Integer => match value {
                        // Same integrality test validation applies, so cells
                        // validation accepted are never touched.
                        Value::Float(f) if (f - f.round()).abs() > INTEGER_TOLERANCE => {
                            apply(
                                working,
                                records,
                                row_idx,
                                col_idx,
                                spec.name.clone(),
                                "integer_check",
                                value.clone(),
                                Value::Int(f.round() as i64),
                                "rounded to integer",
                            );
                        }
                        Value::Text(ref s) => {
                            if let Ok(n) = s.trim().parse::<f64>() {
                                apply(
                                    working,
                                    records,
                                    row_idx,
                                    col_idx,
                                    spec.name.clone(),
                                    "type_check",
                                    value.clone(),
                                    Value::Int(n.round() as i64),
                                    "coerced text to integer",
                                );
                            }
                        }
                        _ => {}
                    },
                    Dtype::Float => {
                        if let Value::Text(ref s) = value {
                            if let Ok(n) = s.trim().parse::<f64>() {
                                apply(
                                    working,
                                    records,
                                    row_idx,
                                    col_idx,
                                    spec.name.clone(),
                                    "type_check",
                                    value.clone(),
                                    Value::Float(n),
                                    "coerced text to float",
                                );
                            }
                        }
                    }
                    Dtype::Categorical => {
                        if !matches!(value, Value::Text(_)) {
                            apply(
                                working,
                                records,
                                row_idx,
                                col_idx,
                                spec.name.clone(),
                                "type_check",
                                value.clone(),
                                Value::Text(value.to_string()),
                                "coerced to text",
                            );
                        }
                    }
                }
            }
        }
    }

    /// Fill one null cell per the impute strategy.
    #[allow(clippy::too_many_arguments)]
    fn fill_null(
        &self,
        working: &mut Dataset,
        row_idx: usize,
        col_idx: usize,
        spec: &ColumnSpec,
        old: &Value,
        strategy: ImputeStrategy,
        stats: &ImputeStats,
        rule_id: &str,
        records: &mut Vec<RepairRecord>,
        dropped: &mut BTreeSet<usize>,
    ) {
        match strategy {
            ImputeStrategy::DropRow => {
                if dropped.insert(row_idx) {
                    records.push(RepairRecord {
                        row_index: row_idx,
                        column: spec.name.clone(),
                        rule_id: rule_id.to_string(),
                        old_value: old.clone(),
                        new_value: Value::Null,
                        reason: "row marked for removal (drop_row imputation)".to_string(),
                    });
                }
            }
            ImputeStrategy::Zero if spec.dtype.is_numeric() => {
                apply(
                    working,
                    records,
                    row_idx,
                    col_idx,
                    spec.name.clone(),
                    rule_id,
                    old.clone(),
                    typed(0.0, spec.dtype),
                    "imputed zero",
                );
            }
            ImputeStrategy::Median | ImputeStrategy::Mean if spec.dtype.is_numeric() => {
                if let Some(v) = stats.value(&spec.name, strategy) {
                    let reason = match strategy {
                        ImputeStrategy::Median => "imputed column median",
                        _ => "imputed column mean",
                    };
                    apply(
                        working,
                        records,
                        row_idx,
                        col_idx,
                        spec.name.clone(),
                        rule_id,
                        old.clone(),
                        typed(v, spec.dtype),
                        reason,
                    );
                }
                // No valid values to impute from: the null stays and is
                // surfaced as unresolved.
            }
            // Numeric strategies cannot fill categorical nulls.
            _ => {}
        }
    }

    /// Pass B: clip numeric values into their declared `[min, max]` range.
    fn pass_ranges(
        &self,
        working: &mut Dataset,
        schema: &Schema,
        records: &mut Vec<RepairRecord>,
        dropped: &BTreeSet<usize>,
    ) {
        let columns = column_positions(working, schema);

        for row_idx in 0..working.row_count() {
            if dropped.contains(&row_idx) {
                continue;
            }
            for &(col_idx, spec) in &columns {
                if !spec.dtype.is_numeric() {
                    continue;
                }
                let value = working.get(row_idx, col_idx).cloned().unwrap_or(Value::Null);
                let Some(n) = value.numeric() else { continue };

                if let Some(min) = spec.min.filter(|m| n < *m) {
                    apply(
                        working,
                        records,
                        row_idx,
                        col_idx,
                        spec.name.clone(),
                        "range_check",
                        value,
                        typed(min, spec.dtype),
                        "clipped to minimum",
                    );
                } else if let Some(max) = spec.max.filter(|m| n > *m) {
                    apply(
                        working,
                        records,
                        row_idx,
                        col_idx,
                        spec.name.clone(),
                        "range_check",
                        value,
                        typed(max, spec.dtype),
                        "clipped to maximum",
                    );
                }
            }
        }
    }

    /// Pass C: minimal adjustments restoring violated relation rules, in
    /// declaration order, re-reading the row after every mutation.
    fn pass_relations(
        &self,
        working: &mut Dataset,
        schema: &Schema,
        profile: &Profile,
        records: &mut Vec<RepairRecord>,
        dropped: &mut BTreeSet<usize>,
    ) {
        let stats = ImputeStats::compute(working, schema, dropped);

        for row_idx in 0..working.row_count() {
            if dropped.contains(&row_idx) {
                continue;
            }
            for rule in &profile.relations {
                if rule.holds(&working.row(row_idx)) {
                    continue;
                }
                match &rule.kind {
                    RelationKind::OrderRelation { lhs, rhs, op } => {
                        self.repair_order(working, schema, row_idx, rule, lhs, rhs, *op, records);
                    }
                    RelationKind::SumBound {
                        columns,
                        op,
                        bound,
                        tolerance,
                    } => {
                        self.repair_sum(
                            working, schema, row_idx, rule, columns, *op, *bound, *tolerance,
                            records,
                        );
                    }
                    RelationKind::RatioBound {
                        numerator,
                        denominator,
                        min_ratio,
                        max_ratio,
                    } => {
                        self.repair_ratio(
                            working, schema, row_idx, rule, numerator, denominator, *min_ratio,
                            *max_ratio, records,
                        );
                    }
                    RelationKind::ConditionalExpectation { condition, then } => {
                        self.repair_conditional(
                            working, schema, profile, row_idx, rule, condition, then, &stats,
                            records, dropped,
                        );
                    }
                    // Expanded away at profile load.
                    RelationKind::NonDecreasingGroup { .. } => {}
                }
            }
        }
    }

    /// Boundary push for an order relation. Prefers adjusting the rhs (the
    /// later-ranked column); falls back to the lhs when the boundary value
    /// would breach the rhs's own range; gives up (unresolved) when both
    /// sides are blocked.
    #[allow(clippy::too_many_arguments)]
    fn repair_order(
        &self,
        working: &mut Dataset,
        schema: &Schema,
        row_idx: usize,
        rule: &RelationRule,
        lhs: &str,
        rhs: &str,
        op: OrderOp,
        records: &mut Vec<RepairRecord>,
    ) {
        let (Some(lhs_spec), Some(rhs_spec)) = (schema.get(lhs), schema.get(rhs)) else {
            return;
        };
        let row = working.row(row_idx);
        let (Some(lv), Some(rv)) = (row.numeric(lhs), row.numeric(rhs)) else {
            return;
        };

        // Boundary targets that restore the relation with the smallest
        // magnitude change on each side.
        let (rhs_target, lhs_target) = match op {
            OrderOp::Le => (lv, rv),
            OrderOp::Ge => (lv, rv),
            OrderOp::Lt => (step_above(lv, rhs_spec.dtype), step_below(rv, lhs_spec.dtype)),
            OrderOp::Gt => (step_below(lv, rhs_spec.dtype), step_above(rv, lhs_spec.dtype)),
        };

        if rhs_spec.in_range(rhs_target) {
            set_numeric(working, records, row_idx, rhs_spec, rule, rhs_target, "order boundary push");
        } else if lhs_spec.in_range(lhs_target) {
            set_numeric(working, records, row_idx, lhs_spec, rule, lhs_target, "order boundary push");
        }
    }

    /// Proportional redistribution for a violated sum bound.
    ///
    /// The excess or deficit is spread across contributing columns weighted
    /// by current magnitude (uniformly when all contributions are zero),
    /// clamped to each column's own range. When every contributor is an
    /// integer column, largest-remainder rounding makes the repaired sum
    /// hit the bound exactly, ties broken by declaration order.
    #[allow(clippy::too_many_arguments)]
    fn repair_sum(
        &self,
        working: &mut Dataset,
        schema: &Schema,
        row_idx: usize,
        rule: &RelationRule,
        columns: &[String],
        op: BoundOp,
        bound: f64,
        tolerance: f64,
        records: &mut Vec<RepairRecord>,
    ) {
        let row = working.row(row_idx);
        let Some(sum) = sum_of(&row, columns) else {
            return;
        };
        let tol = tolerance.max(crate::rules::RELATION_EPSILON);
        let needs_fix = match op {
            BoundOp::Le => sum > bound + tol,
            BoundOp::Ge => sum < bound - tol,
            BoundOp::Eq => (sum - bound).abs() > tol,
        };
        if !needs_fix {
            return;
        }

        let present: Vec<(&ColumnSpec, f64)> = columns
            .iter()
            .filter_map(|c| {
                let spec = schema.get(c)?;
                let v = row.numeric(c)?;
                Some((spec, v))
            })
            .collect();
        if present.is_empty() {
            return;
        }

        let delta = bound - sum;
        let weight_total: f64 = present.iter().map(|(_, v)| v.abs()).sum();
        let mut targets: Vec<f64> = present
            .iter()
            .map(|(spec, v)| {
                let weight = if weight_total > 0.0 {
                    v.abs() / weight_total
                } else {
                    1.0 / present.len() as f64
                };
                spec.clamp(v + delta * weight)
            })
            .collect();

        let all_integer = present.iter().all(|(spec, _)| spec.dtype == Dtype::Integer);
        if all_integer {
            let bounds: Vec<(Option<f64>, Option<f64>)> =
                present.iter().map(|(spec, _)| (spec.min, spec.max)).collect();
            largest_remainder(&mut targets, bound, &bounds);
        }

        // Column ranges can make the bound unreachable. Applying the partial
        // move would breach a range or oscillate against the clip pass, so
        // the rule stays unresolved instead.
        let repaired: f64 = targets.iter().sum();
        let reachable = match op {
            BoundOp::Le => repaired <= bound + tol,
            BoundOp::Ge => repaired >= bound - tol,
            BoundOp::Eq => (repaired - bound).abs() <= tol,
        };
        if !reachable {
            return;
        }

        for ((spec, _), target) in present.iter().zip(targets) {
            set_numeric(working, records, row_idx, spec, rule, target, "sum redistribution");
        }
    }

    /// Ratio repair: adjust the denominator (preferred) unless the target
    /// breaches its own range, else the numerator. Integer targets round
    /// toward constraint satisfaction.
    #[allow(clippy::too_many_arguments)]
    fn repair_ratio(
        &self,
        working: &mut Dataset,
        schema: &Schema,
        row_idx: usize,
        rule: &RelationRule,
        numerator: &str,
        denominator: &str,
        min_ratio: f64,
        max_ratio: f64,
        records: &mut Vec<RepairRecord>,
    ) {
        let (Some(num_spec), Some(den_spec)) = (schema.get(numerator), schema.get(denominator))
        else {
            return;
        };
        let row = working.row(row_idx);
        let (Some(n), Some(d)) = (row.numeric(numerator), row.numeric(denominator)) else {
            return;
        };
        // Repair direction assumes a positive denominator; anything else is
        // left for the column's own range constraints to flag.
        if d <= 0.0 {
            return;
        }

        let ratio = n / d;
        let (den_target, num_target) = if ratio > max_ratio {
            // d' >= n / max restores ratio <= max; round the integer
            // denominator up so the repaired ratio stays in bounds.
            (
                round_toward(n / max_ratio, den_spec.dtype, RoundDir::Up),
                round_toward(max_ratio * d, num_spec.dtype, RoundDir::Down),
            )
        } else if ratio < min_ratio {
            (
                round_toward(n / min_ratio, den_spec.dtype, RoundDir::Down),
                round_toward(min_ratio * d, num_spec.dtype, RoundDir::Up),
            )
        } else {
            return;
        };

        if den_spec.in_range(den_target) && den_target > 0.0 {
            set_numeric(working, records, row_idx, den_spec, rule, den_target, "ratio denominator adjustment");
        } else if num_spec.in_range(num_target) {
            set_numeric(working, records, row_idx, num_spec, rule, num_target, "ratio numerator adjustment");
        }
    }

    /// Apply a conditional rule's embedded constraint as a direct repair.
    #[allow(clippy::too_many_arguments)]
    fn repair_conditional(
        &self,
        working: &mut Dataset,
        schema: &Schema,
        profile: &Profile,
        row_idx: usize,
        rule: &RelationRule,
        condition: &Condition,
        then: &Constraint,
        stats: &ImputeStats,
        records: &mut Vec<RepairRecord>,
        dropped: &mut BTreeSet<usize>,
    ) {
        if !condition.holds(&working.row(row_idx)) {
            return;
        }
        let Some(spec) = schema.get(&then.column) else {
            return;
        };
        let Some(col_idx) = working.column_index(&then.column) else {
            return;
        };
        let value = working.get(row_idx, col_idx).cloned().unwrap_or(Value::Null);

        match &then.kind {
            ConstraintKind::Range { min, max } => {
                let Some(n) = value.numeric() else { return };
                let clamped = {
                    let low = min.map_or(n, |m| n.max(m));
                    max.map_or(low, |m| low.min(m))
                };
                if spec.in_range(clamped) {
                    apply(
                        working,
                        records,
                        row_idx,
                        col_idx,
                        spec.name.clone(),
                        &rule.id,
                        value,
                        typed(clamped, spec.dtype),
                        "conditional range applied",
                    );
                }
            }
            ConstraintKind::NotNull => {
                if value.is_null() {
                    self.fill_null(
                        working,
                        row_idx,
                        col_idx,
                        spec,
                        &value,
                        profile.repair.impute,
                        stats,
                        &rule.id,
                        records,
                        dropped,
                    );
                }
            }
            ConstraintKind::Dtype(dtype) => {
                if let Some(n) = value.numeric() {
                    let coerced = typed(n, *dtype);
                    if coerced != value {
                        apply(
                            working,
                            records,
                            row_idx,
                            col_idx,
                            spec.name.clone(),
                            &rule.id,
                            value,
                            coerced,
                            "conditional dtype coercion",
                        );
                    }
                }
            }
            // No deterministic fix for a wrong label; left unresolved.
            ConstraintKind::Category(_) => {}
        }
    }
}

/// Per-column impute statistics, computed over currently-valid values only:
/// non-null, numeric, and inside the declared range.
#[derive(Debug)]
struct ImputeStats {
    medians: IndexMap<String, f64>,
    means: IndexMap<String, f64>,
}

impl ImputeStats {
    fn compute(dataset: &Dataset, schema: &Schema, dropped: &BTreeSet<usize>) -> Self {
        let mut medians = IndexMap::new();
        let mut means = IndexMap::new();

        for spec in schema.columns() {
            if !spec.dtype.is_numeric() {
                continue;
            }
            let Some(col_idx) = dataset.column_index(&spec.name) else {
                continue;
            };
            let mut valid: Vec<f64> = (0..dataset.row_count())
                .filter(|r| !dropped.contains(r))
                .filter_map(|r| dataset.get(r, col_idx).and_then(Value::numeric))
                .filter(|n| spec.in_range(*n))
                .collect();
            if valid.is_empty() {
                continue;
            }
            valid.sort_by(|a, b| a.total_cmp(b));
            let mid = valid.len() / 2;
            let median = if valid.len() % 2 == 0 {
                (valid[mid - 1] + valid[mid]) / 2.0
            } else {
                valid[mid]
            };
            let mean = valid.iter().sum::<f64>() / valid.len() as f64;
            medians.insert(spec.name.clone(), median);
            means.insert(spec.name.clone(), mean);
        }

        Self { medians, means }
    }

    fn value(&self, column: &str, strategy: ImputeStrategy) -> Option<f64> {
        match strategy {
            ImputeStrategy::Median => self.medians.get(column).copied(),
            ImputeStrategy::Mean => self.means.get(column).copied(),
            ImputeStrategy::Zero => Some(0.0),
            ImputeStrategy::DropRow => None,
        }
    }
}

/// Resolve schema columns to dataset positions once per sweep.
fn column_positions<'a>(dataset: &Dataset, schema: &'a Schema) -> Vec<(usize, &'a ColumnSpec)> {
    schema
        .columns()
        .filter_map(|spec| dataset.column_index(&spec.name).map(|idx| (idx, spec)))
        .collect()
}

/// Convert a repaired numeric target into a typed cell value.
fn typed(value: f64, dtype: Dtype) -> Value {
    match dtype {
        Dtype::Integer => Value::Int(value.round() as i64),
        _ => Value::Float(value),
    }
}

/// Smallest value strictly above `v` representable in the column's dtype.
fn step_above(v: f64, dtype: Dtype) -> f64 {
    match dtype {
        Dtype::Integer => v.floor() + 1.0,
        _ => v.next_up(),
    }
}

/// Smallest value strictly below `v` representable in the column's dtype.
fn step_below(v: f64, dtype: Dtype) -> f64 {
    match dtype {
        Dtype::Integer => v.ceil() - 1.0,
        _ => v.next_down(),
    }
}

#[derive(Clone, Copy)]
enum RoundDir {
    Up,
    Down,
}

/// Round a repair target for an integer column in the direction that keeps
/// the constraint satisfied; float columns keep the exact target.
fn round_toward(value: f64, dtype: Dtype, dir: RoundDir) -> f64 {
    match dtype {
        Dtype::Integer => match dir {
            RoundDir::Up => value.ceil(),
            RoundDir::Down => value.floor(),
        },
        _ => value,
    }
}

/// Largest-remainder rounding constrained by per-slot `(min, max)` bounds:
/// floor every target (never below its minimum), then hand the leftover
/// whole units to the targets with the largest fractional parts that still
/// have headroom under their maximum, ties going to earlier declaration
/// order. Units that no slot can absorb are left unplaced; the caller
/// decides whether the shortfall still satisfies the bound.
fn largest_remainder(targets: &mut [f64], total: f64, bounds: &[(Option<f64>, Option<f64>)]) {
    let floors: Vec<f64> = targets
        .iter()
        .enumerate()
        .map(|(i, t)| match bounds[i].0 {
            Some(lo) => t.floor().max(lo.ceil()),
            None => t.floor(),
        })
        .collect();
    let assigned: f64 = floors.iter().sum();
    let mut units = (total - assigned).round() as i64;
    if units <= 0 {
        targets.copy_from_slice(&floors);
        return;
    }

    let mut order: Vec<usize> = (0..targets.len()).collect();
    // Stable sort keeps declaration order as the tie-break.
    order.sort_by(|&a, &b| {
        let ra = targets[a] - floors[a];
        let rb = targets[b] - floors[b];
        rb.total_cmp(&ra)
    });

    targets.copy_from_slice(&floors);
    for idx in order {
        if units == 0 {
            break;
        }
        let capped = bounds[idx].1.is_some_and(|hi| targets[idx] + 1.0 > hi.floor());
        if !capped {
            targets[idx] += 1.0;
            units -= 1;
        }
    }
}

/// Write a typed numeric target into a cell, recording the mutation when it
/// actually changes the stored value.
fn set_numeric(
    working: &mut Dataset,
    records: &mut Vec<RepairRecord>,
    row_idx: usize,
    spec: &ColumnSpec,
    rule: &RelationRule,
    target: f64,
    reason: &str,
) {
    let Some(col_idx) = working.column_index(&spec.name) else {
        return;
    };
    let old = working.get(row_idx, col_idx).cloned().unwrap_or(Value::Null);
    let new = typed(target, spec.dtype);
    if new != old {
        apply(
            working,
            records,
            row_idx,
            col_idx,
            spec.name.clone(),
            &rule.id,
            old,
            new,
            reason,
        );
    }
}

/// Apply one cell mutation and append its audit record.
#[allow(clippy::too_many_arguments)]
fn apply(
    working: &mut Dataset,
    records: &mut Vec<RepairRecord>,
    row_idx: usize,
    col_idx: usize,
    column: String,
    rule_id: &str,
    old: Value,
    new: Value,
    reason: &str,
) {
    working.set(row_idx, col_idx, new.clone());
    records.push(RepairRecord {
        row_index: row_idx,
        column,
        rule_id: rule_id.to_string(),
        old_value: old,
        new_value: new,
        reason: reason.to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_largest_remainder_hits_total() {
        let mut targets = vec![545.4545, 454.5454];
        largest_remainder(&mut targets, 1000.0, &[(None, None); 2]);
        assert_eq!(targets, vec![545.0, 455.0]);
    }

    #[test]
    fn test_largest_remainder_tie_prefers_declaration_order() {
        let mut targets = vec![1.5, 1.5, 2.0];
        largest_remainder(&mut targets, 5.0, &[(None, None); 3]);
        assert_eq!(targets, vec![2.0, 1.0, 2.0]);
    }

    #[test]
    fn test_largest_remainder_skips_capped_slots() {
        // The larger fractional part sits at its maximum, so the unit goes
        // to the slot with headroom.
        let mut targets = vec![4.6, 4.4];
        largest_remainder(&mut targets, 10.0, &[(Some(0.0), Some(4.0)), (Some(0.0), None)]);
        assert_eq!(targets, vec![4.0, 5.0]);
    }

    #[test]
    fn test_integer_step() {
        assert_eq!(step_above(5.0, Dtype::Integer), 6.0);
        assert_eq!(step_below(5.0, Dtype::Integer), 4.0);
        assert_eq!(step_above(5.2, Dtype::Integer), 6.0);
        assert!(step_above(5.0, Dtype::Float) > 5.0);
    }
}
