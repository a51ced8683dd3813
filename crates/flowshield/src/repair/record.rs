//! Repair audit trail types.

use serde::{Deserialize, Serialize};

use crate::dataset::{Dataset, Value};
use crate::validation::Violation;

/// One cell mutation made by the repair engine.
///
/// Records are append-only and ordered by pass number, then rule order
/// within the pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairRecord {
    /// Row index in the pre-removal snapshot (0-based).
    pub row_index: usize,
    /// Column that was changed.
    pub column: String,
    /// Identifier of the rule or check that prompted the change.
    pub rule_id: String,
    /// Value before the mutation.
    pub old_value: Value,
    /// Value after the mutation.
    pub new_value: Value,
    /// Why the change was made.
    pub reason: String,
}

/// Result of a repair run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairOutcome {
    /// The repaired snapshot. The input dataset is never mutated.
    pub dataset: Dataset,
    /// Every cell mutation, in application order.
    pub records: Vec<RepairRecord>,
    /// Violations that survived all repair passes.
    pub unresolved: Vec<Violation>,
    /// Number of pass cycles actually run.
    pub passes_run: usize,
}
