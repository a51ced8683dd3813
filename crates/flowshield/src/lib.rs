//! FlowShield: constraint validation and repair for network-flow feature
//! vectors.
//!
//! Given a declared [`Schema`] and a [`Profile`] (constraints, relation
//! rules, and repair strategy), FlowShield detects type/range/cross-feature
//! violations in a tabular [`Dataset`] snapshot and can repair the data into
//! a schema-consistent, minimally-perturbed version with a full audit trail.
//!
//! # Core Principles
//!
//! - **Deterministic**: validation and repair are pure functions of the
//!   dataset + schema + profile triple; output ordering is stable.
//! - **Non-destructive**: the input snapshot is never mutated; repair
//!   returns a new snapshot plus one [`RepairRecord`] per cell change.
//! - **Bounded**: repair is a fixed-point loop capped by `max_passes`;
//!   whatever survives is surfaced as unresolved, never looped on.
//!
//! # Example
//!
//! ```
//! use flowshield::{
//!     ColumnSpec, Dataset, Dtype, Profile, RepairConfig, RepairEngine, Schema,
//!     ValidationEngine, Value,
//! };
//!
//! let schema = Schema::new(vec![
//!     ColumnSpec::new("packets", Dtype::Integer).with_range(Some(0.0), None),
//!     ColumnSpec::new("bytes", Dtype::Integer).with_range(Some(0.0), None),
//! ])
//! .unwrap();
//! let profile = Profile::new(
//!     "flow_safe",
//!     Vec::new(),
//!     Vec::new(),
//!     RepairConfig::default(),
//!     &schema,
//! )
//! .unwrap();
//!
//! let data = Dataset::new(
//!     vec!["packets".into(), "bytes".into()],
//!     vec![vec![Value::Int(-5), Value::Int(100)]],
//! );
//!
//! let violations = ValidationEngine::new()
//!     .validate(&data, &schema, &profile)
//!     .unwrap();
//! assert_eq!(violations.len(), 1);
//!
//! let outcome = RepairEngine::new().repair(&data, &schema, &profile).unwrap();
//! assert_eq!(outcome.dataset.get_named(0, "packets"), Some(&Value::Int(0)));
//! ```

pub mod dataset;
pub mod error;
pub mod profile;
pub mod repair;
pub mod report;
pub mod rules;
pub mod schema;
pub mod validation;

pub use dataset::{Dataset, RowView, Value};
pub use error::{FlowShieldError, Result};
pub use profile::{ClipMode, ImputeStrategy, Profile, RepairConfig};
pub use repair::{RepairEngine, RepairOutcome, RepairRecord};
pub use report::{ColumnStats, ColumnSummary, Report, SeverityCounts};
pub use rules::{
    BoundOp, CondOp, Condition, Constraint, ConstraintKind, OrderOp, RelationKind, RelationRule,
    Severity,
};
pub use schema::{ColumnSpec, Dtype, PercentileRank, Schema};
pub use validation::{ValidationEngine, Violation};
