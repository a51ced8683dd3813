//! Property-based tests for the engine guarantees: determinism, idempotence,
//! and post-repair invariants.

use proptest::prelude::*;

use flowshield::{
    BoundOp, ColumnSpec, Dataset, Dtype, Profile, RelationKind, RelationRule, RepairConfig,
    RepairEngine, Schema, Severity, ValidationEngine, Value,
};

fn counter_schema() -> Schema {
    Schema::new(vec![
        ColumnSpec::new("packets", Dtype::Integer).with_range(Some(0.0), Some(100_000.0)),
        ColumnSpec::new("bytes", Dtype::Integer).with_range(Some(0.0), Some(1_000_000.0)),
    ])
    .unwrap()
}

fn latency_schema() -> Schema {
    Schema::new(vec![
        ColumnSpec::new("p50", Dtype::Float).with_percentile("latency", 1),
        ColumnSpec::new("p95", Dtype::Float).with_percentile("latency", 2),
        ColumnSpec::new("p99", Dtype::Float).with_percentile("latency", 3),
    ])
    .unwrap()
}

fn latency_profile(schema: &Schema) -> Profile {
    let rule = RelationRule::new(
        "percentile_order",
        Severity::Error,
        RelationKind::NonDecreasingGroup {
            group: "latency".into(),
        },
    );
    Profile::new("prop", Vec::new(), vec![rule], RepairConfig::default(), schema).unwrap()
}

fn counter_rows() -> impl Strategy<Value = Vec<Vec<Value>>> {
    prop::collection::vec(
        (-200_000i64..200_000, -2_000_000i64..2_000_000)
            .prop_map(|(p, b)| vec![Value::Int(p), Value::Int(b)]),
        0..40,
    )
}

fn latency_rows() -> impl Strategy<Value = Vec<Vec<Value>>> {
    prop::collection::vec(
        (-1e6..1e6, -1e6..1e6, -1e6..1e6)
            .prop_map(|(a, b, c)| vec![Value::Float(a), Value::Float(b), Value::Float(c)]),
        0..40,
    )
}

proptest! {
    /// Validating the same snapshot twice yields identical findings.
    #[test]
    fn validation_is_deterministic(rows in counter_rows()) {
        let schema = counter_schema();
        let profile = Profile::new(
            "prop", Vec::new(), Vec::new(), RepairConfig::default(), &schema,
        ).unwrap();
        let data = Dataset::new(vec!["packets".into(), "bytes".into()], rows);

        let engine = ValidationEngine::new();
        let first = engine.validate(&data, &schema, &profile).unwrap();
        let second = engine.validate(&data, &schema, &profile).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Repairing the same snapshot twice yields identical outcomes, and the
    /// input snapshot is never touched.
    #[test]
    fn repair_is_deterministic(rows in counter_rows()) {
        let schema = counter_schema();
        let profile = Profile::new(
            "prop", Vec::new(), Vec::new(), RepairConfig::default(), &schema,
        ).unwrap();
        let data = Dataset::new(vec!["packets".into(), "bytes".into()], rows);
        let snapshot = data.clone();

        let engine = RepairEngine::new();
        let first = engine.repair(&data, &schema, &profile).unwrap();
        let second = engine.repair(&data, &schema, &profile).unwrap();
        prop_assert_eq!(&first.dataset, &second.dataset);
        prop_assert_eq!(&first.records, &second.records);
        prop_assert_eq!(data, snapshot);
    }

    /// Every numeric value lies inside its declared range after repair.
    #[test]
    fn repair_enforces_ranges(rows in counter_rows()) {
        let schema = counter_schema();
        let profile = Profile::new(
            "prop", Vec::new(), Vec::new(), RepairConfig::default(), &schema,
        ).unwrap();
        let data = Dataset::new(vec!["packets".into(), "bytes".into()], rows);

        let outcome = RepairEngine::new().repair(&data, &schema, &profile).unwrap();
        for (row_idx, row) in outcome.dataset.rows.iter().enumerate() {
            for (col_idx, value) in row.iter().enumerate() {
                let spec = schema.get(&outcome.dataset.columns[col_idx]).unwrap();
                let n = value.numeric().unwrap();
                prop_assert!(
                    spec.in_range(n),
                    "row {} column '{}': {} out of range",
                    row_idx, spec.name, n,
                );
            }
        }
        prop_assert!(outcome.unresolved.is_empty());
    }

    /// Percentile ordering holds on every row after repair.
    #[test]
    fn repair_restores_percentile_order(rows in latency_rows()) {
        let schema = latency_schema();
        let profile = latency_profile(&schema);
        let data = Dataset::new(vec!["p50".into(), "p95".into(), "p99".into()], rows);

        let outcome = RepairEngine::new().repair(&data, &schema, &profile).unwrap();
        prop_assert!(outcome.unresolved.is_empty());
        for row in &outcome.dataset.rows {
            let (p50, p95, p99) = (
                row[0].numeric().unwrap(),
                row[1].numeric().unwrap(),
                row[2].numeric().unwrap(),
            );
            prop_assert!(p50 <= p95 && p95 <= p99, "{p50} {p95} {p99}");
        }
    }

    /// Repair reaches a fixed point: a second run changes nothing.
    #[test]
    fn repair_is_idempotent(rows in latency_rows()) {
        let schema = latency_schema();
        let profile = latency_profile(&schema);
        let data = Dataset::new(vec!["p50".into(), "p95".into(), "p99".into()], rows);

        let engine = RepairEngine::new();
        let first = engine.repair(&data, &schema, &profile).unwrap();
        let second = engine.repair(&first.dataset, &schema, &profile).unwrap();
        prop_assert!(second.records.is_empty(), "{:?}", second.records);
        prop_assert_eq!(second.dataset, first.dataset);
    }

    /// Sum-bound repair on unclamped integer columns lands exactly on the
    /// bound, never overshooting below it.
    #[test]
    fn sum_repair_hits_integer_bound(
        a in -10_000i64..10_000,
        b in -10_000i64..10_000,
        bound in -5_000i64..5_000,
    ) {
        let schema = Schema::new(vec![
            ColumnSpec::new("http_bytes", Dtype::Integer),
            ColumnSpec::new("other_bytes", Dtype::Integer),
        ]).unwrap();
        let rule = RelationRule::new(
            "byte_split",
            Severity::Warning,
            RelationKind::SumBound {
                columns: vec!["http_bytes".into(), "other_bytes".into()],
                op: BoundOp::Le,
                bound: bound as f64,
                tolerance: 0.0,
            },
        );
        let profile = Profile::new(
            "prop", Vec::new(), vec![rule], RepairConfig::default(), &schema,
        ).unwrap();
        let data = Dataset::new(
            vec!["http_bytes".into(), "other_bytes".into()],
            vec![vec![Value::Int(a), Value::Int(b)]],
        );

        let outcome = RepairEngine::new().repair(&data, &schema, &profile).unwrap();
        let sum = outcome.dataset.rows[0][0].numeric().unwrap()
            + outcome.dataset.rows[0][1].numeric().unwrap();
        prop_assert!(sum <= bound as f64, "sum {} exceeds bound {}", sum, bound);
        if a + b > bound {
            prop_assert_eq!(sum, bound as f64);
        } else {
            prop_assert!(outcome.records.is_empty());
        }
        prop_assert!(outcome.unresolved.is_empty());
    }

    /// Sum-bound repair on ranged columns never pushes a value outside its
    /// declared range, and a second repair changes nothing, even when the
    /// ranges make the bound unreachable.
    #[test]
    fn sum_repair_respects_ranges(
        a in -50i64..50,
        b in -50i64..50,
        bound in -40i64..40,
    ) {
        let schema = Schema::new(vec![
            ColumnSpec::new("a", Dtype::Integer).with_range(Some(0.0), Some(10.0)),
            ColumnSpec::new("b", Dtype::Integer).with_range(Some(0.0), Some(10.0)),
        ]).unwrap();
        let rule = RelationRule::new(
            "floor_total",
            Severity::Warning,
            RelationKind::SumBound {
                columns: vec!["a".into(), "b".into()],
                op: BoundOp::Ge,
                bound: bound as f64,
                tolerance: 0.0,
            },
        );
        let profile = Profile::new(
            "prop", Vec::new(), vec![rule], RepairConfig::default(), &schema,
        ).unwrap();
        let data = Dataset::new(
            vec!["a".into(), "b".into()],
            vec![vec![Value::Int(a), Value::Int(b)]],
        );

        let engine = RepairEngine::new();
        let first = engine.repair(&data, &schema, &profile).unwrap();
        for value in &first.dataset.rows[0] {
            let n = value.numeric().unwrap();
            prop_assert!((0.0..=10.0).contains(&n), "{} escaped [0, 10]", n);
        }

        let second = engine.repair(&first.dataset, &schema, &profile).unwrap();
        prop_assert!(second.records.is_empty(), "{:?}", second.records);
        prop_assert_eq!(second.dataset, first.dataset);
    }
}
