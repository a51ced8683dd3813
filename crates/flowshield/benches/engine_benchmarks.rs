//! Engine performance benchmarks.
//!
//! Measures validation and repair throughput over synthetic flow records.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use flowshield::{
    ColumnSpec, Dataset, Dtype, Profile, RelationKind, RelationRule, RepairConfig, RepairEngine,
    Schema, Severity, ValidationEngine, Value,
};

fn flow_schema() -> Schema {
    Schema::new(vec![
        ColumnSpec::new("packets", Dtype::Integer).with_range(Some(0.0), None),
        ColumnSpec::new("bytes", Dtype::Integer).with_range(Some(0.0), None),
        ColumnSpec::new("p50", Dtype::Float).with_percentile("latency", 1),
        ColumnSpec::new("p95", Dtype::Float).with_percentile("latency", 2),
        ColumnSpec::new("p99", Dtype::Float).with_percentile("latency", 3),
    ])
    .unwrap()
}

fn flow_profile(schema: &Schema) -> Profile {
    let rules = vec![RelationRule::new(
        "percentile_order",
        Severity::Error,
        RelationKind::NonDecreasingGroup {
            group: "latency".into(),
        },
    )];
    Profile::new("bench", Vec::new(), rules, RepairConfig::default(), schema).unwrap()
}

/// Deterministic synthetic dataset where roughly one row in ten violates a
/// range or ordering rule.
fn synthetic_dataset(rows: usize) -> Dataset {
    let data = (0..rows)
        .map(|i| {
            let packets = if i % 10 == 0 { -5 } else { (i % 100) as i64 };
            let base = (i % 50) as f64;
            let p95 = if i % 10 == 3 { base - 10.0 } else { base + 5.0 };
            vec![
                Value::Int(packets),
                Value::Int(packets.max(0) * 1500),
                Value::Float(base),
                Value::Float(p95),
                Value::Float(base + 20.0),
            ]
        })
        .collect();
    Dataset::new(
        vec![
            "packets".into(),
            "bytes".into(),
            "p50".into(),
            "p95".into(),
            "p99".into(),
        ],
        data,
    )
}

fn bench_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("validation");
    let schema = flow_schema();
    let profile = flow_profile(&schema);
    let engine = ValidationEngine::new();

    for rows in [100, 1_000, 10_000].iter() {
        let data = synthetic_dataset(*rows);
        group.bench_with_input(BenchmarkId::from_parameter(rows), &data, |b, data| {
            b.iter(|| black_box(engine.validate(data, &schema, &profile)))
        });
    }

    group.finish();
}

fn bench_repair(c: &mut Criterion) {
    let mut group = c.benchmark_group("repair");
    let schema = flow_schema();
    let profile = flow_profile(&schema);
    let engine = RepairEngine::new();

    for rows in [100, 1_000, 10_000].iter() {
        let data = synthetic_dataset(*rows);
        group.bench_with_input(BenchmarkId::from_parameter(rows), &data, |b, data| {
            b.iter(|| black_box(engine.repair(data, &schema, &profile)))
        });
    }

    group.finish();
}

fn bench_repair_clean_input(c: &mut Criterion) {
    let mut group = c.benchmark_group("repair_clean");
    let schema = flow_schema();
    let profile = flow_profile(&schema);
    let engine = RepairEngine::new();

    // Already-clean data measures the fixed-point early exit.
    let dirty = synthetic_dataset(1_000);
    let clean = engine.repair(&dirty, &schema, &profile).unwrap().dataset;
    group.bench_function("1000", |b| {
        b.iter(|| black_box(engine.repair(&clean, &schema, &profile)))
    });

    group.finish();
}

criterion_group!(benches, bench_validation, bench_repair, bench_repair_clean_input);
criterion_main!(benches);
