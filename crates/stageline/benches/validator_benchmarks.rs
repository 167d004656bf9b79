//! Validator performance benchmarks.
//!
//! Measures both validation engines and the advisory pass over generated
//! datasets of increasing size.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use stageline::validation::{LightweightValidator, Validator, rules};
use stageline::{ColumnType, DataTable, FormatRule, IngestionConfig};

/// Generate a dataset with a sprinkling of nulls and repeated keys.
fn generate_table(rows: usize) -> DataTable {
    let headers = vec![
        "id".to_string(),
        "email".to_string(),
        "amount".to_string(),
        "created".to_string(),
    ];
    let data = (0..rows)
        .map(|i| {
            let id = if i % 97 == 0 { i.saturating_sub(1) } else { i };
            let email = if i % 53 == 0 {
                String::new()
            } else {
                format!("user{}@example.com", i)
            };
            vec![
                id.to_string(),
                email,
                format!("{}.{}", i % 1000, i % 100),
                format!("2024-{:02}-{:02}", i % 12 + 1, i % 28 + 1),
            ]
        })
        .collect();
    DataTable::new(headers, data)
}

fn bench_config() -> IngestionConfig {
    IngestionConfig::new(
        ["id", "email", "amount", "created"],
        ["id", "email"],
        ["id"],
    )
    .with_type("amount", ColumnType::Float)
    .with_type("created", ColumnType::Timestamp)
    .with_validation("email", FormatRule::Email)
    .with_validation("created", FormatRule::Pattern("%Y-%m-%d".to_string()))
}

/// Benchmark the lightweight engine.
fn bench_lightweight(c: &mut Criterion) {
    let mut group = c.benchmark_group("lightweight_engine");
    let config = bench_config();

    for rows in [100, 1_000, 10_000].iter() {
        let table = generate_table(*rows);
        group.bench_with_input(BenchmarkId::from_parameter(rows), &table, |b, table| {
            b.iter(|| black_box(LightweightValidator.check(table, &config)))
        });
    }

    group.finish();
}

/// Benchmark the SQL expectation engine.
#[cfg(feature = "sql-engine")]
fn bench_sql(c: &mut Criterion) {
    use stageline::validation::SqlValidator;

    let mut group = c.benchmark_group("sql_engine");
    let config = bench_config();
    let Some(engine) = SqlValidator::probe() else {
        return;
    };

    for rows in [100, 1_000, 10_000].iter() {
        let table = generate_table(*rows);
        group.bench_with_input(BenchmarkId::from_parameter(rows), &table, |b, table| {
            b.iter(|| black_box(engine.check(table, &config)))
        });
    }

    group.finish();
}

#[cfg(not(feature = "sql-engine"))]
fn bench_sql(_c: &mut Criterion) {}

/// Benchmark type and format advisories.
fn bench_advisories(c: &mut Criterion) {
    let mut group = c.benchmark_group("advisories");
    let config = bench_config();
    let table = generate_table(10_000);

    group.bench_function("rows_10000", |b| {
        b.iter(|| black_box(rules::advisories(&table, &config)))
    });

    group.finish();
}

criterion_group!(benches, bench_lightweight, bench_sql, bench_advisories);
criterion_main!(benches);
