use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use quarry::qb;

/// Build a SELECT with `n` columns and `n` predicates:
/// SELECT col0, ... FROM t WHERE col0 = $1 AND col1 = $2 ...
fn build_select(n: usize) -> quarry::SelectBuilder {
    let mut builder = qb::select("t");
    for i in 0..n {
        builder = builder.column(&format!("col{i}"));
    }
    for i in 0..n {
        builder = builder.eq(&format!("col{i}"), i as i64);
    }
    builder
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("statement_builder/build");

    for n in [1, 5, 10, 50, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let stmt = build_select(n).build().unwrap();
                black_box(stmt.sql().len());
            });
        });
    }

    group.finish();
}

fn bench_in_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("statement_builder/in_list");

    for n in [5, 20, 100, 500] {
        let values: Vec<i64> = (0..n).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &values, |b, values| {
            b.iter(|| {
                let stmt = qb::select("t")
                    .in_list("id", values.clone())
                    .build()
                    .unwrap();
                black_box(stmt.params().len());
            });
        });
    }

    group.finish();
}

fn bench_update_writeback(c: &mut Criterion) {
    let mut group = c.benchmark_group("statement_builder/record_writeback");

    for n in [1, 10, 50] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            let mut record = quarry::Record::new();
            record.set("id", 1i64);
            for i in 0..n {
                record.set(&format!("col{i}"), i as i64);
            }
            b.iter(|| {
                let stmt = record.to_update_statement("t", &["id"]).unwrap();
                black_box(stmt.sql().len());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_build, bench_in_list, bench_update_writeback);
criterion_main!(benches);
