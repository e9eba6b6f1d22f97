use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pgqb::qb::{self, Render, RowValues};

/// Build and render a SELECT with `n` columns and `n` equality predicates.
fn render_select(n: usize) -> pgqb::BuiltQuery {
    let columns: Vec<String> = (0..n).map(|i| format!("col{i}")).collect();
    let refs: Vec<&str> = columns.iter().map(String::as_str).collect();
    let mut builder = qb::from("t").select(&refs);
    for (i, col) in columns.iter().enumerate() {
        builder = builder.filter(col, "=", i as i64);
    }
    builder.render().unwrap()
}

fn bench_select_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_builder/select_render");

    for n in [1, 5, 10, 50, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| black_box(render_select(n)));
        });
    }

    group.finish();
}

fn bench_in_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_builder/in_list");

    for n in [5, 20, 100, 500] {
        let values: Vec<i64> = (0..n as i64).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &values, |b, values| {
            b.iter(|| {
                let q = qb::from("t")
                    .select(&["id"])
                    .filter("id", "in", values.clone())
                    .render()
                    .unwrap();
                black_box(q);
            });
        });
    }

    group.finish();
}

fn bench_multi_row_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_builder/multi_row_insert");

    for n in [1, 10, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let rows: Vec<RowValues> = (0..n as i64)
                    .map(|i| RowValues::new().set("id", i).set("name", "x"))
                    .collect();
                let q = qb::from("t").insert(rows).render().unwrap();
                black_box(q);
            });
        });
    }

    group.finish();
}

fn bench_subquery_embed(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_builder/subquery_embed");

    for n in [1, 10, 50] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let sub = render_select(n);
                let q = qb::from("outer_t")
                    .select(&["id"])
                    .filter("active", "=", true)
                    .where_subquery("id", "in", &sub)
                    .render()
                    .unwrap();
                black_box(q);
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_select_render,
    bench_in_list,
    bench_multi_row_insert,
    bench_subquery_embed
);
criterion_main!(benches);
