use criterion::{black_box, criterion_group, criterion_main, Criterion};
use prec_frame::{CompiledExpr, Table};

fn filter_bench(c: &mut Criterion) {
    let n = 100_000;
    let ids: Vec<f64> = (0..n).map(|i| [511.0, -521.0, 531.0][i % 3]).collect();
    let mass: Vec<f64> = (0..n).map(|i| 4500.0 + (i % 2400) as f64).collect();
    let table = Table::new()
        .with_float("B_TRUEID", ids)
        .and_then(|t| t.with_float("B_M", mass))
        .expect("table");
    let expr = CompiledExpr::compile("(abs(B_TRUEID) == 521) & (4800 < B_M) & (B_M < 6000)")
        .expect("compile");

    c.bench_function("category_mask", |b| {
        b.iter(|| black_box(table.mask(&expr).expect("mask")));
    });

    c.bench_function("category_query", |b| {
        b.iter(|| black_box(table.query("abs(B_TRUEID) == 531").expect("query")));
    });
}

criterion_group!(benches, filter_bench);
criterion_main!(benches);
