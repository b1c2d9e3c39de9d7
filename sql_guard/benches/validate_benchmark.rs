//! Criterion benchmarks for the Lakewise SQL Guard.
//!
//! Measures the full validation pipeline (prescreen + parse + policies +
//! rewrite) for the three shapes the agent produces most: an exploratory
//! scan, an aggregation, and a multi-join report query.

use criterion::{criterion_group, criterion_main, Criterion};
use lakewise_sql_guard::{GuardConfig, SqlGuard};

fn bench_validate(c: &mut Criterion) {
    let guard = SqlGuard::new(GuardConfig::with_whitelist(
        ["orders", "order_items", "products", "users"],
        1000,
    ));

    c.bench_function("validate_exploratory", |b| {
        b.iter(|| {
            std::hint::black_box(
                guard.validate("SELECT * FROM orders WHERE status = 'Complete'"),
            )
        })
    });

    c.bench_function("validate_aggregate", |b| {
        b.iter(|| {
            std::hint::black_box(
                guard.validate("SELECT status, COUNT(*) FROM orders GROUP BY status"),
            )
        })
    });

    c.bench_function("validate_join_report", |b| {
        b.iter(|| {
            std::hint::black_box(guard.validate(
                "SELECT p.category, SUM(oi.sale_price) AS revenue \
                 FROM order_items oi \
                 JOIN orders o ON oi.order_id = o.id \
                 JOIN products p ON oi.product_id = p.id \
                 WHERE o.created_at >= '2026-01-01' \
                 GROUP BY p.category",
            ))
        })
    });

    c.bench_function("validate_rejection", |b| {
        b.iter(|| std::hint::black_box(guard.validate("DROP TABLE users")))
    });
}

criterion_group!(benches, bench_validate);
criterion_main!(benches);
