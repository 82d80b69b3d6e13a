use chrono::NaiveDate;
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rowbind::{ClauseBuilder, Dialect, FromRow, Record, present_fields};

#[derive(Debug, Default, Record, FromRow)]
struct Order {
    id: i64,
    customer: String,
    status: String,
    quantity: i32,
    total: f64,
    paid: bool,
    note: Option<String>,
    placed_on: NaiveDate,
}

fn sample() -> Order {
    Order {
        id: 42,
        customer: "acme".into(),
        status: "open".into(),
        quantity: 3,
        total: 19.5,
        paid: false,
        note: Some("rush".into()),
        placed_on: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap_or_default(),
    }
}

fn bench_present_fields(c: &mut Criterion) {
    let full = sample();
    let sparse = Order {
        status: "open".into(),
        ..Order::default()
    };

    let mut group = c.benchmark_group("clause_builder/present_fields");
    group.bench_function("full", |b| b.iter(|| black_box(present_fields(&full))));
    group.bench_function("sparse", |b| b.iter(|| black_box(present_fields(&sparse))));
    group.finish();
}

fn bench_statements(c: &mut Criterion) {
    let values = sample();
    let selector = Order {
        status: "open".into(),
        paid: true,
        ..Order::default()
    };

    for dialect in [Dialect::MySql, Dialect::Postgres] {
        let builder = ClauseBuilder::new(dialect);
        let mut group = c.benchmark_group(format!("clause_builder/{dialect:?}"));

        group.bench_with_input(BenchmarkId::new("select", 8), &selector, |b, s| {
            b.iter(|| black_box(builder.select::<Order, _>("orders", s)))
        });
        group.bench_with_input(BenchmarkId::new("insert", 8), &values, |b, v| {
            b.iter(|| black_box(builder.insert("orders", v)))
        });
        group.bench_function(BenchmarkId::new("update", 8), |b| {
            b.iter(|| black_box(builder.update("orders", &selector, &values)))
        });
        group.bench_with_input(BenchmarkId::new("delete", 8), &selector, |b, s| {
            b.iter(|| black_box(builder.delete("orders", s)))
        });

        group.finish();
    }
}

criterion_group!(benches, bench_present_fields, bench_statements);
criterion_main!(benches);
