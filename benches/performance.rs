use std::collections::BTreeMap;

use criterion::{criterion_group, criterion_main, Criterion};
use tabfuse_core::prelude::*;
use tabfuse_operators::{merge_tables, Filter};

const MAKES: [&str; 5] = ["bmw", "audi", "volkswagen", "toyota", "ford"];

fn make_cars(rows: usize) -> Table {
    let mut ids = Vec::with_capacity(rows);
    let mut makes = Vec::with_capacity(rows);
    let mut prices = Vec::with_capacity(rows);
    for i in 0..rows {
        ids.push(Scalar::Num(i as f64));
        makes.push(Scalar::Str(MAKES[i % MAKES.len()].into()));
        prices.push(Scalar::Num((10_000 + (i * 37) % 40_000) as f64));
    }
    Table {
        columns: vec![
            Column::inferred("id", ids),
            Column::inferred("make", makes),
            Column::inferred("price", prices),
        ],
    }
}

fn make_colors(rows: usize) -> Table {
    let mut ids = Vec::with_capacity(rows);
    let mut colors = Vec::with_capacity(rows);
    for i in 0..rows {
        // every other id, plus ids the car table does not have
        ids.push(Scalar::Num((i * 2) as f64));
        colors.push(Scalar::Str(format!("color-{}", i % 7)));
    }
    Table {
        columns: vec![Column::inferred("id", ids), Column::inferred("color", colors)],
    }
}

fn bench_filter(c: &mut Criterion) {
    let table = make_cars(4096);
    let mut filters = BTreeMap::new();
    filters.insert("price".to_string(), FieldFilter::range(Some(20_000.0), Some(40_000.0)));
    filters.insert("make".to_string(), FieldFilter::values(["Audi", "VW", "Toyta"]));
    let filter = Filter::new(filters, 80);

    c.bench_function("filter_numeric_and_fuzzy", |b| {
        b.iter(|| {
            let out = filter.apply(table.clone());
            assert!(out.table.num_rows() > 0);
        })
    });
}

fn bench_merge(c: &mut Criterion) {
    let cars = make_cars(4096);
    let colors = make_colors(4096);

    c.bench_function("merge_full_outer_two_way", |b| {
        b.iter(|| {
            let merged = merge_tables(vec![
                ("cars.csv".to_string(), cars.clone()),
                ("colors.csv".to_string(), colors.clone()),
            ])
            .expect("merge");
            assert!(merged.num_rows() >= 4096);
        })
    });
}

criterion_group!(benches, bench_filter, bench_merge);
criterion_main!(benches);
