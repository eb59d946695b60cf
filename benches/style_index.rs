//! Style interval index benchmarks.

#![allow(clippy::semicolon_if_nothing_returned)]

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use styled::{InsertPolicy, Rgba, StyleIndex, TextStyle};
use styledtext_rust as styled;

/// Index with `count` alternating bold/colored entries of 8 chars, 2 apart.
fn striped(count: usize) -> StyleIndex {
    let mut index = StyleIndex::new();
    for i in 0..count {
        let style = if i % 2 == 0 {
            TextStyle::bold()
        } else {
            TextStyle::fg(Rgba::BLUE)
        };
        index.assign(i * 10, 8, &style);
    }
    index
}

fn assign(c: &mut Criterion) {
    let mut group = c.benchmark_group("style_assign");

    for count in [100, 10_000] {
        group.bench_with_input(BenchmarkId::new("append", count), &count, |b, &count| {
            b.iter(|| black_box(striped(count)))
        });

        let base = striped(count);
        let mid = count * 5;
        group.bench_with_input(BenchmarkId::new("overwrite_middle", count), &count, |b, _| {
            b.iter_batched(
                || base.clone(),
                |mut index| {
                    index.assign(black_box(mid), 95, &TextStyle::italic());
                    index
                },
                criterion::BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn query(c: &mut Criterion) {
    let index = striped(10_000);
    c.bench_function("style_query_line", |b| {
        b.iter(|| black_box(&index).query(black_box(50_000), 120))
    });
    c.bench_function("style_runs_line", |b| {
        b.iter(|| black_box(&index).runs(black_box(50_000), 120))
    });
}

fn shift(c: &mut Criterion) {
    let mut group = c.benchmark_group("style_shift");
    let base = striped(10_000);

    for (name, start, removed, inserted) in [
        ("insert_char_front", 0, 0, 1),
        ("insert_char_inside", 50_003, 0, 1),
        ("delete_span", 40_000, 20_000, 0),
    ] {
        group.bench_function(name, |b| {
            b.iter_batched(
                || base.clone(),
                |mut index| {
                    index.shift_on_edit(start, removed, inserted, InsertPolicy::Plain);
                    index
                },
                criterion::BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(benches, assign, query, shift);
criterion_main!(benches);
