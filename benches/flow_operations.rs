use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pullflow::{Flow, SortFlags, SortKind, Value};

fn int(v: &Value) -> i64 {
    v.as_i64().unwrap_or(0)
}

fn count_all(mut flow: Flow) -> usize {
    flow.count().unwrap_or(0)
}

fn bench_basic_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("basic_operations");

    for size in [1_000i64, 10_000, 100_000].iter() {
        group.bench_with_input(BenchmarkId::new("map_where", size), size, |b, &size| {
            b.iter(|| {
                let result = Flow::range(0, size - 1, 1)
                    .map(|v, _| black_box(Value::Int(int(&v) * 2)))
                    .where_(|v, _| black_box(int(v) % 4 == 0))
                    .to_vec();
                black_box(result)
            });
        });

        group.bench_with_input(BenchmarkId::new("reduce", size), size, |b, &size| {
            b.iter(|| {
                let result = Flow::range(0, size - 1, 1)
                    .reduce(|acc, v, _| Value::Int(int(&acc) + int(&v)), 0)
                    .to_vec();
                black_box(result)
            });
        });
    }

    group.finish();
}

fn bench_unfold(c: &mut Criterion) {
    let mut group = c.benchmark_group("unfold");

    for width in [10usize, 100, 1_000].iter() {
        let nested: Vec<Value> = (0..100)
            .map(|i| Value::from(vec![i as i64; *width]))
            .collect();
        group.bench_with_input(BenchmarkId::new("unfold", width), &nested, |b, nested| {
            b.iter(|| {
                let result = count_all(Flow::from(nested.clone()).unfold());
                black_box(result)
            });
        });
    }

    group.finish();
}

fn bench_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort");

    for size in [1_000usize, 10_000].iter() {
        let values: Vec<Value> = (0..*size)
            .map(|i| Value::Int(((i * 7919) % size) as i64))
            .collect();
        for kind in [SortKind::Sort, SortKind::Asort, SortKind::Natsort] {
            group.bench_with_input(
                BenchmarkId::new(kind.as_str(), size),
                &values,
                |b, values| {
                    b.iter(|| {
                        let result = Flow::from(values.clone()).sort(kind, SortFlags::default());
                        black_box(result.map(count_all))
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_cache_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache");

    group.bench_function("replay_10k", |b| {
        let mut flow = Flow::range(0, 9_999, 1)
            .map(|v, _| Value::Int(int(&v) * 3))
            .cache();
        let _ = flow.count();
        b.iter(|| black_box(flow.count()));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_basic_operations,
    bench_unfold,
    bench_sort,
    bench_cache_replay
);
criterion_main!(benches);
