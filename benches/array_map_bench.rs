use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use packed_maps::ArrayMap;
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

fn filled(n: usize) -> ArrayMap<String, u64> {
    let pairs: Vec<(String, u64)> = lcg(9).take(n).map(|x| (key(x), x)).collect();
    match ArrayMap::try_from_iter(pairs) {
        Ok(m) => m,
        Err(e) => panic!("lcg produced a duplicate: {e}"),
    }
}

fn bench_emplace_random_10k(c: &mut Criterion) {
    c.bench_function("array::emplace_random_10k", |b| {
        b.iter_batched(
            ArrayMap::<String, u64>::new,
            |mut m| {
                for x in lcg(1).take(10_000) {
                    black_box(m.emplace(key(x), x));
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_emplace_ascending_10k(c: &mut Criterion) {
    c.bench_function("array::emplace_ascending_10k", |b| {
        b.iter_batched(
            || ArrayMap::<u64, u64>::with_capacity(10_000),
            |mut m| {
                for i in 0..10_000u64 {
                    black_box(m.emplace(i, i));
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_from_iter_10k(c: &mut Criterion) {
    let pairs: Vec<(String, u64)> = lcg(2).take(10_000).map(|x| (key(x), x)).collect();
    c.bench_function("array::try_from_iter_10k", |b| {
        b.iter_batched(
            || pairs.clone(),
            |p| black_box(ArrayMap::<String, u64>::try_from_iter(p)),
            BatchSize::SmallInput,
        )
    });
}

fn bench_find_hit_and_miss_10k(c: &mut Criterion) {
    let m = filled(10_000);
    let hits: Vec<String> = lcg(9).take(10_000).map(key).collect();
    let misses: Vec<String> = lcg(10).take(10_000).map(key).collect();
    c.bench_function("array::find_hit_10k", |b| {
        b.iter(|| {
            let mut s = 0u64;
            for k in &hits {
                s = s.wrapping_add(*m.get(k.as_str()).unwrap());
            }
            black_box(s)
        })
    });
    c.bench_function("array::find_miss_10k", |b| {
        b.iter(|| {
            let mut n = 0usize;
            for k in &misses {
                n += m.contains_key(k.as_str()) as usize;
            }
            black_box(n)
        })
    });
}

fn bench_remove_random_10k(c: &mut Criterion) {
    let keys: Vec<String> = lcg(9).take(10_000).map(key).collect();
    c.bench_function("array::remove_random_10k", |b| {
        b.iter_batched(
            || filled(10_000),
            |mut m| {
                for k in &keys {
                    black_box(m.remove(k.as_str()));
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(12)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches_insert;
    config = bench_config();
    targets = bench_emplace_random_10k, bench_emplace_ascending_10k, bench_from_iter_10k
}
criterion_group! {
    name = benches_ops;
    config = bench_config();
    targets = bench_find_hit_and_miss_10k, bench_remove_random_10k
}
criterion_main!(benches_insert, benches_ops);
