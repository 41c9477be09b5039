use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use packed_maps::{SlotKey, SlotMap};
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn filled(n: usize) -> (SlotMap<u64>, Vec<SlotKey>) {
    let mut m = SlotMap::with_capacity(n);
    let keys = lcg(7).take(n).map(|x| m.insert(x)).collect();
    (m, keys)
}

fn bench_insert_fresh_100k(c: &mut Criterion) {
    c.bench_function("slot::insert_fresh_100k", |b| {
        b.iter_batched(
            SlotMap::<u64>::new,
            |mut m| {
                for x in lcg(1).take(100_000) {
                    black_box(m.insert(x));
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_insert_reserved_100k(c: &mut Criterion) {
    c.bench_function("slot::insert_reserved_100k", |b| {
        b.iter_batched(
            || SlotMap::<u64>::with_capacity(100_000),
            |mut m| {
                for x in lcg(2).take(100_000) {
                    black_box(m.insert(x));
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_insert_reuse_100k(c: &mut Criterion) {
    c.bench_function("slot::insert_reuse_100k", |b| {
        b.iter_batched(
            || {
                // Every slot is on the free list with a bumped version.
                let (mut m, keys) = filled(100_000);
                for k in keys {
                    m.remove(k);
                }
                m
            },
            |mut m| {
                for x in lcg(3).take(100_000) {
                    black_box(m.insert(x));
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_remove_random_10k(c: &mut Criterion) {
    c.bench_function("slot::remove_random_10k", |b| {
        b.iter_batched(
            || {
                let (m, mut keys) = filled(10_000);
                // Shuffle removal order.
                let mut r = lcg(4);
                for i in (1..keys.len()).rev() {
                    let j = r.next().unwrap() as usize % (i + 1);
                    keys.swap(i, j);
                }
                (m, keys)
            },
            |(mut m, keys)| {
                for k in keys {
                    black_box(m.remove(k));
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_get_hit_and_stale(c: &mut Criterion) {
    let (mut m, keys) = filled(10_000);
    let stale: Vec<SlotKey> = keys.iter().step_by(2).copied().collect();
    for &k in &stale {
        m.remove(k);
    }
    let live: Vec<SlotKey> = m.keys().collect();
    c.bench_function("slot::get_hit_5k", |b| {
        b.iter(|| {
            let mut s = 0u64;
            for &k in &live {
                s = s.wrapping_add(*m.get(k).unwrap());
            }
            black_box(s)
        })
    });
    c.bench_function("slot::get_stale_5k", |b| {
        b.iter(|| {
            let mut n = 0usize;
            for &k in &stale {
                n += m.contains_key(k) as usize;
            }
            black_box(n)
        })
    });
}

fn bench_iter_and_values(c: &mut Criterion) {
    let (mut m, _) = filled(100_000);
    c.bench_function("slot::iter_100k", |b| {
        b.iter(|| {
            let mut s = 0u64;
            for (k, v) in m.iter() {
                s = s.wrapping_add(*v ^ k.index() as u64);
            }
            black_box(s)
        })
    });
    c.bench_function("slot::values_mut_100k", |b| {
        b.iter(|| {
            for v in m.values_mut() {
                *v = v.wrapping_add(1);
            }
        })
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
    targets = bench_insert_fresh_100k, bench_insert_reserved_100k, bench_insert_reuse_100k
}
criterion_group! {
    name = benches_ops;
    config = bench_config();
    targets = bench_remove_random_10k,
              bench_get_hit_and_stale,
              bench_iter_and_values
}
criterion_main!(benches_insert, benches_ops);
