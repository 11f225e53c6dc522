use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use ordered_priority_map::linked_handle_map::{Handle, LinkedHandleMap};
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

fn bench_insert_fresh_100k(c: &mut Criterion) {
    c.bench_function("linked::insert_fresh_100k", |b| {
        b.iter_batched(
            LinkedHandleMap::<String, u64>::new,
            |mut m| {
                for (i, x) in lcg(1).take(100_000).enumerate() {
                    let _ = m.insert(key(x), i as u64);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_unlink_random_10k(c: &mut Criterion) {
    c.bench_function("linked::unlink_random_10k_of_110k", |b| {
        b.iter_batched(
            || {
                let mut m = LinkedHandleMap::new();
                let handles: Vec<Handle> = lcg(5)
                    .take(110_000)
                    .enumerate()
                    .filter_map(|(i, x)| m.insert(key(x), i as u64).ok())
                    .collect();
                // 10k unique positions scattered through the sequence
                let n = handles.len();
                let mut sel = std::collections::HashSet::with_capacity(10_000);
                let mut s = 0x9e3779b97f4a7c15u64;
                while sel.len() < 10_000 {
                    s = s.wrapping_mul(2862933555777941757).wrapping_add(3037000493);
                    sel.insert((s as usize) % n);
                }
                let to_remove: Vec<Handle> = sel.into_iter().map(|i| handles[i]).collect();
                (m, to_remove)
            },
            |(mut m, to_remove)| {
                for h in to_remove {
                    let _ = m.remove(h);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_walk_100k(c: &mut Criterion) {
    c.bench_function("linked::walk_links_100k", |b| {
        let mut m = LinkedHandleMap::new();
        for (i, x) in lcg(999).take(100_000).enumerate() {
            let _ = m.insert(key(x), i as u64);
        }
        b.iter(|| {
            let mut sum = 0u64;
            let mut at = m.head();
            while let Some(h) = at {
                sum = sum.wrapping_add(h.value(&m).copied().unwrap_or(0));
                at = m.next_of(h);
            }
            black_box(sum)
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
    name = benches;
    config = bench_config();
    targets = bench_insert_fresh_100k, bench_unlink_random_10k, bench_walk_100k
}
criterion_main!(benches);
