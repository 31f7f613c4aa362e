//! Benchmark: scheduling overhead for wide fan-in and deep chains.
//!
//! - Wide: one root requesting N leaves (a single restart of the root)
//! - Deep: a chain of N nodes (each node restarts once)

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use restart_flow::{Computed, Executor, Key};
use std::hint::black_box;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Kind {
    Leaf,
    Wide,
    Chain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum BenchKey {
    Leaf(u32),
    Wide(u32),
    Chain(u32),
}

impl Key for BenchKey {
    type Kind = Kind;

    fn kind(&self) -> Kind {
        match self {
            BenchKey::Leaf(_) => Kind::Leaf,
            BenchKey::Wide(_) => Kind::Wide,
            BenchKey::Chain(_) => Kind::Chain,
        }
    }
}

fn executor() -> Executor<BenchKey, u64> {
    Executor::builder()
        .register_fn(Kind::Leaf, |key: &BenchKey, _env| match key {
            BenchKey::Leaf(n) => Ok(Computed::Done(*n as u64)),
            other => anyhow::bail!("unexpected {:?}", other),
        })
        .register_fn(Kind::Wide, |key: &BenchKey, env| {
            let BenchKey::Wide(n) = *key else {
                anyhow::bail!("unexpected {:?}", key);
            };
            let mut sum = 0;
            for i in 0..n {
                if let Some(v) = env.get_value(&BenchKey::Leaf(i)) {
                    sum += *v;
                }
            }
            if env.nodes_missing() {
                return Ok(Computed::NotFinished);
            }
            Ok(Computed::Done(sum))
        })
        .register_fn(Kind::Chain, |key: &BenchKey, env| {
            let BenchKey::Chain(n) = *key else {
                anyhow::bail!("unexpected {:?}", key);
            };
            let below = if n == 0 {
                BenchKey::Leaf(0)
            } else {
                BenchKey::Chain(n - 1)
            };
            match env.get_value(&below) {
                Some(v) => Ok(Computed::Done(*v + 1)),
                None => Ok(Computed::NotFinished),
            }
        })
        .build()
}

fn bench_wide(c: &mut Criterion) {
    let mut group = c.benchmark_group("wide_fan_in");
    let executor = executor();

    for width in [10u32, 100, 1000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, &width| {
            b.iter(|| executor.evaluate(black_box(&BenchKey::Wide(width))))
        });
    }

    group.finish();
}

fn bench_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("deep_chain");
    let executor = executor();

    for depth in [10u32, 100, 1000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, &depth| {
            b.iter(|| executor.evaluate(black_box(&BenchKey::Chain(depth))))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_wide, bench_chain);
criterion_main!(benches);
