// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Entropy pool benchmarks: seed material extraction and reseed boundaries

use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use fenestra_pool::{EntropyPool, MonotonicClock, SourceId, SystemEntropySource};

fn pool() -> EntropyPool {
    let pool = EntropyPool::with_defaults(Arc::new(MonotonicClock::new()));
    pool.register_source(Box::new(SystemEntropySource {}));
    pool
}

fn bench_pool(c: &mut Criterion) {
    let mut group = c.benchmark_group("entropy_pool");

    group.bench_function("produce_seed_material/32B", |b| {
        let pool = pool();
        let mut key = [0u8; 32];
        b.iter(|| black_box(pool.produce_seed_material(black_box(&mut key))));
    });

    group.bench_function("add_entropy/64B", |b| {
        let pool = pool();
        let sample = [0x5Au8; 64];
        b.iter(|| pool.add_entropy(SourceId(9), black_box(&sample)));
    });

    group.bench_function("trigger_reseed", |b| {
        let pool = pool();
        b.iter(|| black_box(pool.trigger_reseed()));
    });

    group.finish();
}

criterion_group!(benches, bench_pool);
criterion_main!(benches);
