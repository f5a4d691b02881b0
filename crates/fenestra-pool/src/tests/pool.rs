// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

use std::collections::HashSet;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::Ordering;

use proptest::prelude::*;

use crate::support::test_utils::{
    CountingOneShot, ManualClock, MockEntropySource, MockEntropySourceBehaviour,
    PanickingOneShot,
};
use crate::{EntropyPool, PoolConfig, SourceId};

fn pool() -> EntropyPool {
    EntropyPool::new(PoolConfig::default(), Arc::new(ManualClock::new())).expect("Failed to new()")
}

#[test]
fn test_new_pool_starts_at_generation_zero() {
    assert_eq!(pool().generation(), 0);
}

#[test]
fn test_identical_input_yields_identical_material() {
    let a = pool();
    let b = pool();
    a.add_entropy(SourceId(9), b"same harvest");
    b.add_entropy(SourceId(9), b"same harvest");

    let mut out_a = [0u8; 48];
    let mut out_b = [0u8; 48];
    a.produce_seed_material(&mut out_a);
    b.produce_seed_material(&mut out_b);

    assert_eq!(out_a, out_b);
}

#[test]
fn test_source_tag_separates_identical_samples() {
    let a = pool();
    let b = pool();
    a.add_entropy(SourceId(1), b"sample");
    b.add_entropy(SourceId(2), b"sample");

    let mut out_a = [0u8; 32];
    let mut out_b = [0u8; 32];
    a.produce_seed_material(&mut out_a);
    b.produce_seed_material(&mut out_b);

    assert_ne!(out_a, out_b);
}

#[test]
fn test_consecutive_extractions_differ() {
    let pool = pool();
    pool.add_entropy(SourceId(3), b"harvest");

    let mut first = [0u8; 32];
    let mut second = [0u8; 32];
    pool.produce_seed_material(&mut first);
    pool.produce_seed_material(&mut second);

    assert_ne!(first, second);
}

#[test]
fn test_extraction_supports_odd_lengths() {
    let pool = pool();

    let mut empty = [];
    pool.produce_seed_material(&mut empty);

    let mut odd = [0u8; 77];
    pool.produce_seed_material(&mut odd);
    assert!(odd.iter().any(|&b| b != 0));
}

#[test]
fn test_first_light_drains_one_shots_exactly_once() {
    let pool = pool();
    let source = CountingOneShot::new(SourceId(40), 0x11);
    let contributions = source.contributions();
    pool.register_one_shot(Box::new(source));
    assert_eq!(pool.pending_one_shots(), 1);

    let mut key = [0u8; 32];
    pool.first_light(&mut key);
    pool.first_light(&mut key);
    pool.trigger_reseed();

    assert_eq!(contributions.load(Ordering::SeqCst), 1);
    assert_eq!(pool.pending_one_shots(), 0);
}

#[test]
fn test_first_light_depends_on_one_shot_material() {
    let a = pool();
    let b = pool();
    a.register_one_shot(Box::new(CountingOneShot::new(SourceId(40), 0x11)));
    b.register_one_shot(Box::new(CountingOneShot::new(SourceId(40), 0x22)));

    let mut key_a = [0u8; 32];
    let mut key_b = [0u8; 32];
    a.first_light(&mut key_a);
    b.first_light(&mut key_b);

    assert_ne!(key_a, key_b);
}

#[test]
fn test_panicking_one_shot_keeps_later_sources_pending() {
    let pool = pool();
    let later = CountingOneShot::new(SourceId(41), 0x33);
    let contributions = later.contributions();
    pool.register_one_shot(Box::new(PanickingOneShot::new(SourceId(40))));
    pool.register_one_shot(Box::new(later));

    let mut key = [0u8; 32];
    let result = catch_unwind(AssertUnwindSafe(|| pool.first_light(&mut key)));
    assert!(result.is_err());

    assert_eq!(pool.pending_one_shots(), 1);
    assert_eq!(contributions.load(Ordering::SeqCst), 0);

    pool.first_light(&mut key);

    assert_eq!(pool.pending_one_shots(), 0);
    assert_eq!(contributions.load(Ordering::SeqCst), 1);
}

#[test]
fn test_failing_source_is_skipped_not_fatal() {
    let pool = pool();
    let failing = MockEntropySource::new(SourceId(7), MockEntropySourceBehaviour::FailAlways);
    let probe = failing.clone();
    pool.register_source(Box::new(failing));

    let mut key = [0u8; 32];
    pool.first_light(&mut key);

    assert_eq!(probe.call_count(), 1);
    assert!(key.iter().any(|&b| b != 0));
}

#[test]
fn test_sources_are_harvested_at_every_boundary() {
    let pool = pool();
    let source = MockEntropySource::new(SourceId(8), MockEntropySourceBehaviour::Constant(0xEE));
    let probe = source.clone();
    pool.register_source(Box::new(source));

    pool.trigger_reseed();
    pool.trigger_reseed();

    assert_eq!(probe.call_count(), 2);
}

#[test]
fn test_produce_seed_material_reports_pool_generation() {
    let pool = pool();
    pool.trigger_reseed();
    pool.trigger_reseed();

    let mut out = [0u8; 32];
    assert_eq!(pool.produce_seed_material(&mut out), 2);
}

proptest! {
    #[test]
    fn prop_seed_material_never_repeats(calls in 2usize..64, len in 16usize..96) {
        let pool = pool();
        let mut seen = HashSet::new();

        for _ in 0..calls {
            let mut out = vec![0u8; len];
            pool.produce_seed_material(&mut out);
            prop_assert!(seen.insert(out));
        }
    }
}
