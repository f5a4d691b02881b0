// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

use std::sync::atomic::Ordering;

use fenestra_prf::{ChaCha20Prf, Prf};
use proptest::prelude::*;
use serial_test::serial;

use crate::brng::Brng;
use crate::lock::LockClass;

use super::helpers::{PROBE_DROPPED_DIRTY, PROBE_DROPPED_WIPED, ProbePrf, is_all_zero};

fn seeded(class: LockClass, key: [u8; 32], generation: u64) -> Brng {
    let brng = Brng::unseeded(class);
    brng.set_key_and_generation(&key, generation);
    brng
}

// =============================================================================
// Determinism
// =============================================================================

#[test]
fn test_same_key_same_output() {
    let a = seeded(LockClass::Cpu, [0x42; 32], 1);
    let b = seeded(LockClass::Cpu, [0x42; 32], 1);

    for len in [1usize, 32, 64, 65, 1000] {
        let mut out_a = vec![0u8; len];
        let mut out_b = vec![0u8; len];
        a.read(&mut out_a);
        b.read(&mut out_b);

        assert_eq!(out_a, out_b);
        assert!(!is_all_zero(&out_a));
    }
}

#[test]
fn test_different_keys_different_output() {
    let a = seeded(LockClass::Cpu, [0x42; 32], 1);
    let b = seeded(LockClass::Cpu, [0x43; 32], 1);

    let mut out_a = [0u8; 64];
    let mut out_b = [0u8; 64];
    a.read(&mut out_a);
    b.read(&mut out_b);

    assert_ne!(out_a, out_b);
}

#[test]
fn test_consecutive_reads_differ() {
    let brng = seeded(LockClass::Cpu, [0x42; 32], 1);

    let mut first = [0u8; 32];
    let mut second = [0u8; 32];
    brng.read(&mut first);
    brng.read(&mut second);

    assert_ne!(first, second);
}

proptest! {
    #[test]
    fn prop_same_key_same_output(key in any::<[u8; 32]>(), lens in prop::collection::vec(0usize..300, 1..6)) {
        let a = seeded(LockClass::Cpu, key, 1);
        let b = seeded(LockClass::Cpu, key, 1);

        for len in lens {
            let mut out_a = vec![0u8; len];
            let mut out_b = vec![0u8; len];
            a.read(&mut out_a);
            b.read(&mut out_b);

            prop_assert_eq!(out_a, out_b);
        }
    }
}

// =============================================================================
// Generation
// =============================================================================

#[test]
fn test_unseeded_generation_is_zero() {
    let brng: Brng = Brng::unseeded(LockClass::Cpu);

    assert_eq!(brng.generation(), 0);
    assert!(!brng.is_seeded());
}

#[test]
fn test_generation_mirror_tracks_locked_value() {
    let brng = seeded(LockClass::Cpu, [1; 32], 3);

    assert_eq!(brng.generation(), 3);
    assert_eq!(brng.lock().generation(), 3);

    brng.set_key_and_generation(&[2; 32], 7);
    assert_eq!(brng.generation(), 7);
    assert_eq!(brng.lock().generation(), 7);
}

#[test]
fn test_equal_generation_is_accepted() {
    let brng = seeded(LockClass::Cpu, [1; 32], 4);
    brng.set_key_and_generation(&[2; 32], 4);

    assert_eq!(brng.generation(), 4);
}

#[test]
#[should_panic(expected = "generation must not decrease")]
fn test_decreasing_generation_panics() {
    let brng = seeded(LockClass::Cpu, [1; 32], 3);
    brng.set_key_and_generation(&[2; 32], 2);
}

#[test]
#[should_panic(expected = "generation 0 is reserved")]
fn test_zero_generation_panics() {
    let brng: Brng = Brng::unseeded(LockClass::Cpu);
    brng.set_key_and_generation(&[1; 32], 0);
}

#[test]
#[should_panic(expected = "read from an unseeded")]
fn test_unseeded_read_panics() {
    let brng: Brng = Brng::unseeded(LockClass::Root);
    let mut out = [0u8; 8];
    brng.read(&mut out);
}

// =============================================================================
// Seeding from a parent
// =============================================================================

#[test]
fn test_seed_from_inherits_parent_generation() {
    let root = seeded(LockClass::Root, [9; 32], 5);
    let child: Brng = Brng::unseeded(LockClass::Cpu);

    assert_eq!(child.seed_from(&root), 5);
    assert_eq!(child.generation(), 5);
}

#[test]
fn test_seed_from_output_differs_from_parent() {
    let root = seeded(LockClass::Root, [9; 32], 1);
    let child: Brng = Brng::unseeded(LockClass::Cpu);
    child.seed_from(&root);

    let mut from_root = [0u8; 32];
    let mut from_child = [0u8; 32];
    root.read(&mut from_root);
    child.read(&mut from_child);

    assert_ne!(from_root, from_child);
}

#[test]
fn test_seed_from_older_parent_is_discarded() {
    let root = seeded(LockClass::Root, [9; 32], 3);
    let child = seeded(LockClass::Cpu, [4; 32], 5);
    let twin = seeded(LockClass::Cpu, [4; 32], 5);

    assert_eq!(child.seed_from(&root), 5);

    let mut from_child = [0u8; 48];
    let mut from_twin = [0u8; 48];
    child.read(&mut from_child);
    twin.read(&mut from_twin);

    assert_eq!(from_child, from_twin);
}

#[test]
#[should_panic(expected = "cannot parent")]
fn test_seed_from_child_parent_panics() {
    let parent = seeded(LockClass::Cpu, [9; 32], 1);
    let child: Brng = Brng::unseeded(LockClass::Cpu);

    child.seed_from(&parent);
}

// =============================================================================
// Key erasure
// =============================================================================

#[test]
fn test_rekey_leaves_no_trace_of_previous_key() {
    let rekeyed = seeded(LockClass::Cpu, [0xAA; 32], 1);
    rekeyed.set_key_and_generation(&[0xBB; 32], 2);
    let fresh = seeded(LockClass::Cpu, [0xBB; 32], 2);

    let mut from_rekeyed = [0u8; 128];
    let mut from_fresh = [0u8; 128];
    rekeyed.read(&mut from_rekeyed);
    fresh.read(&mut from_fresh);

    assert_eq!(from_rekeyed, from_fresh);
}

#[test]
#[serial(probe)]
fn test_drop_wipes_prf_state() {
    let wiped = PROBE_DROPPED_WIPED.load(Ordering::SeqCst);
    let dirty = PROBE_DROPPED_DIRTY.load(Ordering::SeqCst);

    let brng: Brng<ProbePrf> = Brng::unseeded(LockClass::Cpu);
    brng.set_key_and_generation(&[0x5C; 32], 1);
    drop(brng);

    assert_eq!(PROBE_DROPPED_WIPED.load(Ordering::SeqCst), wiped + 1);
    assert_eq!(PROBE_DROPPED_DIRTY.load(Ordering::SeqCst), dirty);
}

#[test]
#[serial(probe)]
fn test_probe_detects_unwiped_drop() {
    let dirty = PROBE_DROPPED_DIRTY.load(Ordering::SeqCst);

    let mut prf = ProbePrf::unkeyed();
    prf.set_key(&[0x5C; 32]);
    drop(prf);

    assert_eq!(PROBE_DROPPED_DIRTY.load(Ordering::SeqCst), dirty + 1);
}

#[test]
fn test_chacha_prf_state_is_not_zero_once_keyed() {
    use fenestra_zero::ZeroizationProbe;

    let mut prf = ChaCha20Prf::unkeyed();
    assert!(prf.is_zeroized());

    prf.set_key(&[0x01; 32]);
    assert!(!prf.is_zeroized());
}

#[test]
fn test_debug_does_not_leak_key() {
    let brng = seeded(LockClass::Cpu, [0x7E; 32], 2);
    let debug = format!("{:?}", brng);

    assert!(debug.contains("generation: 2"));
    assert!(!debug.contains("126"));
}
