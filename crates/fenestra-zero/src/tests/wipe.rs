// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

use proptest::prelude::*;

use crate::{FastZeroizable, ZeroizationProbe, is_slice_zeroized, wipe_slice};

#[test]
fn test_wipe_slice_zeros_all_bytes() {
    let mut data = vec![0xABu8; 1024];
    wipe_slice(&mut data);
    assert!(is_slice_zeroized(&data));
}

#[test]
fn test_wipe_slice_empty_slice() {
    let mut data: Vec<u32> = vec![];
    wipe_slice(&mut data);
    assert!(is_slice_zeroized(&data));
}

#[test]
fn test_word_arrays_wipe_in_place() {
    let mut words = [u32::MAX; 8];
    assert!(!words.is_zeroized());

    words.fast_zeroize();
    assert!(words.is_zeroized());
    assert_eq!(words, [0u32; 8]);
}

#[test]
fn test_scalars_wipe_in_place() {
    let mut counter = 0xDEAD_BEEF_u64;
    assert!(!counter.is_zeroized());

    counter.fast_zeroize();
    assert_eq!(counter, 0);
}

#[test]
fn test_single_nonzero_byte_is_detected() {
    let mut data = [0u8; 64];
    data[63] = 1;
    assert!(!data.is_zeroized());
}

proptest! {
    #[test]
    fn prop_wipe_slice_always_zeroizes(mut data in proptest::collection::vec(any::<u8>(), 0..512)) {
        data.as_mut_slice().fast_zeroize();
        prop_assert!(data.as_slice().is_zeroized());
    }
}
