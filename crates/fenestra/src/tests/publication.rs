// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crate::config::FenestraConfig;
use crate::page::SharedPage;
use crate::publication::{PublicationChannel, SeedVersionRecord, VDSO_ABI_VERSION};

use super::helpers::fenestra_with;

#[test]
fn test_record_layout_is_fixed() {
    assert_eq!(mem::size_of::<SeedVersionRecord>(), 16);
    assert_eq!(mem::align_of::<SeedVersionRecord>(), 8);
}

#[test]
fn test_page_fits_record() {
    let page = SharedPage::new().expect("Failed to new()");

    assert!(page.len() >= mem::size_of::<SeedVersionRecord>());
    assert!(!page.readable().is_null());
}

#[cfg(target_os = "linux")]
#[test]
fn test_reader_view_is_a_separate_mapping() {
    let page = SharedPage::new().expect("Failed to new()");

    assert_ne!(page.readable(), page.writable() as *const u8);
}

#[test]
fn test_new_channel_is_versioned_and_empty() {
    let channel = PublicationChannel::new().expect("Failed to new()");
    let reader = channel.reader();

    assert_eq!(reader.abi_version(), VDSO_ABI_VERSION);
    assert!(reader.is_compatible());
    assert_eq!(reader.seed_version(), 0);
}

#[test]
fn test_reader_observes_published_value() {
    let channel = PublicationChannel::new().expect("Failed to new()");

    channel.publish(1);
    assert_eq!(channel.reader().seed_version(), 1);

    channel.publish(4);
    assert_eq!(channel.reader().seed_version(), 4);
    assert_eq!(channel.reader().record().seed_version(), 4);
}

#[test]
fn test_publish_never_moves_backwards() {
    let channel = PublicationChannel::new().expect("Failed to new()");

    channel.publish(5);
    channel.publish(3);

    assert_eq!(channel.reader().seed_version(), 5);
}

#[test]
fn test_racing_publishers_keep_maximum() {
    let channel = PublicationChannel::new().expect("Failed to new()");

    thread::scope(|s| {
        for offset in 0..4u64 {
            let channel = &channel;
            s.spawn(move || {
                for g in (1..=250u64).map(|i| i * 4 - offset) {
                    channel.publish(g);
                }
            });
        }
    });

    assert_eq!(channel.reader().seed_version(), 1000);
}

#[test]
fn test_reader_never_observes_time_travel() {
    let channel = PublicationChannel::new().expect("Failed to new()");
    let done = AtomicBool::new(false);

    thread::scope(|s| {
        s.spawn(|| {
            for g in 1..=10_000u64 {
                channel.publish(g);
            }
            done.store(true, Ordering::Release);
        });

        s.spawn(|| {
            let reader = channel.reader();
            let mut last = 0;
            while !done.load(Ordering::Acquire) {
                let seen = reader.seed_version();
                assert!(seen >= last, "seed version went back: {last} -> {seen}");
                last = seen;
            }
        });
    });

    assert_eq!(channel.reader().seed_version(), 10_000);
}

// =============================================================================
// Through a Fenestra instance
// =============================================================================

#[test]
fn test_published_version_lower_bounds_root_generation() {
    let (_clock, fenestra) = fenestra_with(FenestraConfig::default().with_cpus(2));
    let reader = fenestra.publication().expect("Failed to publication()");
    let done = AtomicBool::new(false);

    fenestra.ensure_seeded();

    thread::scope(|s| {
        s.spawn(|| {
            for _ in 0..200 {
                fenestra.reseed_now();
            }
            done.store(true, Ordering::Release);
        });

        s.spawn(|| {
            while !done.load(Ordering::Acquire) {
                let published = reader.seed_version();
                let root = fenestra.root_generation();
                assert!(root >= published, "published {published} ahead of root {root}");
            }
        });
    });

    assert_eq!(reader.seed_version(), fenestra.root_generation());
    assert_eq!(fenestra.root_generation(), 201);
}

#[test]
fn test_disabled_page_answers_directly() {
    let (_clock, fenestra) = fenestra_with(FenestraConfig::default().with_shared_page(false));

    assert!(fenestra.publication().is_none());
    assert_eq!(fenestra.seed_version(), 0);

    let mut out = [0u8; 16];
    fenestra.read_random_bytes(&mut out);
    assert_eq!(fenestra.seed_version(), 1);

    fenestra.reseed_now();
    assert_eq!(fenestra.seed_version(), 2);
}
