// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use fenestra_pool::test_utils::{ManualClock, MockEntropySource, MockEntropySourceBehaviour};
use fenestra_pool::{EntropyPool, PoolConfig, SourceId};
use fenestra_prf::{Key, Prf};
use fenestra_zero::{FastZeroizable, ZeroizationProbe};

use crate::config::FenestraConfig;
use crate::fenestra::Fenestra;

pub(super) fn pool() -> (Arc<ManualClock>, Arc<EntropyPool>) {
    let clock = Arc::new(ManualClock::new());
    let pool = EntropyPool::new(PoolConfig::default(), clock.clone()).expect("Failed to new()");
    pool.register_source(Box::new(MockEntropySource::new(
        SourceId(7),
        MockEntropySourceBehaviour::Constant(0xA5),
    )));

    (clock, Arc::new(pool))
}

pub(super) fn fenestra_with(config: FenestraConfig) -> (Arc<ManualClock>, Arc<Fenestra>) {
    let (clock, pool) = pool();
    let fenestra = Fenestra::new(pool, config).expect("Failed to new()");

    (clock, fenestra)
}

pub(super) fn fenestra() -> (Arc<ManualClock>, Arc<Fenestra>) {
    fenestra_with(FenestraConfig::default().with_cpus(4))
}

pub(super) fn is_all_zero(bytes: &[u8]) -> bool {
    bytes.iter().all(|&b| b == 0)
}

// =============================================================================
// Instrumented PRFs
// =============================================================================

/// Live [`DropCountingPrf`] instances. Tests using it must run
/// `#[serial(drop_counting)]`.
pub(super) static LIVE_DROP_COUNTING: AtomicUsize = AtomicUsize::new(0);

/// Deterministic toy PRF that counts live instances.
#[derive(Debug)]
pub(super) struct DropCountingPrf {
    key: [u8; 32],
    counter: u8,
}

impl Prf for DropCountingPrf {
    fn unkeyed() -> Self {
        LIVE_DROP_COUNTING.fetch_add(1, Ordering::SeqCst);

        Self {
            key: [0u8; 32],
            counter: 0,
        }
    }

    fn set_key(&mut self, key: &Key) {
        self.key = *key;
        self.counter = 0;
    }

    fn generate(&mut self, out: &mut [u8]) {
        for (i, byte) in out.iter_mut().enumerate() {
            *byte = self.key[i % 32] ^ self.counter ^ (i as u8);
        }
        self.counter = self.counter.wrapping_add(1);
    }
}

impl FastZeroizable for DropCountingPrf {
    fn fast_zeroize(&mut self) {
        self.key.fast_zeroize();
        self.counter.fast_zeroize();
    }
}

impl ZeroizationProbe for DropCountingPrf {
    fn is_zeroized(&self) -> bool {
        self.key.is_zeroized() && self.counter.is_zeroized()
    }
}

impl Drop for DropCountingPrf {
    fn drop(&mut self) {
        LIVE_DROP_COUNTING.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Dropped [`ProbePrf`] instances whose state was already wiped, and those
/// that were not. Tests using it must run `#[serial(probe)]`.
pub(super) static PROBE_DROPPED_WIPED: AtomicUsize = AtomicUsize::new(0);
pub(super) static PROBE_DROPPED_DIRTY: AtomicUsize = AtomicUsize::new(0);

/// PRF that reports on drop whether its owner wiped it first.
#[derive(Debug)]
pub(super) struct ProbePrf {
    key: [u8; 32],
}

impl Prf for ProbePrf {
    fn unkeyed() -> Self {
        Self { key: [0u8; 32] }
    }

    fn set_key(&mut self, key: &Key) {
        self.key = *key;
    }

    fn generate(&mut self, out: &mut [u8]) {
        for (i, byte) in out.iter_mut().enumerate() {
            *byte = self.key[i % 32];
        }
    }
}

impl FastZeroizable for ProbePrf {
    fn fast_zeroize(&mut self) {
        self.key.fast_zeroize();
    }
}

impl ZeroizationProbe for ProbePrf {
    fn is_zeroized(&self) -> bool {
        self.key.is_zeroized()
    }
}

impl Drop for ProbePrf {
    fn drop(&mut self) {
        if self.is_zeroized() {
            PROBE_DROPPED_WIPED.fetch_add(1, Ordering::SeqCst);
        } else {
            PROBE_DROPPED_DIRTY.fetch_add(1, Ordering::SeqCst);
        }
    }
}
