// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! The pool-fed root generator and its one-shot seeding state machine.

use core::fmt;
use core::sync::atomic::{AtomicU8, Ordering};

use fenestra_pool::EntropyPool;
use fenestra_prf::{ChaCha20Prf, KEY_LEN, Prf};
use fenestra_zero::KeyBuf;

use crate::brng::{Brng, BrngGuard};
use crate::lock::{LockClass, spin_until};

/// Seeding state: never attempted
const SEED_UNSEEDED: u8 = 0;
/// Seeding state: first light being gathered by another thread
const SEED_IN_PROGRESS: u8 = 1;
/// Seeding state: root carries generation >= 1
const SEED_DONE: u8 = 2;

/// Ownership of an in-progress seeding. Dropped without
/// [`complete`](Self::complete), for example while unwinding out of a
/// panicking one-shot source, it returns the root to unseeded.
struct SeedAttempt<'a> {
    state: &'a AtomicU8,
}

impl SeedAttempt<'_> {
    fn complete(self) {
        self.state.store(SEED_DONE, Ordering::Release);
        core::mem::forget(self);
    }
}

impl Drop for SeedAttempt<'_> {
    fn drop(&mut self) {
        self.state.store(SEED_UNSEEDED, Ordering::Release);
        tracing::warn!("root seeding abandoned, next caller retries");
    }
}

/// The authoritative generator, keyed only from the entropy pool.
///
/// Unseeded until the first read request, seeded exactly once, then rekeyed
/// from the pool at every reseed boundary with a strictly increasing
/// generation.
pub struct RootGenerator<P: Prf = ChaCha20Prf> {
    brng: Brng<P>,
    seed_state: AtomicU8,
}

impl<P: Prf> fmt::Debug for RootGenerator<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RootGenerator")
            .field("brng", &self.brng)
            .field("seed_state", &self.seed_state.load(Ordering::Relaxed))
            .finish()
    }
}

impl<P: Prf> Default for RootGenerator<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Prf> RootGenerator<P> {
    /// Creates an unseeded root.
    pub fn new() -> Self {
        Self {
            brng: Brng::unseeded(LockClass::Root),
            seed_state: AtomicU8::new(SEED_UNSEEDED),
        }
    }

    /// The underlying generator.
    pub fn brng(&self) -> &Brng<P> {
        &self.brng
    }

    /// Takes the root lock.
    pub fn lock(&self) -> BrngGuard<'_, P> {
        self.brng.lock()
    }

    /// Current root generation, `0` while unseeded.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.brng.generation()
    }

    /// Returns `true` once first light has been installed.
    #[inline]
    pub fn is_seeded(&self) -> bool {
        self.generation() != 0
    }

    /// Seeds the root from `pool` if nobody has yet.
    ///
    /// Exactly one caller gathers first light; concurrent callers spin until
    /// it is installed. Returns `Some(1)` to the caller that performed the
    /// seeding and `None` to everyone else.
    ///
    /// If the seeding caller panics, the root stays unseeded and the next
    /// caller (or a waiting one) takes over.
    #[inline]
    pub fn ensure_seeded(&self, pool: &EntropyPool) -> Option<u64> {
        if self.is_seeded() {
            return None;
        }

        self.seed_slow(pool)
    }

    #[cold]
    #[inline(never)]
    fn seed_slow(&self, pool: &EntropyPool) -> Option<u64> {
        loop {
            match self.seed_state.compare_exchange(
                SEED_UNSEEDED,
                SEED_IN_PROGRESS,
                Ordering::Acquire,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    let attempt = SeedAttempt {
                        state: &self.seed_state,
                    };

                    let mut key = KeyBuf::<KEY_LEN>::new();
                    let pool_generation = pool.first_light(key.as_mut());
                    self.brng.set_key_and_generation(key.as_array(), 1);

                    attempt.complete();

                    tracing::debug!(pool_generation, "root seeded from first light");

                    return Some(1);
                }
                Err(SEED_DONE) => return None,
                Err(_) => {
                    // Either the seeder finishes or it unwinds and the slot
                    // reopens for the next attempt.
                    spin_until(|| self.seed_state.load(Ordering::Acquire) != SEED_IN_PROGRESS);
                }
            }
        }
    }

    /// Rekeys the root from fresh pool material and bumps its generation.
    ///
    /// A no-op returning `None` while the root is unseeded: first light stays
    /// lazy. Otherwise returns the new generation. The caller publishes it
    /// after this returns, once the root lock is released.
    pub fn reseed(&self, pool: &EntropyPool) -> Option<u64> {
        if self.seed_state.load(Ordering::Acquire) != SEED_DONE {
            tracing::trace!("reseed before first light ignored");
            return None;
        }

        let mut key = KeyBuf::<KEY_LEN>::new();
        let pool_generation = pool.produce_seed_material(key.as_mut());

        let generation = {
            let mut root = self.brng.lock();
            let generation = root.generation() + 1;
            root.set_key_and_generation(key.as_array(), generation);
            generation
        };

        tracing::debug!(generation, pool_generation, "root reseeded");

        Some(generation)
    }
}
