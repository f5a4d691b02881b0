// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Buffered key-erasing generator.

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

use fenestra_prf::{ChaCha20Prf, KEY_LEN, Key, Prf};
use fenestra_zero::{FastZeroizable, KeyBuf};

use crate::lock::{LockClass, SpinGuard, SpinLock};

struct BrngState<P> {
    prf: P,
    generation: u64,
}

/// A PRF instance plus the generation it was last seeded at, behind a spin
/// lock.
///
/// `generation == 0` means the generator was never seeded. The generation
/// never decreases; an attempt to lower it is a fatal invariant violation.
/// Key material enters only through
/// [`set_key_and_generation`](BrngGuard::set_key_and_generation) and the PRF
/// state is wiped when the generator is dropped.
pub struct Brng<P: Prf = ChaCha20Prf> {
    state: SpinLock<BrngState<P>>,
    // Mirror of `state.generation`, release-stored under the lock.
    generation: AtomicU64,
}

impl<P: Prf> Brng<P> {
    /// Creates an unseeded generator in lock class `class`.
    pub fn unseeded(class: LockClass) -> Self {
        Self {
            state: SpinLock::new(
                class,
                BrngState {
                    prf: P::unkeyed(),
                    generation: 0,
                },
            ),
            generation: AtomicU64::new(0),
        }
    }

    /// Lock class of this generator.
    pub fn class(&self) -> LockClass {
        self.state.class()
    }

    /// Lock-free acquire-load of the generation.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Returns `true` once a key has been installed.
    pub fn is_seeded(&self) -> bool {
        self.generation() != 0
    }

    /// Takes the generator's lock.
    pub fn lock(&self) -> BrngGuard<'_, P> {
        BrngGuard {
            brng: self,
            state: self.state.lock(),
        }
    }

    /// Fills `out` with generator output.
    ///
    /// # Panics
    ///
    /// Panics if the generator was never seeded.
    pub fn read(&self, out: &mut [u8]) {
        self.lock().read(out);
    }

    /// Installs `key` and `generation` under the lock.
    ///
    /// # Panics
    ///
    /// Panics if `generation` is zero or lower than the current generation.
    pub fn set_key_and_generation(&self, key: &Key, generation: u64) {
        self.lock().set_key_and_generation(key, generation);
    }

    /// Registers the parent-then-child lock order with the witness by taking
    /// and releasing this generator's lock while `parent` is held.
    ///
    /// # Panics
    ///
    /// Panics if `parent` does not belong to an earlier lock class.
    pub fn witness_order(&self, parent: &BrngGuard<'_, P>) {
        assert!(
            parent.class() < self.class(),
            "{:?} generator cannot parent a {:?} generator",
            parent.class(),
            self.class()
        );

        drop(self.lock());
    }

    /// Rekeys this generator from `parent`'s output.
    ///
    /// The parent is locked, `KEY_LEN` bytes of its output are read into a
    /// wiped stack buffer together with its generation, and the order is
    /// witnessed before the parent lock is released. The key is then installed
    /// here, unless this generator already carries a newer generation (a
    /// concurrent rekey won), in which case the key is discarded. Returns the
    /// generation this generator ends up with.
    pub fn seed_from(&self, parent: &Brng<P>) -> u64 {
        let mut key = KeyBuf::<KEY_LEN>::new();

        let generation = {
            let mut parent = parent.lock();
            parent.read(key.as_mut());
            self.witness_order(&parent);
            parent.generation()
        };

        let mut child = self.lock();
        if generation >= child.generation() {
            child.set_key_and_generation(key.as_array(), generation);
        }

        child.generation()
    }
}

impl<P: Prf> fmt::Debug for Brng<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Brng")
            .field("class", &self.class())
            .field("generation", &self.generation())
            .finish_non_exhaustive()
    }
}

impl<P: Prf> Drop for Brng<P> {
    fn drop(&mut self) {
        self.state.get_mut().prf.fast_zeroize();
    }
}

/// Exclusive access to a [`Brng`].
pub struct BrngGuard<'a, P: Prf> {
    brng: &'a Brng<P>,
    state: SpinGuard<'a, BrngState<P>>,
}

impl<P: Prf> BrngGuard<'_, P> {
    /// Lock class of the guarded generator.
    pub fn class(&self) -> LockClass {
        self.brng.class()
    }

    /// Generation of the guarded generator.
    pub fn generation(&self) -> u64 {
        self.state.generation
    }

    /// Fills `out` with generator output.
    ///
    /// # Panics
    ///
    /// Panics if the generator was never seeded.
    pub fn read(&mut self, out: &mut [u8]) {
        assert!(
            self.state.generation != 0,
            "read from an unseeded {:?} generator",
            self.class()
        );

        self.state.prf.generate(out);
    }

    /// Installs a fresh key, overwriting the previous one, and sets the
    /// generation.
    ///
    /// # Panics
    ///
    /// Panics if `generation` is zero or lower than the current generation.
    pub fn set_key_and_generation(&mut self, key: &Key, generation: u64) {
        assert!(generation != 0, "generation 0 is reserved for unseeded generators");
        assert!(
            generation >= self.state.generation,
            "generation must not decrease: {} -> {}",
            self.state.generation,
            generation
        );

        self.state.prf.set_key(key);
        self.state.generation = generation;
        self.brng.generation.store(generation, Ordering::Release);
    }
}
