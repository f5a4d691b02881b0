// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! StaleAwareRng - a consumer-side generator that rekeys itself whenever a
//! newer seed version is published.

use core::fmt;

use fenestra_prf::{ChaCha20Prf, KEY_LEN, Prf};
use fenestra_zero::KeyBuf;
use rand_core::{CryptoRng, RngCore};

use crate::fenestra::Fenestra;
use crate::global::global;

/// Fast-key-erasure generator keyed from a [`Fenestra`] instance.
///
/// Before producing output it compares the published seed version with the
/// generation it was keyed at. A newer version, or no key yet, forces a rekey
/// from the instance. Between reseeds output comes from the local PRF without
/// touching any shared state beyond one acquire-load.
pub struct StaleAwareRng<'a, P: Prf = ChaCha20Prf> {
    source: &'a Fenestra<P>,
    prf: ChaCha20Prf,
    keyed_at: Option<u64>,
    rekeys: u64,
}

impl StaleAwareRng<'static> {
    /// Consumer of the process-wide instance.
    pub fn from_global() -> Self {
        Self::new(global())
    }
}

impl<'a, P: Prf> StaleAwareRng<'a, P> {
    /// Creates an unkeyed consumer of `source`. The first output keys it.
    pub fn new(source: &'a Fenestra<P>) -> Self {
        Self {
            source,
            prf: ChaCha20Prf::unkeyed(),
            keyed_at: None,
            rekeys: 0,
        }
    }

    /// Generation the local key was derived at, `None` before the first
    /// output.
    pub fn keyed_at(&self) -> Option<u64> {
        self.keyed_at
    }

    /// Number of times the local key has been replaced from the source.
    pub fn rekeys(&self) -> u64 {
        self.rekeys
    }

    fn observed_version(&self) -> u64 {
        match self.source.publication() {
            Some(reader) if reader.is_compatible() => reader.seed_version(),
            _ => self.source.root_generation(),
        }
    }

    fn ensure_fresh(&mut self) {
        let observed = self.observed_version();

        if self.keyed_at.is_some_and(|keyed_at| keyed_at >= observed) {
            return;
        }

        let mut key = KeyBuf::<KEY_LEN>::new();
        let served = self.source.read_random_bytes_fresh(key.as_mut());
        self.prf.set_key(key.as_array());

        self.keyed_at = Some(served.max(observed));
        self.rekeys += 1;

        tracing::trace!(served, observed, "consumer rekeyed");
    }
}

impl<P: Prf> fmt::Debug for StaleAwareRng<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaleAwareRng")
            .field("keyed_at", &self.keyed_at)
            .field("rekeys", &self.rekeys)
            .finish_non_exhaustive()
    }
}

impl<P: Prf> RngCore for StaleAwareRng<'_, P> {
    fn next_u32(&mut self) -> u32 {
        let mut bytes = [0u8; 4];
        self.fill_bytes(&mut bytes);

        u32::from_le_bytes(bytes)
    }

    fn next_u64(&mut self) -> u64 {
        let mut bytes = [0u8; 8];
        self.fill_bytes(&mut bytes);

        u64::from_le_bytes(bytes)
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        self.ensure_fresh();
        self.prf.generate(dst);
    }
}

impl<P: Prf> CryptoRng for StaleAwareRng<'_, P> {}
