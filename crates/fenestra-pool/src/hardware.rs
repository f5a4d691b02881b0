// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! One-shot first-light sources.

use core::fmt;

use fenestra_zero::FastZeroizable;

use crate::pool::SourceId;
use crate::traits::OneShotSource;

/// Hardware RNG instructions can transiently fail; retry before falling back.
#[cfg(target_arch = "x86_64")]
const MAX_RETRIES: usize = 10;

/// Number of 64-bit words a [`HardwareSeedSource`] contributes.
const SEED_WORDS: usize = 4;

/// One-shot source reading the CPU's hardware RNG.
///
/// - **x86_64**: RDSEED → RDRAND → `getrandom`
/// - **Other**: `getrandom`
///
/// A word that no mechanism can produce is skipped; first light still mixes
/// whatever the pool already holds.
#[derive(Debug, Default)]
pub struct HardwareSeedSource {}

impl HardwareSeedSource {
    /// Source identifier.
    pub const ID: SourceId = SourceId(2);
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "rdseed")]
unsafe fn rdseed64() -> Option<u64> {
    let mut value = 0u64;

    for _ in 0..MAX_RETRIES {
        // SAFETY: the caller checked the rdseed feature.
        if unsafe { core::arch::x86_64::_rdseed64_step(&mut value) } == 1 {
            return Some(value);
        }
        core::hint::spin_loop();
    }

    None
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "rdrand")]
unsafe fn rdrand64() -> Option<u64> {
    let mut value = 0u64;

    for _ in 0..MAX_RETRIES {
        // SAFETY: the caller checked the rdrand feature.
        if unsafe { core::arch::x86_64::_rdrand64_step(&mut value) } == 1 {
            return Some(value);
        }
    }

    None
}

#[cfg(target_arch = "x86_64")]
cpufeatures::new!(x86_64_rdseed_cpuid, "rdseed");
#[cfg(target_arch = "x86_64")]
cpufeatures::new!(x86_64_rdrand_cpuid, "rdrand");

#[cfg(target_arch = "x86_64")]
fn hardware_word() -> Option<u64> {
    if x86_64_rdseed_cpuid::get() {
        // SAFETY: feature checked above.
        if let Some(word) = unsafe { rdseed64() } {
            return Some(word);
        }
    }

    if x86_64_rdrand_cpuid::get() {
        // SAFETY: feature checked above.
        if let Some(word) = unsafe { rdrand64() } {
            return Some(word);
        }
    }

    os_word()
}

#[cfg(not(target_arch = "x86_64"))]
fn hardware_word() -> Option<u64> {
    os_word()
}

fn os_word() -> Option<u64> {
    let mut bytes = [0u8; 8];
    getrandom::fill(&mut bytes).ok()?;

    let word = u64::from_le_bytes(bytes);
    bytes.fast_zeroize();

    Some(word)
}

impl OneShotSource for HardwareSeedSource {
    fn id(&self) -> SourceId {
        Self::ID
    }

    fn contribute(self: Box<Self>) -> Vec<u8> {
        let mut material = Vec::with_capacity(SEED_WORDS * 8);

        for _ in 0..SEED_WORDS {
            if let Some(mut word) = hardware_word() {
                material.extend_from_slice(&word.to_le_bytes());
                word.fast_zeroize();
            }
        }

        material
    }
}

/// One-shot source for a seed handed over by an earlier stage (a saved seed
/// file, a boot loader, a parent process).
pub struct PresharedSeed {
    id: SourceId,
    bytes: Vec<u8>,
}

impl PresharedSeed {
    /// Wraps `bytes`; they are wiped once mixed into the pool.
    pub fn new(id: SourceId, bytes: Vec<u8>) -> Self {
        Self { id, bytes }
    }
}

impl fmt::Debug for PresharedSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresharedSeed")
            .field("id", &self.id)
            .field("len", &self.bytes.len())
            .finish_non_exhaustive()
    }
}

impl OneShotSource for PresharedSeed {
    fn id(&self) -> SourceId {
        self.id
    }

    fn contribute(mut self: Box<Self>) -> Vec<u8> {
        core::mem::take(&mut self.bytes)
    }
}

impl Drop for PresharedSeed {
    fn drop(&mut self) {
        self.bytes.as_mut_slice().fast_zeroize();
    }
}
