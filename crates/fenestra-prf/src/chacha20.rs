// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! ChaCha20 keystream with fast key erasure.

use core::fmt;
use core::sync::atomic::{Ordering, compiler_fence};

use fenestra_zero::{FastZeroizable, ZeroizationProbe};

use crate::traits::Prf;
use crate::{KEY_LEN, Key};

/// "expand 32-byte k" as little-endian words (RFC 8439 Section 2.3).
const SIGMA: [u32; 4] = [0x6170_7865, 0x3320_646e, 0x7962_2d32, 0x6b20_6574];

pub(crate) const BLOCK_LEN: usize = 64;

#[inline(always)]
fn quarter_round(s: &mut [u32; 16], a: usize, b: usize, c: usize, d: usize) {
    s[a] = s[a].wrapping_add(s[b]);
    s[d] = (s[d] ^ s[a]).rotate_left(16);

    s[c] = s[c].wrapping_add(s[d]);
    s[b] = (s[b] ^ s[c]).rotate_left(12);

    s[a] = s[a].wrapping_add(s[b]);
    s[d] = (s[d] ^ s[a]).rotate_left(8);

    s[c] = s[c].wrapping_add(s[d]);
    s[b] = (s[b] ^ s[c]).rotate_left(7);
}

/// Computes one block into `out`. `input` is words 12..16 of the state
/// (counter and nonce). `work` is scratch space owned by the caller so that it
/// can be wiped along with the rest of the state.
pub(crate) fn block(
    key: &[u32; 8],
    input: &[u32; 4],
    work: &mut [u32; 16],
    out: &mut [u8; BLOCK_LEN],
) {
    work[..4].copy_from_slice(&SIGMA);
    work[4..12].copy_from_slice(key);
    work[12..].copy_from_slice(input);

    for _ in 0..10 {
        quarter_round(work, 0, 4, 8, 12);
        quarter_round(work, 1, 5, 9, 13);
        quarter_round(work, 2, 6, 10, 14);
        quarter_round(work, 3, 7, 11, 15);

        quarter_round(work, 0, 5, 10, 15);
        quarter_round(work, 1, 6, 11, 12);
        quarter_round(work, 2, 7, 8, 13);
        quarter_round(work, 3, 4, 9, 14);
    }

    // Feed-forward of the original input words.
    for (i, word) in work.iter_mut().enumerate() {
        let original = match i {
            0..=3 => SIGMA[i],
            4..=11 => key[i - 4],
            _ => input[i - 12],
        };
        *word = word.wrapping_add(original);
    }

    for (chunk, word) in out.chunks_exact_mut(4).zip(work.iter()) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
}

/// ChaCha20 stream generator with a 64-bit block counter and a zero nonce,
/// rekeyed from its own keystream after every [`Prf::generate`] call.
pub struct ChaCha20Prf {
    key: [u32; 8],
    counter: u64,
    work: [u32; 16],
    block: [u8; BLOCK_LEN],
}

impl ChaCha20Prf {
    fn next_block(&mut self) {
        let input = [self.counter as u32, (self.counter >> 32) as u32, 0, 0];
        block(&self.key, &input, &mut self.work, &mut self.block);
        self.counter = self.counter.wrapping_add(1);
    }

    fn erase_key(&mut self) {
        self.next_block();

        for (word, bytes) in self.key.iter_mut().zip(self.block[..KEY_LEN].chunks_exact(4)) {
            *word = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        }

        self.counter = 0;
        self.block.fast_zeroize();
        self.work.fast_zeroize();
    }

    #[cfg(test)]
    pub(crate) fn key_words(&self) -> &[u32; 8] {
        &self.key
    }
}

impl Prf for ChaCha20Prf {
    fn unkeyed() -> Self {
        Self {
            key: [0; 8],
            counter: 0,
            work: [0; 16],
            block: [0; BLOCK_LEN],
        }
    }

    fn set_key(&mut self, key: &Key) {
        for (word, bytes) in self.key.iter_mut().zip(key.chunks_exact(4)) {
            *word = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        }
        compiler_fence(Ordering::SeqCst);

        self.counter = 0;
    }

    fn generate(&mut self, out: &mut [u8]) {
        for chunk in out.chunks_mut(BLOCK_LEN) {
            self.next_block();
            chunk.copy_from_slice(&self.block[..chunk.len()]);
        }

        self.erase_key();
    }
}

impl FastZeroizable for ChaCha20Prf {
    fn fast_zeroize(&mut self) {
        self.key.fast_zeroize();
        self.counter.fast_zeroize();
        self.work.fast_zeroize();
        self.block.fast_zeroize();
    }
}

impl ZeroizationProbe for ChaCha20Prf {
    fn is_zeroized(&self) -> bool {
        self.key.is_zeroized()
            && self.counter.is_zeroized()
            && self.work.is_zeroized()
            && self.block.is_zeroized()
    }
}

impl fmt::Debug for ChaCha20Prf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED ChaCha20Prf]")
    }
}

impl Drop for ChaCha20Prf {
    fn drop(&mut self) {
        self.fast_zeroize();
    }
}
