// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Stack buffer for transient key material.

use core::fmt;

use crate::traits::{FastZeroizable, ZeroizationProbe};
use crate::wipe::{is_slice_zeroized, wipe_slice};

/// Fixed-size stack buffer for key material in transit, wiped on drop.
///
/// A key derived from a parent generator lives in exactly one `KeyBuf` between
/// the parent read and the child's `set_key`. The buffer never allocates, so it
/// is usable on paths that must not touch the allocator.
///
/// # Example
///
/// ```rust
/// use fenestra_zero::{KeyBuf, ZeroizationProbe};
///
/// let key = KeyBuf::<32>::from_array([7u8; 32]);
/// assert_eq!(key.as_array()[0], 7);
/// assert!(!key.is_zeroized());
/// // wiped here
/// ```
#[repr(transparent)]
pub struct KeyBuf<const N: usize> {
    bytes: [u8; N],
}

impl<const N: usize> KeyBuf<N> {
    /// Creates a zero-filled buffer.
    #[inline(always)]
    pub const fn new() -> Self {
        Self { bytes: [0u8; N] }
    }

    /// Takes ownership of `bytes`.
    ///
    /// The argument is moved, so callers holding a copy elsewhere remain
    /// responsible for wiping it.
    #[inline(always)]
    pub const fn from_array(bytes: [u8; N]) -> Self {
        Self { bytes }
    }

    /// Returns the key bytes.
    #[inline(always)]
    pub fn as_array(&self) -> &[u8; N] {
        &self.bytes
    }

    /// Returns the key bytes for filling.
    #[inline(always)]
    pub fn as_mut(&mut self) -> &mut [u8; N] {
        &mut self.bytes
    }

    /// Buffer length in bytes.
    #[inline(always)]
    pub const fn len(&self) -> usize {
        N
    }

    /// Returns `true` for a zero-length buffer.
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        N == 0
    }
}

impl<const N: usize> Default for KeyBuf<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> fmt::Debug for KeyBuf<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED KeyBuf<{N}>]")
    }
}

impl<const N: usize> FastZeroizable for KeyBuf<N> {
    #[inline(always)]
    fn fast_zeroize(&mut self) {
        wipe_slice(&mut self.bytes);
    }
}

impl<const N: usize> ZeroizationProbe for KeyBuf<N> {
    fn is_zeroized(&self) -> bool {
        is_slice_zeroized(&self.bytes)
    }
}

impl<const N: usize> Drop for KeyBuf<N> {
    fn drop(&mut self) {
        self.fast_zeroize();
    }
}
