// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Core traits for key erasure.

use crate::wipe::{Wipeable, is_slice_zeroized, wipe_slice};

/// Trait for verifying that a value has been zeroized.
///
/// Used by tests and assertions to check that no key material remains.
///
/// # Example
///
/// ```rust
/// use fenestra_zero::{FastZeroizable, ZeroizationProbe};
///
/// let mut value: u32 = 42;
/// assert!(!value.is_zeroized());
///
/// value.fast_zeroize();
/// assert!(value.is_zeroized());
/// ```
pub trait ZeroizationProbe {
    /// Returns `true` if every byte of the value is zero.
    fn is_zeroized(&self) -> bool;
}

/// Trait for values that can be wiped in place.
///
/// Dyn-compatible, so generator states can be wiped through
/// `&mut dyn FastZeroizable`.
pub trait FastZeroizable {
    /// Overwrites all sensitive state with zeros.
    fn fast_zeroize(&mut self);
}

macro_rules! impl_for_primitives {
    ($($t:ty),*) => {
        $(
            impl FastZeroizable for $t {
                #[inline(always)]
                fn fast_zeroize(&mut self) {
                    wipe_slice(core::slice::from_mut(self));
                }
            }

            impl ZeroizationProbe for $t {
                #[inline(always)]
                fn is_zeroized(&self) -> bool {
                    *self == <$t as Wipeable>::ZERO
                }
            }
        )*
    };
}

impl_for_primitives!(u8, u16, u32, u64, usize);

impl<T: Wipeable, const N: usize> FastZeroizable for [T; N] {
    #[inline(always)]
    fn fast_zeroize(&mut self) {
        wipe_slice(self.as_mut_slice());
    }
}

impl<T: Wipeable, const N: usize> ZeroizationProbe for [T; N] {
    fn is_zeroized(&self) -> bool {
        is_slice_zeroized(self.as_slice())
    }
}

impl<T: Wipeable> FastZeroizable for [T] {
    #[inline(always)]
    fn fast_zeroize(&mut self) {
        wipe_slice(self);
    }
}

impl<T: Wipeable> ZeroizationProbe for [T] {
    fn is_zeroized(&self) -> bool {
        is_slice_zeroized(self)
    }
}
