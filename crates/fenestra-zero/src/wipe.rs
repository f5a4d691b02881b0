// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Volatile slice wiping.

use core::ptr;
use core::sync::atomic::{Ordering, compiler_fence};

mod private {
    pub trait Sealed {}
}

/// Primitive element types for which all-zeros is a valid value.
///
/// Sealed: only unsigned integers implement it.
pub trait Wipeable: Copy + Eq + private::Sealed {
    /// The all-zeros value.
    const ZERO: Self;
}

macro_rules! impl_wipeable {
    ($($t:ty),*) => {
        $(
            impl private::Sealed for $t {}

            impl Wipeable for $t {
                const ZERO: Self = 0;
            }
        )*
    };
}

impl_wipeable!(u8, u16, u32, u64, usize);

/// Overwrites every element of `slice` with zero.
///
/// Writes are volatile and followed by a compiler fence so the stores survive
/// dead-store elimination even when the slice is about to be freed.
#[inline(never)]
pub fn wipe_slice<T: Wipeable>(slice: &mut [T]) {
    for elem in slice.iter_mut() {
        // SAFETY: `elem` is a valid, aligned, exclusive reference.
        unsafe { ptr::write_volatile(elem, T::ZERO) };
    }

    compiler_fence(Ordering::SeqCst);
}

/// Returns `true` when every element of `slice` is zero.
pub fn is_slice_zeroized<T: Wipeable>(slice: &[T]) -> bool {
    slice.iter().all(|elem| *elem == T::ZERO)
}
