// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

use fenestra_zero::{FastZeroizable, ZeroizationProbe};

use crate::Key;

/// Keyed stream generator used by a buffered generator.
///
/// Given the same key and the same sequence of calls, output must be
/// identical. Output must never reveal the key.
pub trait Prf: FastZeroizable + ZeroizationProbe + Send {
    /// Creates a state with no key installed (all zeros).
    fn unkeyed() -> Self
    where
        Self: Sized;

    /// Installs `key`, overwriting the previous key material.
    fn set_key(&mut self, key: &Key);

    /// Fills `out` with keystream and advances the internal state.
    fn generate(&mut self, out: &mut [u8]);
}
