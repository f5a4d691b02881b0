// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

use crate::error::EntropyError;
use crate::pool::SourceId;

/// A source harvested at every reseed boundary.
pub trait EntropySource: Send {
    /// Identifier mixed in ahead of this source's bytes.
    fn id(&self) -> SourceId;

    /// Fills the destination buffer with fresh entropy.
    ///
    /// # Errors
    ///
    /// Returns [`EntropyError::EntropyNotAvailable`] if the source cannot
    /// produce data right now. The pool logs and skips the source.
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<(), EntropyError>;
}

/// A source that contributes exactly once, ever.
///
/// `contribute` consumes the source, so a second contribution cannot be
/// expressed.
pub trait OneShotSource: Send {
    /// Identifier mixed in ahead of this source's bytes.
    fn id(&self) -> SourceId;

    /// Returns this source's one-time material. The pool wipes it after use.
    fn contribute(self: Box<Self>) -> Vec<u8>;
}
