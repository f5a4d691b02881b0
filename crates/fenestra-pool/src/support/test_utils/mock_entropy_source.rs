// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::EntropyError;
use crate::pool::SourceId;
use crate::traits::EntropySource;

/// Configurable behavior for [`MockEntropySource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockEntropySourceBehaviour {
    /// Fill with the configured byte.
    Constant(u8),
    /// Always fail fill_bytes.
    FailAlways,
    /// Fail fill_bytes on the Nth call (1-indexed: 1 = first call fails).
    FailAtNthFillBytes(usize),
}

/// Deterministic entropy source for testing.
///
/// The call counter is shared, so a clone kept by the test observes calls
/// made through the copy registered with the pool.
#[derive(Debug, Clone)]
pub struct MockEntropySource {
    id: SourceId,
    behaviour: MockEntropySourceBehaviour,
    fill_bytes_count: Arc<AtomicUsize>,
}

impl MockEntropySource {
    /// Creates a mock with the specified behaviour.
    pub fn new(id: SourceId, behaviour: MockEntropySourceBehaviour) -> Self {
        Self {
            id,
            behaviour,
            fill_bytes_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Returns the current call count.
    pub fn call_count(&self) -> usize {
        self.fill_bytes_count.load(Ordering::SeqCst)
    }
}

impl EntropySource for MockEntropySource {
    fn id(&self) -> SourceId {
        self.id
    }

    fn fill_bytes(&self, dest: &mut [u8]) -> Result<(), EntropyError> {
        let current = self.fill_bytes_count.fetch_add(1, Ordering::SeqCst) + 1;

        match self.behaviour {
            MockEntropySourceBehaviour::Constant(byte) => {
                dest.fill(byte);
                Ok(())
            }
            MockEntropySourceBehaviour::FailAlways => Err(EntropyError::EntropyNotAvailable),
            MockEntropySourceBehaviour::FailAtNthFillBytes(n) if current == n => {
                Err(EntropyError::EntropyNotAvailable)
            }
            MockEntropySourceBehaviour::FailAtNthFillBytes(_) => {
                dest.fill(0x5A);
                Ok(())
            }
        }
    }
}
