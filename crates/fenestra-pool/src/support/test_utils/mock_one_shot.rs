// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use crate::pool::SourceId;
use crate::traits::OneShotSource;

/// One-shot source that records how many times first-light material was
/// gathered from it.
#[derive(Debug, Clone)]
pub struct CountingOneShot {
    id: SourceId,
    fill: u8,
    delay: Duration,
    contributions: Arc<AtomicUsize>,
}

impl CountingOneShot {
    /// Creates a source contributing 32 bytes of `fill`.
    pub fn new(id: SourceId, fill: u8) -> Self {
        Self {
            id,
            fill,
            delay: Duration::ZERO,
            contributions: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Makes `contribute` sleep first, widening race windows in tests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Shared contribution counter.
    pub fn contributions(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.contributions)
    }
}

impl OneShotSource for CountingOneShot {
    fn id(&self) -> SourceId {
        self.id
    }

    fn contribute(self: Box<Self>) -> Vec<u8> {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        self.contributions.fetch_add(1, Ordering::SeqCst);

        vec![self.fill; 32]
    }
}

/// One-shot source whose contribution panics.
#[derive(Debug, Clone, Copy)]
pub struct PanickingOneShot {
    id: SourceId,
}

impl PanickingOneShot {
    /// Creates a source that panics when asked to contribute.
    pub fn new(id: SourceId) -> Self {
        Self { id }
    }
}

impl OneShotSource for PanickingOneShot {
    fn id(&self) -> SourceId {
        self.id
    }

    fn contribute(self: Box<Self>) -> Vec<u8> {
        panic!("one-shot source {} failed to contribute", self.id.0);
    }
}
