// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::percpu::{AllocGate, CpuId};

/// Configurable behavior for [`MockAllocGate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockAllocGateBehaviour {
    /// Admit every allocation.
    AdmitAll,
    /// Refuse every allocation.
    RefuseAll,
    /// Refuse the Nth admission check (1-indexed: 1 = first check refuses).
    RefuseAtNth(usize),
    /// Refuse allocations for one CPU slot.
    RefuseCpu(usize),
}

/// Allocation gate that simulates allocation failure.
///
/// The call counter is shared, so a clone kept by the test observes checks
/// made through the copy handed to the instance.
#[derive(Debug, Clone)]
pub struct MockAllocGate {
    behaviour: MockAllocGateBehaviour,
    admit_count: Arc<AtomicUsize>,
}

impl MockAllocGate {
    /// Creates a mock with the specified behaviour.
    pub fn new(behaviour: MockAllocGateBehaviour) -> Self {
        Self {
            behaviour,
            admit_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Returns how many admission checks were made.
    pub fn call_count(&self) -> usize {
        self.admit_count.load(Ordering::SeqCst)
    }
}

impl AllocGate for MockAllocGate {
    fn admit(&self, cpu: CpuId) -> bool {
        let current = self.admit_count.fetch_add(1, Ordering::SeqCst) + 1;

        match self.behaviour {
            MockAllocGateBehaviour::AdmitAll => true,
            MockAllocGateBehaviour::RefuseAll => false,
            MockAllocGateBehaviour::RefuseAtNth(n) => current != n,
            MockAllocGateBehaviour::RefuseCpu(refused) => cpu.0 != refused,
        }
    }
}
