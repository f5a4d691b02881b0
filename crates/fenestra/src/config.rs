// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Instance configuration.

use std::fmt;
use std::sync::Arc;

use crate::error::ConfigError;
use crate::percpu::{AllocGate, SystemAllocGate};

/// Bytes served per lock hold by default.
pub const DEFAULT_READ_CHUNK: usize = 4096;

/// When per-CPU generators pick up a newer root generation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum RekeyPolicy {
    /// Only through [`Fenestra::rekey_cpu`](crate::Fenestra::rekey_cpu) and
    /// [`Fenestra::rekey_all`](crate::Fenestra::rekey_all).
    #[default]
    Explicit,
    /// Before serving a read, whenever the root generation is newer.
    OnRead,
}

/// Configuration for a [`Fenestra`](crate::Fenestra) instance.
#[derive(Clone)]
pub struct FenestraConfig {
    /// Per-CPU table size. `None` uses the OS configured CPU count.
    pub cpus: Option<usize>,
    /// Map the shared publication page.
    pub shared_page: bool,
    /// Per-CPU rekey policy.
    pub rekey_policy: RekeyPolicy,
    /// Largest number of bytes generated per lock hold.
    pub read_chunk: usize,
    /// Admission check for per-CPU allocations.
    pub alloc_gate: Arc<dyn AllocGate>,
}

impl Default for FenestraConfig {
    fn default() -> Self {
        Self {
            cpus: None,
            shared_page: true,
            rekey_policy: RekeyPolicy::Explicit,
            read_chunk: DEFAULT_READ_CHUNK,
            alloc_gate: Arc::new(SystemAllocGate),
        }
    }
}

impl fmt::Debug for FenestraConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FenestraConfig")
            .field("cpus", &self.cpus)
            .field("shared_page", &self.shared_page)
            .field("rekey_policy", &self.rekey_policy)
            .field("read_chunk", &self.read_chunk)
            .finish_non_exhaustive()
    }
}

impl FenestraConfig {
    /// Sets the per-CPU table size.
    pub fn with_cpus(mut self, cpus: usize) -> Self {
        self.cpus = Some(cpus);
        self
    }

    /// Enables or disables the shared publication page.
    pub fn with_shared_page(mut self, shared_page: bool) -> Self {
        self.shared_page = shared_page;
        self
    }

    /// Sets the per-CPU rekey policy.
    pub fn with_rekey_policy(mut self, rekey_policy: RekeyPolicy) -> Self {
        self.rekey_policy = rekey_policy;
        self
    }

    /// Sets the read chunk size.
    pub fn with_read_chunk(mut self, read_chunk: usize) -> Self {
        self.read_chunk = read_chunk;
        self
    }

    /// Sets the allocation gate.
    pub fn with_alloc_gate(mut self, alloc_gate: Arc<dyn AllocGate>) -> Self {
        self.alloc_gate = alloc_gate;
        self
    }

    /// Checks the configuration.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::NoCpus`] if `cpus` is `Some(0)`
    /// - [`ConfigError::ZeroReadChunk`] if `read_chunk` is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cpus == Some(0) {
            return Err(ConfigError::NoCpus);
        }

        if self.read_chunk == 0 {
            return Err(ConfigError::ZeroReadChunk);
        }

        Ok(())
    }
}
