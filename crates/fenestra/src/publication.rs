// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Lock-free single-writer export of the root generation.

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

use crate::error::PageError;
use crate::page::SharedPage;

/// Layout version of [`SeedVersionRecord`]. Readers must check it before
/// trusting `seed_version`.
pub const VDSO_ABI_VERSION: u32 = 1;

/// Fixed-layout record at the start of the publication page.
#[repr(C)]
pub struct SeedVersionRecord {
    abi_version: u32,
    _reserved: u32,
    seed_version: AtomicU64,
}

impl SeedVersionRecord {
    /// Layout version written by the producer.
    pub fn abi_version(&self) -> u32 {
        self.abi_version
    }

    /// Acquire-load of the published generation.
    pub fn seed_version(&self) -> u64 {
        self.seed_version.load(Ordering::Acquire)
    }
}

impl fmt::Debug for SeedVersionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeedVersionRecord")
            .field("abi_version", &self.abi_version)
            .field("seed_version", &self.seed_version())
            .finish()
    }
}

/// Producer side of the channel. Owns the page.
#[derive(Debug)]
pub struct PublicationChannel {
    page: SharedPage,
}

impl PublicationChannel {
    /// Maps the page and writes an empty record (`seed_version == 0`).
    ///
    /// # Errors
    ///
    /// Returns [`PageError`] if the page cannot be created or mapped.
    pub fn new() -> Result<Self, PageError> {
        let page = SharedPage::new()?;

        // SAFETY: the page is zeroed, page-aligned, larger than the record,
        // and not yet visible to any reader.
        unsafe {
            page.writable()
                .cast::<SeedVersionRecord>()
                .write(SeedVersionRecord {
                    abi_version: VDSO_ABI_VERSION,
                    _reserved: 0,
                    seed_version: AtomicU64::new(0),
                });
        }

        Ok(Self { page })
    }

    fn producer_record(&self) -> &SeedVersionRecord {
        // SAFETY: initialised in `new`; only `seed_version` is mutated
        // afterwards, atomically.
        unsafe { &*self.page.writable().cast::<SeedVersionRecord>() }
    }

    /// Publishes `generation` with a single release `fetch_max`, so racing
    /// publishers never move the record backwards.
    pub fn publish(&self, generation: u64) {
        let previous = self
            .producer_record()
            .seed_version
            .fetch_max(generation, Ordering::Release);

        if previous < generation {
            tracing::trace!(generation, "seed version published");
        }
    }

    /// Read-only view of the record.
    pub fn reader(&self) -> PublicationReader<'_> {
        // SAFETY: the reader mapping shares the producer's backing memory,
        // which was initialised in `new`.
        let record = unsafe { &*self.page.readable().cast::<SeedVersionRecord>() };

        PublicationReader { record }
    }
}

/// Consumer view of the publication record, backed by the read-only mapping.
#[derive(Debug, Clone, Copy)]
pub struct PublicationReader<'a> {
    record: &'a SeedVersionRecord,
}

impl PublicationReader<'_> {
    /// Layout version of the record.
    pub fn abi_version(&self) -> u32 {
        self.record.abi_version()
    }

    /// Returns `true` if this build understands the record layout.
    pub fn is_compatible(&self) -> bool {
        self.abi_version() == VDSO_ABI_VERSION
    }

    /// Acquire-load of the published generation. A reader observing `g` may
    /// rely on the root having been seeded to at least `g`.
    pub fn seed_version(&self) -> u64 {
        self.record.seed_version()
    }

    /// The record itself.
    pub fn record(&self) -> &SeedVersionRecord {
        self.record
    }
}
