// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Write-once per-CPU generator slots.
//!
//! Each slot starts empty and is populated at most once, by compare-and-swap,
//! with a generator seeded from the root. A candidate that loses the race is
//! dropped, wiping its key. Slots are never cleared before the table drops.

use core::alloc::Layout;
use core::fmt;
use core::marker::PhantomData;
use core::ptr;
use core::sync::atomic::{AtomicPtr, AtomicU64, Ordering};

use fenestra_prf::{ChaCha20Prf, Prf};

use crate::brng::Brng;
use crate::lock::LockClass;
use crate::root::RootGenerator;

/// Index of a CPU in the per-CPU table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CpuId(pub usize);

/// Admission check run before a per-CPU generator is allocated.
///
/// Refusing sends the caller to the root generator instead.
pub trait AllocGate: Send + Sync {
    /// Returns `true` if a generator may be allocated for `cpu`.
    fn admit(&self, cpu: CpuId) -> bool;
}

/// Gate that admits every allocation; only the allocator can refuse.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemAllocGate;

impl AllocGate for SystemAllocGate {
    fn admit(&self, _cpu: CpuId) -> bool {
        true
    }
}

/// Allocates `value` on the heap, returning it back on allocation failure
/// instead of aborting.
fn try_box<T>(value: T) -> Result<Box<T>, T> {
    let layout = Layout::new::<T>();

    if layout.size() == 0 {
        return Ok(Box::new(value));
    }

    // SAFETY: layout has non-zero size.
    let ptr = unsafe { std::alloc::alloc(layout) }.cast::<T>();
    if ptr.is_null() {
        return Err(value);
    }

    // SAFETY: ptr is fresh, aligned and sized for T; Box takes ownership of
    // an allocation made with the global allocator and T's layout.
    unsafe {
        ptr.write(value);
        Ok(Box::from_raw(ptr))
    }
}

/// Counters describing how the table has been used.
#[derive(Debug, Default)]
pub struct CacheStats {
    allocated: AtomicU64,
    published: AtomicU64,
    discarded: AtomicU64,
    fallbacks: AtomicU64,
    rekeys: AtomicU64,
}

/// Point-in-time copy of [`CacheStats`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStatsSnapshot {
    /// Candidate generators allocated.
    pub allocated: u64,
    /// Candidates that won their slot.
    pub published: u64,
    /// Candidates dropped after losing a slot race.
    pub discarded: u64,
    /// Acquisitions served by the root instead of a per-CPU generator.
    pub fallbacks: u64,
    /// Per-CPU rekeys from the root after installation.
    pub rekeys: u64,
}

impl CacheStats {
    pub(crate) fn record_rekey(&self) {
        self.rekeys.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot of every counter.
    pub fn snapshot(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            allocated: self.allocated.load(Ordering::Relaxed),
            published: self.published.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
            rekeys: self.rekeys.load(Ordering::Relaxed),
        }
    }
}

/// Fixed-size table of write-once per-CPU generator slots.
pub struct CpuCache<P: Prf = ChaCha20Prf> {
    slots: Box<[AtomicPtr<Brng<P>>]>,
    stats: CacheStats,
    // Slots own their generators.
    _owns: PhantomData<Box<Brng<P>>>,
}

impl<P: Prf> CpuCache<P> {
    /// Creates a table with `cpus` empty slots.
    ///
    /// # Panics
    ///
    /// Panics if `cpus` is zero.
    pub fn new(cpus: usize) -> Self {
        assert!(cpus > 0, "per-CPU table needs at least one slot");

        let slots = (0..cpus).map(|_| AtomicPtr::new(ptr::null_mut())).collect();

        Self {
            slots,
            stats: CacheStats::default(),
            _owns: PhantomData,
        }
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if the table has no slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot index for `cpu`. Ids past the end wrap around.
    pub fn slot_index(&self, cpu: CpuId) -> usize {
        cpu.0 % self.slots.len()
    }

    /// Installed generator for `cpu`, if any.
    #[inline]
    pub fn get(&self, cpu: CpuId) -> Option<&Brng<P>> {
        let ptr = self.slots[self.slot_index(cpu)].load(Ordering::Acquire);

        // SAFETY: non-null slots point at a live Box published by `install`,
        // freed only when the table drops.
        unsafe { ptr.as_ref() }
    }

    /// Returns the generator for `cpu`, installing one seeded from `root` on
    /// first use.
    ///
    /// Never blocks and never fails: if `gate` refuses or the allocation
    /// fails, the root generator is returned instead. The root must already
    /// be seeded.
    #[inline]
    pub fn acquire<'a>(
        &'a self,
        cpu: CpuId,
        root: &'a RootGenerator<P>,
        gate: &dyn AllocGate,
    ) -> &'a Brng<P> {
        if let Some(brng) = self.get(cpu) {
            return brng;
        }

        self.install(cpu, root, gate)
    }

    #[cold]
    #[inline(never)]
    fn install<'a>(
        &'a self,
        cpu: CpuId,
        root: &'a RootGenerator<P>,
        gate: &dyn AllocGate,
    ) -> &'a Brng<P> {
        let index = self.slot_index(cpu);

        if !gate.admit(CpuId(index)) {
            return self.fall_back(index, root);
        }

        // First touch happens on the calling CPU.
        let candidate = match try_box(Brng::<P>::unseeded(LockClass::Cpu)) {
            Ok(candidate) => candidate,
            Err(_) => return self.fall_back(index, root),
        };
        self.stats.allocated.fetch_add(1, Ordering::Relaxed);

        let generation = candidate.seed_from(root.brng());
        let candidate = Box::into_raw(candidate);

        match self.slots[index].compare_exchange(
            ptr::null_mut(),
            candidate,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => {
                self.stats.published.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(cpu = index, generation, "per-CPU generator installed");

                // SAFETY: just published; lives until the table drops.
                unsafe { &*candidate }
            }
            Err(winner) => {
                // SAFETY: the candidate never became visible to anyone else.
                drop(unsafe { Box::from_raw(candidate) });
                self.stats.discarded.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(cpu = index, "lost slot race, candidate discarded");

                // SAFETY: the winner was published by another `install`.
                unsafe { &*winner }
            }
        }
    }

    fn fall_back<'a>(&self, index: usize, root: &'a RootGenerator<P>) -> &'a Brng<P> {
        self.stats.fallbacks.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(cpu = index, "serving from the root generator");

        root.brng()
    }

    /// Number of populated slots.
    pub fn populated(&self) -> usize {
        self.iter().count()
    }

    /// Installed generators with their slot index.
    pub fn iter(&self) -> impl Iterator<Item = (CpuId, &Brng<P>)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            // SAFETY: as in `get`.
            unsafe { slot.load(Ordering::Acquire).as_ref() }.map(|brng| (CpuId(index), brng))
        })
    }

    /// Usage counters.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

impl<P: Prf> fmt::Debug for CpuCache<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CpuCache")
            .field("slots", &self.len())
            .field("populated", &self.populated())
            .field("stats", &self.stats.snapshot())
            .finish()
    }
}

impl<P: Prf> Drop for CpuCache<P> {
    fn drop(&mut self) {
        for slot in self.slots.iter_mut() {
            let ptr = core::mem::replace(slot.get_mut(), ptr::null_mut());
            if !ptr.is_null() {
                // SAFETY: published by `install`; nothing else can reach it
                // once the table is exclusively borrowed.
                drop(unsafe { Box::from_raw(ptr) });
            }
        }
    }
}
