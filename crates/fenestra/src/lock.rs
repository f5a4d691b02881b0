// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Spin lock with an always-on lock-order witness.
//!
//! Generator locks are held for a bounded amount of cipher work and never
//! across I/O or allocation, so waiters spin instead of sleeping. Every
//! acquisition is checked against the locks the current thread already holds:
//! a lock may only be taken while every held lock belongs to an earlier class.
//! Root-then-child is therefore the only legal nesting, and child-child or
//! child-then-root panics.

use core::cell::{Cell, UnsafeCell};
use core::fmt;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicBool, Ordering};

/// Spins before yielding the time slice to a preempted holder.
const SPINS_BEFORE_YIELD: u32 = 64;

/// Lock classes, in the only order they may nest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum LockClass {
    /// The root generator.
    Root = 0,
    /// A per-CPU generator.
    Cpu = 1,
}

impl LockClass {
    const ALL: [LockClass; 2] = [LockClass::Root, LockClass::Cpu];

    #[inline(always)]
    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

thread_local! {
    static HELD: Cell<u8> = const { Cell::new(0) };
}

fn witness_acquire(class: LockClass) {
    HELD.with(|held| {
        let mask = held.get();
        // Bits for `class` and every later class.
        let conflicting = mask & !(class.bit() - 1);

        if conflicting != 0 {
            let holding: Vec<LockClass> = LockClass::ALL
                .into_iter()
                .filter(|c| conflicting & c.bit() != 0)
                .collect();
            panic!("lock order violation: acquiring {class:?} while holding {holding:?}");
        }

        held.set(mask | class.bit());
    });
}

fn witness_release(class: LockClass) {
    // Thread-local storage may already be gone during thread teardown.
    let _ = HELD.try_with(|held| held.set(held.get() & !class.bit()));
}

/// Classes the current thread holds, in nesting order.
pub fn held_lock_classes() -> Vec<LockClass> {
    let mask = HELD.with(Cell::get);

    LockClass::ALL
        .into_iter()
        .filter(|c| mask & c.bit() != 0)
        .collect()
}

/// Spins until `done` returns `true`, yielding now and then.
pub(crate) fn spin_until(mut done: impl FnMut() -> bool) {
    let mut spins = 0u32;

    while !done() {
        if spins < SPINS_BEFORE_YIELD {
            spins += 1;
            core::hint::spin_loop();
        } else {
            std::thread::yield_now();
        }
    }
}

pub(crate) struct SpinLock<T> {
    locked: AtomicBool,
    class: LockClass,
    value: UnsafeCell<T>,
}

// SAFETY: access to `value` is serialized by `locked`.
unsafe impl<T: Send> Sync for SpinLock<T> {}

impl<T> SpinLock<T> {
    pub(crate) const fn new(class: LockClass, value: T) -> Self {
        Self {
            locked: AtomicBool::new(false),
            class,
            value: UnsafeCell::new(value),
        }
    }

    #[inline(always)]
    pub(crate) fn class(&self) -> LockClass {
        self.class
    }

    pub(crate) fn lock(&self) -> SpinGuard<'_, T> {
        witness_acquire(self.class);

        spin_until(|| {
            self.locked
                .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
                .is_ok()
        });

        SpinGuard { lock: self }
    }

    pub(crate) fn get_mut(&mut self) -> &mut T {
        self.value.get_mut()
    }
}

pub(crate) struct SpinGuard<'a, T> {
    lock: &'a SpinLock<T>,
}

impl<T> Deref for SpinGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: the guard proves exclusive ownership of the lock.
        unsafe { &*self.lock.value.get() }
    }
}

impl<T> DerefMut for SpinGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: the guard proves exclusive ownership of the lock.
        unsafe { &mut *self.lock.value.get() }
    }
}

impl<T> Drop for SpinGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.locked.store(false, Ordering::Release);
        witness_release(self.lock.class);
    }
}

impl<T> fmt::Debug for SpinLock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpinLock")
            .field("class", &self.class)
            .field("locked", &self.locked.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
