// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! # fenestra
//!
//! Per-CPU key-erasing random generators rekeyed from a pool-fed root.
//!
//! A single root generator is keyed from an [`EntropyPool`](fenestra_pool::EntropyPool),
//! lazily on the first read and again at every pool reseed boundary. Each CPU
//! gets its own generator, allocated on first use and keyed from root output,
//! so the read path never contends across CPUs and never blocks on entropy.
//! Every generator is a ChaCha20 instance in fast-key-erasure mode: each read
//! ends by replacing the key, so a later state compromise reveals nothing
//! about earlier output.
//!
//! The root generation is exported through a read-only page
//! ([`PublicationReader`]) so consumers can detect a reseed with one
//! acquire-load and rekey their own state ([`StaleAwareRng`]).
//!
//! ## Core Types
//!
//! - [`Fenestra`]: the hierarchy (root, per-CPU table, publication page)
//! - [`Brng`], [`BrngGuard`]: a locked PRF plus its generation
//! - [`RootGenerator`]: one-shot seeding state machine around the root
//! - [`CpuCache`]: write-once per-CPU slots
//! - [`PublicationChannel`], [`PublicationReader`]: seed version export
//! - [`StaleAwareRng`]: `rand_core` consumer that follows reseeds
//!
//! ## Lock Order
//!
//! The root lock may be held while a per-CPU lock is taken, never the other
//! way round, and two per-CPU locks never nest. The check is always compiled
//! in and panics on violation.
//!
//! ## Example
//!
//! ```rust
//! let mut key = [0u8; 32];
//! let generation = fenestra::read_random_bytes_with_generation(&mut key);
//!
//! assert!(generation >= 1);
//! assert!(fenestra::global().root_generation() >= generation);
//! ```

#![warn(missing_docs)]
#![warn(unsafe_op_in_unsafe_fn)]

#[cfg(test)]
mod tests;

mod brng;
mod config;
mod consumer;
mod cpu;
mod error;
mod fenestra;
mod global;
mod lock;
mod page;
mod percpu;
mod publication;
mod root;
mod support;

pub use brng::{Brng, BrngGuard};
pub use config::{DEFAULT_READ_CHUNK, FenestraConfig, RekeyPolicy};
pub use consumer::StaleAwareRng;
pub use cpu::{configured_cpus, current_cpu};
pub use error::{ConfigError, FenestraError, PageError};
pub use fenestra::Fenestra;
pub use global::{global, read_random_bytes, read_random_bytes_with_generation};
pub use lock::{LockClass, held_lock_classes};
pub use percpu::{AllocGate, CacheStats, CacheStatsSnapshot, CpuCache, CpuId, SystemAllocGate};
pub use publication::{
    PublicationChannel, PublicationReader, SeedVersionRecord, VDSO_ABI_VERSION,
};
pub use root::RootGenerator;

#[cfg(any(test, feature = "test-utils"))]
pub use support::test_utils;
