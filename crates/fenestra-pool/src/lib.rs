// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! # fenestra_pool
//!
//! The entropy pool that feeds the Fenestra root generator.
//!
//! Harvested input is mixed into a running SHA-256 state. Seed material is
//! expanded from that state, after which the state is ratcheted forward so
//! material handed out cannot be recomputed from anything left behind.
//!
//! ## Core Types
//!
//! - [`EntropyPool`]: accumulation, extraction and the time-based reseed schedule
//! - [`SystemEntropySource`]: continuous source backed by `getrandom`
//! - [`HardwareSeedSource`], [`PresharedSeed`]: one-shot "first light" sources
//! - [`ReseedTimer`]: background thread driving [`EntropyPool::poll`]
//!
//! ## Traits
//!
//! - [`EntropySource`]: sources harvested at every reseed boundary
//! - [`OneShotSource`]: sources that contribute exactly once
//! - [`Clock`]: time base for the schedule
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use fenestra_pool::{EntropyPool, MonotonicClock, PoolConfig, SystemEntropySource};
//!
//! let pool = EntropyPool::new(PoolConfig::default(), Arc::new(MonotonicClock::new()))
//!     .expect("valid schedule");
//! pool.register_source(Box::new(SystemEntropySource {}));
//!
//! let mut key = [0u8; 32];
//! let generation = pool.first_light(&mut key);
//! assert_eq!(generation, 0);
//! ```

#![warn(missing_docs)]
#![warn(unsafe_op_in_unsafe_fn)]

#[cfg(test)]
mod tests;

mod clock;
mod error;
mod hardware;
mod pool;
mod support;
mod system;
mod timer;
mod traits;

pub use clock::{Clock, MonotonicClock};
pub use error::EntropyError;
pub use hardware::{HardwareSeedSource, PresharedSeed};
pub use pool::{EntropyPool, PoolConfig, ReseedCallback, SourceId};
pub use system::SystemEntropySource;
pub use timer::ReseedTimer;
pub use traits::{EntropySource, OneShotSource};

#[cfg(any(test, feature = "test-utils"))]
pub use support::test_utils;
