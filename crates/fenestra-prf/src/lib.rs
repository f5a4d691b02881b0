// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! # fenestra_prf
//!
//! The keyed stream primitive behind every Fenestra generator.
//!
//! ## Core Types
//!
//! - [`Prf`]: interface a generator needs from its stream cipher
//! - [`ChaCha20Prf`]: ChaCha20 (RFC 8439 block function) in fast-key-erasure mode
//!
//! ## Fast key erasure
//!
//! After every [`Prf::generate`] call the next keystream block replaces the
//! key and the block counter restarts. Capturing the state after a call
//! therefore reveals nothing about output already handed out.
//!
//! ## Example
//!
//! ```rust
//! use fenestra_prf::{ChaCha20Prf, Prf};
//!
//! let mut prf = ChaCha20Prf::unkeyed();
//! prf.set_key(&[0x42; 32]);
//!
//! let mut out = [0u8; 48];
//! prf.generate(&mut out);
//! ```

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

#[cfg(test)]
mod tests;

mod chacha20;
mod traits;

pub use chacha20::ChaCha20Prf;
pub use traits::Prf;

/// Key length in bytes shared by every [`Prf`].
pub const KEY_LEN: usize = 32;

/// A PRF key.
pub type Key = [u8; KEY_LEN];
