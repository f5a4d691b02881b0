// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! # fenestra_zero
//!
//! Key-erasure primitives for the Fenestra generator hierarchy.
//!
//! Every generator in Fenestra promises that once a key is replaced, the old key
//! bytes are gone. This crate provides the small set of tools that make that
//! promise checkable:
//!
//! - [`FastZeroizable`]: overwrite a value with zeros in a way the optimizer
//!   cannot elide.
//! - [`ZeroizationProbe`]: runtime check that a value is all zeros, used by
//!   tests to verify wiping actually happened.
//! - [`KeyBuf`]: a fixed-size stack buffer for transient key material that is
//!   wiped when it goes out of scope.
//!
//! ## Example
//!
//! ```rust
//! use fenestra_zero::{FastZeroizable, KeyBuf, ZeroizationProbe};
//!
//! let mut key = KeyBuf::<32>::new();
//! key.as_mut().copy_from_slice(&[0xA5; 32]);
//! assert!(!key.is_zeroized());
//!
//! key.fast_zeroize();
//! assert!(key.is_zeroized());
//! ```

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![warn(unsafe_op_in_unsafe_fn)]

#[cfg(test)]
mod tests;

mod key_buf;
mod traits;
mod wipe;

pub use key_buf::KeyBuf;
pub use traits::{FastZeroizable, ZeroizationProbe};
pub use wipe::{Wipeable, is_slice_zeroized, wipe_slice};
