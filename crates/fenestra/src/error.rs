// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Error types for fenestra.

use thiserror::Error;

/// Errors from publication page syscalls.
#[derive(Debug, Error, Clone, Copy, Eq, PartialEq)]
#[repr(u8)]
pub enum PageError {
    #[error("memfd_create failed")]
    Create = 0,

    #[error("ftruncate failed")]
    Truncate = 1,

    #[error("mmap failed")]
    Map = 2,
}

/// Invalid [`FenestraConfig`](crate::FenestraConfig).
#[derive(Debug, Error, Clone, Copy, Eq, PartialEq)]
pub enum ConfigError {
    #[error("per-CPU table needs at least one slot")]
    NoCpus,

    #[error("read chunk must be non-zero")]
    ZeroReadChunk,
}

/// Errors raised while constructing a [`Fenestra`](crate::Fenestra).
#[derive(Debug, Error, Clone, Copy, Eq, PartialEq)]
pub enum FenestraError {
    /// Shared publication page could not be set up.
    #[error("PageError: {0}")]
    Page(#[from] PageError),

    /// Configuration was rejected.
    #[error("ConfigError: {0}")]
    Config(#[from] ConfigError),
}
