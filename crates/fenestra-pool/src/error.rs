// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

use thiserror::Error;

/// Errors from entropy sources and pool setup.
#[derive(Debug, Error, Clone, Copy, Eq, PartialEq)]
pub enum EntropyError {
    /// The underlying source could not produce bytes.
    #[error("entropy source not available")]
    EntropyNotAvailable,

    /// The reseed schedule is empty or inverted.
    #[error("invalid reseed schedule: initial interval must be non-zero and not exceed the maximum")]
    InvalidSchedule,

    /// The background reseed thread could not be started.
    #[error("failed to spawn reseed timer thread")]
    TimerSpawn,
}
