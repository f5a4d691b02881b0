// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Test doubles for pool consumers.

mod manual_clock;
mod mock_entropy_source;
mod mock_one_shot;

pub use manual_clock::ManualClock;
pub use mock_entropy_source::{MockEntropySource, MockEntropySourceBehaviour};
pub use mock_one_shot::{CountingOneShot, PanickingOneShot};
