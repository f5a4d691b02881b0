// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Test doubles for fenestra consumers.

mod mock_alloc_gate;

pub use mock_alloc_gate::{MockAllocGate, MockAllocGateBehaviour};
