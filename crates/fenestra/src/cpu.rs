// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! CPU discovery.

use crate::percpu::CpuId;

/// CPU the calling thread is running on. `CpuId(0)` where unknown.
#[cfg(target_os = "linux")]
#[inline]
pub fn current_cpu() -> CpuId {
    // SAFETY: sched_getcpu has no preconditions.
    let cpu = unsafe { libc::sched_getcpu() };

    if cpu < 0 {
        return CpuId(0);
    }

    CpuId(cpu as usize)
}

/// CPU the calling thread is running on. `CpuId(0)` where unknown.
#[cfg(not(target_os = "linux"))]
#[inline]
pub fn current_cpu() -> CpuId {
    CpuId(0)
}

/// Number of CPUs the OS has configured, online or not.
pub fn configured_cpus() -> usize {
    #[cfg(unix)]
    {
        // SAFETY: sysconf has no preconditions.
        let cpus = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_CONF) };

        if cpus > 0 {
            return cpus as usize;
        }
    }

    std::thread::available_parallelism().map_or(1, usize::from)
}
