// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Process-wide instance.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use fenestra_pool::{
    EntropyPool, HardwareSeedSource, MonotonicClock, ReseedTimer, SystemEntropySource,
};

use crate::config::FenestraConfig;
use crate::fenestra::Fenestra;
use crate::publication::PublicationChannel;

/// How often the background timer polls the pool schedule.
const RESEED_TICK: Duration = Duration::from_millis(250);

static GLOBAL: OnceLock<Arc<Fenestra>> = OnceLock::new();

/// The process-wide instance, built on first use.
///
/// Its pool harvests [`SystemEntropySource`], takes first light from
/// [`HardwareSeedSource`], and is driven by a detached [`ReseedTimer`]. If the
/// shared page cannot be mapped the instance runs without it and
/// [`Fenestra::seed_version`] answers directly.
pub fn global() -> &'static Fenestra {
    GLOBAL.get_or_init(init_global)
}

#[cold]
fn init_global() -> Arc<Fenestra> {
    let pool = Arc::new(EntropyPool::with_defaults(Arc::new(MonotonicClock::new())));
    pool.register_source(Box::new(SystemEntropySource {}));
    pool.register_one_shot(Box::new(HardwareSeedSource {}));

    let publication = match PublicationChannel::new() {
        Ok(publication) => Some(publication),
        Err(error) => {
            tracing::warn!(%error, "shared page unavailable, publication disabled");
            None
        }
    };

    let fenestra = Fenestra::build(Arc::clone(&pool), FenestraConfig::default(), publication);

    match ReseedTimer::spawn(pool, RESEED_TICK) {
        Ok(timer) => timer.detach(),
        Err(error) => tracing::warn!(%error, "reseed timer unavailable, root stays at first light"),
    }

    fenestra
}

/// Fills `out` with random bytes from the process-wide instance.
pub fn read_random_bytes(out: &mut [u8]) {
    global().read_random_bytes(out);
}

/// Fills `out` from the process-wide instance and returns the lowest
/// generation that served it.
pub fn read_random_bytes_with_generation(out: &mut [u8]) -> u64 {
    global().read_random_bytes_with_generation(out)
}
