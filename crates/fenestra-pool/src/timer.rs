// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Background driver for the reseed schedule.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::EntropyError;
use crate::pool::EntropyPool;

/// Thread that polls an [`EntropyPool`] every `tick`.
///
/// Dropping the timer stops and joins the thread. Use
/// [`detach`](ReseedTimer::detach) for a timer that runs for the rest of the
/// process.
#[derive(Debug)]
pub struct ReseedTimer {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ReseedTimer {
    /// Spawns the polling thread.
    ///
    /// # Errors
    ///
    /// Returns [`EntropyError::TimerSpawn`] if the OS refuses the thread.
    pub fn spawn(pool: Arc<EntropyPool>, tick: Duration) -> Result<Self, EntropyError> {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);

        let handle = thread::Builder::new()
            .name("fenestra-reseed".into())
            .spawn(move || {
                while !thread_stop.load(Ordering::Acquire) {
                    pool.poll();
                    thread::park_timeout(tick);
                }
            })
            .map_err(|_| EntropyError::TimerSpawn)?;

        tracing::debug!(?tick, "reseed timer started");

        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    /// Lets the thread outlive this handle.
    pub fn detach(mut self) {
        self.handle.take();
    }
}

impl Drop for ReseedTimer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.stop.store(true, Ordering::Release);
            handle.thread().unpark();
            let _ = handle.join();
        }
    }
}
