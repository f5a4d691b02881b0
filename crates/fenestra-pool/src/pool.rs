// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Entropy accumulation, extraction and the time-based reseed schedule.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use fenestra_zero::FastZeroizable;
use sha2::{Digest, Sha256};

use crate::clock::Clock;
use crate::error::EntropyError;
use crate::traits::{EntropySource, OneShotSource};

const HASH_LEN: usize = 32;

/// Bytes pulled from each continuous source at a reseed boundary.
const HARVEST_LEN: usize = 32;

const EXTRACT_LABEL: &[u8] = b"fenestra.pool.extract.v1";
const EXPAND_LABEL: &[u8] = b"fenestra.pool.expand.v1";
const RATCHET_LABEL: &[u8] = b"fenestra.pool.ratchet.v1";
const RESEED_LABEL: &[u8] = b"fenestra.pool.reseed.v1";
const FIRST_LIGHT_LABEL: &[u8] = b"fenestra.pool.first-light.v1";

/// Tag identifying where a sample came from. Mixed in ahead of the sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(pub u16);

/// Callback invoked with the new pool generation at every reseed boundary.
pub type ReseedCallback = dyn Fn(u64) + Send + Sync;

/// Reseed schedule.
///
/// The first boundary falls `initial_interval` after the pool is created;
/// every following interval doubles, capped at `max_interval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// First reseed interval.
    pub initial_interval: Duration,
    /// Upper bound for the doubling interval.
    pub max_interval: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(3600),
        }
    }
}

impl PoolConfig {
    fn validate(&self) -> Result<(), EntropyError> {
        if self.initial_interval.is_zero() || self.initial_interval > self.max_interval {
            return Err(EntropyError::InvalidSchedule);
        }

        Ok(())
    }
}

struct PoolState {
    accumulator: Sha256,
    chain: [u8; HASH_LEN],
    sources: Vec<Box<dyn EntropySource>>,
    one_shots: Vec<Box<dyn OneShotSource>>,
    interval: Duration,
    next_reseed: Duration,
}

impl PoolState {
    fn absorb(&mut self, source: SourceId, data: &[u8]) {
        self.accumulator.update(source.0.to_le_bytes());
        self.accumulator.update((data.len() as u64).to_le_bytes());
        self.accumulator.update(data);
    }

    /// Sources leave the list one at a time: a contribution that panics
    /// consumes only its own source.
    fn drain_one_shots(&mut self) -> usize {
        let mut count = 0;

        while !self.one_shots.is_empty() {
            let source = self.one_shots.remove(0);
            let id = source.id();
            let mut material = source.contribute();
            self.absorb(id, &material);
            material.as_mut_slice().fast_zeroize();
            count += 1;
        }

        count
    }

    fn harvest(&mut self) {
        let mut sample = [0u8; HARVEST_LEN];

        for index in 0..self.sources.len() {
            let id = self.sources[index].id();

            match self.sources[index].fill_bytes(&mut sample) {
                Ok(()) => self.absorb(id, &sample),
                Err(err) => tracing::warn!(source = id.0, %err, "entropy source skipped"),
            }
        }

        sample.fast_zeroize();
    }

    /// Expands the accumulated state into `out`, then ratchets the state.
    fn extract(&mut self, label: &[u8], out: &mut [u8]) {
        let digest = self.accumulator.finalize_reset();

        let mut prk = [0u8; HASH_LEN];
        prk.copy_from_slice(
            &Sha256::new()
                .chain_update(EXTRACT_LABEL)
                .chain_update(label)
                .chain_update(self.chain)
                .chain_update(digest)
                .finalize(),
        );

        for (index, chunk) in out.chunks_mut(HASH_LEN).enumerate() {
            let mut block = Sha256::new()
                .chain_update(EXPAND_LABEL)
                .chain_update(prk)
                .chain_update((index as u64).to_le_bytes())
                .finalize();
            chunk.copy_from_slice(&block[..chunk.len()]);
            block.as_mut_slice().fast_zeroize();
        }

        self.chain.copy_from_slice(
            &Sha256::new()
                .chain_update(RATCHET_LABEL)
                .chain_update(prk)
                .finalize(),
        );
        self.accumulator.update(self.chain);

        prk.fast_zeroize();
    }
}

/// Entropy pool: accumulates harvested input, produces seed material, and runs
/// the time-based reseed schedule.
///
/// The pool is only touched on seeding paths, so it uses a plain mutex.
pub struct EntropyPool {
    state: Mutex<PoolState>,
    generation: AtomicU64,
    callbacks: Mutex<Vec<Weak<ReseedCallback>>>,
    clock: Arc<dyn Clock>,
    max_interval: Duration,
}

impl fmt::Debug for EntropyPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntropyPool")
            .field("generation", &self.generation())
            .finish_non_exhaustive()
    }
}

impl EntropyPool {
    /// Creates an empty pool with the given schedule.
    ///
    /// # Errors
    ///
    /// Returns [`EntropyError::InvalidSchedule`] if `initial_interval` is zero
    /// or exceeds `max_interval`.
    pub fn new(config: PoolConfig, clock: Arc<dyn Clock>) -> Result<Self, EntropyError> {
        config.validate()?;

        Ok(Self::build(config, clock))
    }

    /// Creates an empty pool with the default schedule.
    pub fn with_defaults(clock: Arc<dyn Clock>) -> Self {
        Self::build(PoolConfig::default(), clock)
    }

    fn build(config: PoolConfig, clock: Arc<dyn Clock>) -> Self {
        let next_reseed = clock.now() + config.initial_interval;

        Self {
            state: Mutex::new(PoolState {
                accumulator: Sha256::new(),
                chain: [0u8; HASH_LEN],
                sources: Vec::new(),
                one_shots: Vec::new(),
                interval: config.initial_interval,
                next_reseed,
            }),
            generation: AtomicU64::new(0),
            callbacks: Mutex::new(Vec::new()),
            clock,
            max_interval: config.max_interval,
        }
    }

    fn state(&self) -> MutexGuard<'_, PoolState> {
        // Every critical section leaves the hash state consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current pool generation: the number of reseed boundaries passed.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Mixes a harvested sample into the pool.
    pub fn add_entropy(&self, source: SourceId, data: &[u8]) {
        self.state().absorb(source, data);
    }

    /// Registers a continuous source harvested at every reseed boundary.
    pub fn register_source(&self, source: Box<dyn EntropySource>) {
        self.state().sources.push(source);
    }

    /// Registers a first-light source. It contributes exactly once, at
    /// [`first_light`](Self::first_light) or at the next reseed boundary.
    pub fn register_one_shot(&self, source: Box<dyn OneShotSource>) {
        self.state().one_shots.push(source);
    }

    /// Number of one-shot sources that have not contributed yet.
    pub fn pending_one_shots(&self) -> usize {
        self.state().one_shots.len()
    }

    /// Registers `callback` to run at every reseed boundary.
    ///
    /// The pool only keeps a weak reference: the callback stays registered
    /// for as long as the caller holds the `Arc`, and is pruned at the next
    /// boundary after it is dropped.
    pub fn register_reseed_callback(&self, callback: &Arc<ReseedCallback>) {
        self.callbacks().push(Arc::downgrade(callback));
    }

    /// Number of registered callbacks that are still alive.
    pub fn reseed_callbacks(&self) -> usize {
        let mut callbacks = self.callbacks();
        callbacks.retain(|callback| callback.strong_count() > 0);

        callbacks.len()
    }

    fn callbacks(&self) -> MutexGuard<'_, Vec<Weak<ReseedCallback>>> {
        self.callbacks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fills `out` with fresh seed material and returns the pool generation it
    /// was drawn at. Never blocks on entropy.
    pub fn produce_seed_material(&self, out: &mut [u8]) -> u64 {
        let mut state = self.state();
        state.extract(RESEED_LABEL, out);

        self.generation()
    }

    /// Initial seed material: drains every pending one-shot source, harvests
    /// the continuous sources once, and extracts into `out`.
    pub fn first_light(&self, out: &mut [u8]) -> u64 {
        let mut state = self.state();

        let drained = state.drain_one_shots();
        state.harvest();
        state.extract(FIRST_LIGHT_LABEL, out);

        tracing::debug!(one_shots = drained, "first light gathered");

        self.generation()
    }

    /// Runs the schedule: if a reseed boundary has passed, harvests, bumps
    /// the generation and fires callbacks. Returns the new generation when a
    /// boundary was crossed.
    ///
    /// The due check and the crossing happen under one lock, so concurrent
    /// pollers cross a given boundary once.
    pub fn poll(&self) -> Option<u64> {
        let now = self.clock.now();

        let generation = {
            let mut state = self.state();
            if now < state.next_reseed {
                return None;
            }

            self.cross_boundary(&mut state, now)
        };

        self.notify(generation);

        Some(generation)
    }

    /// Crosses a reseed boundary immediately, regardless of the schedule.
    pub fn trigger_reseed(&self) -> u64 {
        let now = self.clock.now();
        let generation = self.cross_boundary(&mut self.state(), now);

        self.notify(generation);

        generation
    }

    fn cross_boundary(&self, state: &mut PoolState, now: Duration) -> u64 {
        state.drain_one_shots();
        state.harvest();

        state.interval = state.interval.saturating_mul(2).min(self.max_interval);
        state.next_reseed = now + state.interval;

        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::debug!(generation, "pool reseed boundary");

        generation
    }

    /// Fires live callbacks outside every pool lock and prunes dead ones.
    fn notify(&self, generation: u64) {
        let live: Vec<Arc<ReseedCallback>> = {
            let mut callbacks = self.callbacks();
            callbacks.retain(|callback| callback.strong_count() > 0);
            callbacks.iter().filter_map(Weak::upgrade).collect()
        };

        for callback in live {
            callback(generation);
        }
    }

    /// Length of the interval that ends at the next boundary.
    pub fn current_interval(&self) -> Duration {
        self.state().interval
    }

    /// Time at which the next boundary falls, on the pool's clock.
    pub fn next_reseed_at(&self) -> Duration {
        self.state().next_reseed
    }
}
