// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! The generator hierarchy: root, per-CPU table and publication channel.

use std::fmt;
use std::sync::{Arc, Weak};

use fenestra_pool::{EntropyPool, ReseedCallback};
use fenestra_prf::{ChaCha20Prf, Prf};

use crate::brng::Brng;
use crate::config::{FenestraConfig, RekeyPolicy};
use crate::cpu::{configured_cpus, current_cpu};
use crate::error::FenestraError;
use crate::lock::LockClass;
use crate::percpu::{CacheStatsSnapshot, CpuCache, CpuId};
use crate::publication::{PublicationChannel, PublicationReader};
use crate::root::RootGenerator;

/// A root generator fed by an [`EntropyPool`], a table of per-CPU generators
/// keyed from it, and the page that publishes the root generation.
///
/// Reads are served by the calling CPU's generator, never block on entropy
/// and never fail. The root is seeded lazily on the first read and reseeded
/// at every pool reseed boundary.
pub struct Fenestra<P: Prf = ChaCha20Prf> {
    root: RootGenerator<P>,
    cpus: CpuCache<P>,
    pool: Arc<EntropyPool>,
    publication: Option<PublicationChannel>,
    config: FenestraConfig,
    /// Registered with the pool, which only holds it weakly.
    reseed_hook: Arc<ReseedCallback>,
}

impl<P: Prf> fmt::Debug for Fenestra<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fenestra")
            .field("root", &self.root)
            .field("cpus", &self.cpus)
            .field("publication", &self.publication)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<P: Prf + 'static> Fenestra<P> {
    /// Creates an instance fed by `pool` and registers it for the pool's
    /// reseed boundaries.
    ///
    /// # Errors
    ///
    /// - [`FenestraError::Config`] if `config` is invalid
    /// - [`FenestraError::Page`] if the shared page is enabled but cannot be
    ///   mapped
    pub fn new(pool: Arc<EntropyPool>, config: FenestraConfig) -> Result<Arc<Self>, FenestraError> {
        config.validate()?;

        let publication = if config.shared_page {
            Some(PublicationChannel::new()?)
        } else {
            None
        };

        Ok(Self::build(pool, config, publication))
    }

    /// `config` must already be valid.
    pub(crate) fn build(
        pool: Arc<EntropyPool>,
        mut config: FenestraConfig,
        publication: Option<PublicationChannel>,
    ) -> Arc<Self> {
        config.shared_page = publication.is_some();
        let cpus = config.cpus.unwrap_or_else(configured_cpus).max(1);

        let fenestra = Arc::new_cyclic(|weak: &Weak<Self>| {
            let weak = weak.clone();

            Self {
                root: RootGenerator::new(),
                cpus: CpuCache::new(cpus),
                pool: Arc::clone(&pool),
                publication,
                config,
                reseed_hook: Arc::new(move |pool_generation: u64| {
                    if let Some(fenestra) = weak.upgrade() {
                        fenestra.on_pool_reseed(pool_generation);
                    }
                }),
            }
        });

        pool.register_reseed_callback(&fenestra.reseed_hook);

        tracing::debug!(cpus, shared_page = fenestra.publication.is_some(), "fenestra created");

        fenestra
    }
}

impl<P: Prf> Fenestra<P> {
    fn publish(&self, generation: u64) {
        if let Some(publication) = &self.publication {
            publication.publish(generation);
        }
    }

    fn on_pool_reseed(&self, pool_generation: u64) {
        if let Some(generation) = self.root.reseed(&self.pool) {
            self.publish(generation);
            tracing::debug!(generation, pool_generation, "reseed published");
        }
    }

    /// Seeds the root from first light if no one has yet.
    pub fn ensure_seeded(&self) {
        if let Some(generation) = self.root.ensure_seeded(&self.pool) {
            self.publish(generation);
        }
    }

    /// Generator for `cpu`, installed on first use. Falls back to the root
    /// when the allocation gate refuses or allocation fails.
    pub fn acquire_cpu_brng(&self, cpu: CpuId) -> &Brng<P> {
        self.ensure_seeded();

        self.cpus.acquire(cpu, &self.root, self.config.alloc_gate.as_ref())
    }

    /// Fills `out` with random bytes from the calling CPU's generator.
    pub fn read_random_bytes(&self, out: &mut [u8]) {
        self.read_random_bytes_with_generation(out);
    }

    /// Fills `out` from the calling CPU's generator and returns the lowest
    /// generation that served any chunk of it.
    pub fn read_random_bytes_with_generation(&self, out: &mut [u8]) -> u64 {
        self.read_random_bytes_on_cpu(current_cpu(), out)
    }

    /// Like [`read_random_bytes_with_generation`](Self::read_random_bytes_with_generation),
    /// served by `cpu`'s generator.
    pub fn read_random_bytes_on_cpu(&self, cpu: CpuId, out: &mut [u8]) -> u64 {
        let catch_up = self.config.rekey_policy == RekeyPolicy::OnRead;

        self.read_from(self.acquire_cpu_brng(cpu), out, catch_up)
    }

    /// Like [`read_random_bytes_with_generation`](Self::read_random_bytes_with_generation),
    /// but a generator lagging the root is rekeyed first whatever the
    /// configured policy.
    pub fn read_random_bytes_fresh(&self, out: &mut [u8]) -> u64 {
        self.read_from(self.acquire_cpu_brng(current_cpu()), out, true)
    }

    fn read_from(&self, brng: &Brng<P>, out: &mut [u8], catch_up: bool) -> u64 {
        if catch_up && brng.class() == LockClass::Cpu && brng.generation() < self.root.generation() {
            self.rekey(brng);
        }

        if out.is_empty() {
            return brng.generation();
        }

        let mut generation = u64::MAX;
        for chunk in out.chunks_mut(self.config.read_chunk) {
            let mut guard = brng.lock();
            guard.read(chunk);
            generation = generation.min(guard.generation());
        }

        generation
    }

    fn rekey(&self, brng: &Brng<P>) -> u64 {
        let before = brng.generation();
        let generation = brng.seed_from(self.root.brng());
        self.cpus.stats().record_rekey();

        tracing::debug!(before, generation, "per-CPU generator rekeyed");

        generation
    }

    /// Rekeys `cpu`'s generator from the root. Returns the generation it ends
    /// up with, or `None` if no generator is installed for `cpu`.
    pub fn rekey_cpu(&self, cpu: CpuId) -> Option<u64> {
        let brng = self.cpus.get(cpu)?;

        Some(self.rekey(brng))
    }

    /// Rekeys every installed per-CPU generator. Returns how many there were.
    pub fn rekey_all(&self) -> usize {
        let mut rekeyed = 0;
        for (_, brng) in self.cpus.iter() {
            self.rekey(brng);
            rekeyed += 1;
        }

        rekeyed
    }

    /// Crosses a pool reseed boundary now, seeding the root first if needed.
    /// Returns the root generation afterwards.
    pub fn reseed_now(&self) -> u64 {
        self.ensure_seeded();
        self.pool.trigger_reseed();

        self.root.generation()
    }

    /// Current root generation, `0` before the first read.
    pub fn root_generation(&self) -> u64 {
        self.root.generation()
    }

    /// Last published generation, or the root generation itself when the
    /// shared page is disabled.
    pub fn seed_version(&self) -> u64 {
        match &self.publication {
            Some(publication) => publication.reader().seed_version(),
            None => self.root.generation(),
        }
    }

    /// Read-only view of the publication record, if the shared page is
    /// enabled.
    pub fn publication(&self) -> Option<PublicationReader<'_>> {
        self.publication.as_ref().map(PublicationChannel::reader)
    }

    /// Per-CPU table counters.
    pub fn stats(&self) -> CacheStatsSnapshot {
        self.cpus.stats().snapshot()
    }

    /// Size of the per-CPU table.
    pub fn cpu_count(&self) -> usize {
        self.cpus.len()
    }

    /// The root generator.
    pub fn root(&self) -> &RootGenerator<P> {
        &self.root
    }

    /// The per-CPU table.
    pub fn cache(&self) -> &CpuCache<P> {
        &self.cpus
    }

    /// The feeding pool.
    pub fn pool(&self) -> &Arc<EntropyPool> {
        &self.pool
    }

    /// Effective configuration.
    pub fn config(&self) -> &FenestraConfig {
        &self.config
    }
}
