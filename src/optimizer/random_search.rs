//! Random search
//!
//! Exploratory baseline: independent draws from the search space, evaluated
//! through the shared cache with no selection pressure.

use std::sync::Arc;
use std::time::Instant;

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use tracing::info;

use super::population::EvaluatedArchitecture;
use crate::cache::EvaluationCache;
use crate::error::Result;
use crate::nas::{Architecture, SearchSpace};
use crate::utils::{EvaluationPool, ParallelConfig};

/// Uniform sampler over the architecture search space
pub struct RandomSampler {
    space: SearchSpace,
    cache: Arc<EvaluationCache>,
    pool: EvaluationPool,
    rng: Xoshiro256PlusPlus,
}

impl RandomSampler {
    /// Create a sampler evaluating through `cache`
    pub fn new(cache: Arc<EvaluationCache>, seed: u64, parallel: &ParallelConfig) -> Result<Self> {
        Ok(Self {
            space: SearchSpace::new(),
            cache,
            pool: EvaluationPool::new(parallel)?,
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        })
    }

    /// Draw and evaluate `num_samples` architectures.
    ///
    /// Results come back in draw order. Repeated draws of an already
    /// evaluated genome are answered by the cache.
    pub fn sample(&mut self, num_samples: usize) -> Vec<EvaluatedArchitecture> {
        let start = Instant::now();
        let archs: Vec<Architecture> = (0..num_samples)
            .map(|_| self.space.sample(&mut self.rng))
            .collect();

        let before = self.cache.evaluation_count();
        let fitnesses = self.pool.evaluate_all(&self.cache, &archs);
        let nevals = self.cache.evaluation_count() - before;

        let results: Vec<EvaluatedArchitecture> = archs
            .into_iter()
            .zip(fitnesses)
            .map(|(arch, fitness)| EvaluatedArchitecture::new(arch, fitness))
            .collect();

        info!(
            samples = num_samples,
            nevals,
            failed = results.iter().filter(|r| r.fitness.is_failure()).count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Random search complete"
        );

        results
    }
}
