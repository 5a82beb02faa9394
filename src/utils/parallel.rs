//! Parallel evaluation utilities

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::EvaluationCache;
use crate::error::Result;
use crate::nas::{Architecture, Fitness};

/// Configuration for parallel evaluation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParallelConfig {
    /// Number of worker threads (None = use all available)
    pub n_threads: Option<usize>,
}

impl ParallelConfig {
    /// Create a new parallel configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set number of threads
    pub fn with_threads(mut self, n: usize) -> Self {
        self.n_threads = Some(n);
        self
    }

    /// Get the number of threads to use
    pub fn num_threads(&self) -> usize {
        self.n_threads
            .filter(|&n| n > 0)
            .unwrap_or_else(rayon::current_num_threads)
    }
}

/// Bounded worker pool for objective evaluations.
///
/// Every batch call blocks until all of its evaluations are done, which is
/// the per-generation barrier the engine relies on. Results come back in
/// input order, whatever order the workers finish in.
pub struct EvaluationPool {
    pool: rayon::ThreadPool,
}

impl EvaluationPool {
    /// Build a pool from configuration
    pub fn new(config: &ParallelConfig) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.num_threads())
            .thread_name(|i| format!("archsearch-worker-{}", i))
            .build()?;
        Ok(Self { pool })
    }

    /// Build a pool with `n` workers
    pub fn with_threads(n: usize) -> Result<Self> {
        Self::new(&ParallelConfig::new().with_threads(n))
    }

    /// Number of worker threads
    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Evaluate a batch through the cache
    pub fn evaluate_all(&self, cache: &EvaluationCache, archs: &[Architecture]) -> Vec<Fitness> {
        debug!(batch = archs.len(), workers = self.num_threads(), "Dispatching evaluations");
        self.pool
            .install(|| archs.par_iter().map(|arch| cache.evaluate(arch)).collect())
    }
}
