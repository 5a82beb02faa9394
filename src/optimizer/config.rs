//! Search configuration

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::CachePolicy;
use crate::error::{ArchSearchError, Result};
use crate::nas::DEFAULT_INDPB;
use crate::utils::ParallelConfig;

/// Configuration shared by the random, NSGA-II and hybrid strategies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Population size (`mu`); total budget of a hybrid run
    pub pop_size: usize,

    /// Number of NSGA-II generations
    pub num_generations: usize,

    /// Random samples (random strategy, or the random share of a hybrid run)
    pub num_random: usize,

    /// Offspring per generation (`lambda`); defaults to `pop_size`
    pub lambda: Option<usize>,

    /// Crossover probability per offspring pair
    pub cxpb: f64,

    /// Mutation probability per offspring
    pub mutpb: f64,

    /// Per-gene mutation probability
    pub indpb: f64,

    /// Random seed
    pub seed: u64,

    /// Number of evaluation workers (None = all cores)
    pub n_workers: Option<usize>,

    /// Per-evaluation deadline in seconds
    pub evaluation_timeout_secs: Option<f64>,

    /// Evaluation cache retention
    pub cache_policy: CachePolicy,

    /// Entries kept in the Hall of Fame
    pub hall_of_fame_size: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            pop_size: 20,
            num_generations: 10,
            num_random: 10,
            lambda: None,
            cxpb: 0.7,
            mutpb: 0.3,
            indpb: DEFAULT_INDPB,
            seed: 42,
            n_workers: None,
            evaluation_timeout_secs: None,
            cache_policy: CachePolicy::Unbounded,
            hall_of_fame_size: 1,
        }
    }
}

impl SearchConfig {
    /// Create a new configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set population size
    pub fn with_pop_size(mut self, n: usize) -> Self {
        self.pop_size = n;
        self
    }

    /// Builder method to set number of generations
    pub fn with_generations(mut self, n: usize) -> Self {
        self.num_generations = n;
        self
    }

    /// Builder method to set number of random samples
    pub fn with_num_random(mut self, n: usize) -> Self {
        self.num_random = n;
        self
    }

    /// Builder method to set offspring count
    pub fn with_lambda(mut self, n: usize) -> Self {
        self.lambda = Some(n);
        self
    }

    /// Builder method to set crossover and mutation probabilities
    pub fn with_variation(mut self, cxpb: f64, mutpb: f64) -> Self {
        self.cxpb = cxpb;
        self.mutpb = mutpb;
        self
    }

    /// Builder method to set per-gene mutation probability
    pub fn with_indpb(mut self, indpb: f64) -> Self {
        self.indpb = indpb;
        self
    }

    /// Builder method to set seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builder method to set number of evaluation workers
    pub fn with_workers(mut self, n: usize) -> Self {
        self.n_workers = Some(n);
        self
    }

    /// Builder method to set the evaluation deadline
    pub fn with_timeout(mut self, secs: f64) -> Self {
        self.evaluation_timeout_secs = Some(secs);
        self
    }

    /// Builder method to set cache policy
    pub fn with_cache_policy(mut self, policy: CachePolicy) -> Self {
        self.cache_policy = policy;
        self
    }

    /// Builder method to set Hall of Fame capacity
    pub fn with_hall_of_fame_size(mut self, n: usize) -> Self {
        self.hall_of_fame_size = n;
        self
    }

    /// Offspring produced per generation
    pub fn offspring_size(&self) -> usize {
        self.lambda.unwrap_or(self.pop_size)
    }

    /// Worker pool settings
    pub fn parallel_config(&self) -> ParallelConfig {
        ParallelConfig {
            n_threads: self.n_workers,
        }
    }

    /// Evaluation deadline, if configured
    pub fn evaluation_timeout(&self) -> Option<Duration> {
        self.evaluation_timeout_secs.map(Duration::from_secs_f64)
    }

    /// Check settings used by the NSGA-II engine
    pub fn validate(&self) -> Result<()> {
        if self.pop_size == 0 {
            return Err(invalid("pop_size", self.pop_size, "must be positive"));
        }
        if self.offspring_size() == 0 {
            return Err(invalid("lambda", self.offspring_size(), "must be positive"));
        }
        for (name, p) in [("cxpb", self.cxpb), ("mutpb", self.mutpb), ("indpb", self.indpb)] {
            if !(0.0..=1.0).contains(&p) {
                return Err(invalid(name, p, "must be within [0, 1]"));
            }
        }
        if let Some(t) = self.evaluation_timeout_secs {
            if !(t.is_finite() && t > 0.0) {
                return Err(invalid("evaluation_timeout_secs", t, "must be a positive number"));
            }
        }
        if let CachePolicy::Bounded { max_entries: 0 } = self.cache_policy {
            return Err(invalid("cache_policy.max_entries", 0, "must be positive"));
        }
        if self.hall_of_fame_size == 0 {
            return Err(invalid("hall_of_fame_size", 0, "must be positive"));
        }
        Ok(())
    }

    /// Check settings for a hybrid run, where `num_random` is carved out of
    /// `pop_size`
    pub fn validate_hybrid(&self) -> Result<()> {
        self.validate()?;
        if self.num_random >= self.pop_size {
            return Err(ArchSearchError::ConfigError(format!(
                "num_random ({}) must be smaller than pop_size ({}) to leave room for NSGA-II",
                self.num_random, self.pop_size
            )));
        }
        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

fn invalid(name: &str, value: impl ToString, reason: &str) -> ArchSearchError {
    ArchSearchError::InvalidParameter {
        name: name.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
