//! Hybrid search
//!
//! Splits the `pop_size` budget between random sampling (`num_random`
//! draws) and an NSGA-II run over the remainder. The two share the
//! evaluation cache and nothing else.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::config::SearchConfig;
use super::nsga2::{Nsga2Engine, Nsga2Outcome};
use super::population::EvaluatedArchitecture;
use super::random_search::RandomSampler;
use crate::cache::EvaluationCache;
use crate::error::{ArchSearchError, Result};
use crate::nas::Architecture;

/// Results of both halves of a hybrid run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HybridOutcome {
    /// Random draws, in draw order
    pub random: Vec<EvaluatedArchitecture>,
    /// NSGA-II run over the remaining budget
    pub nsga2: Nsga2Outcome,
    /// Random results followed by the final NSGA-II population
    pub combined: Vec<EvaluatedArchitecture>,
}

/// Runs random search and NSGA-II against one cache.
///
/// The combiner keeps what each half produced, so after a failed run
/// [`snapshot`](Self::snapshot) still returns the random draws and the
/// NSGA-II generations that completed.
pub struct HybridCombiner {
    config: SearchConfig,
    cache: Arc<EvaluationCache>,
    nsga2_seeds: Vec<Architecture>,
    random: Vec<EvaluatedArchitecture>,
    engine: Option<Nsga2Engine>,
}

impl HybridCombiner {
    /// Create a combiner; fails if the budget leaves no room for NSGA-II
    pub fn new(config: SearchConfig, cache: Arc<EvaluationCache>) -> Result<Self> {
        config.validate_hybrid()?;
        Ok(Self {
            config,
            cache,
            nsga2_seeds: Vec::new(),
            random: Vec::new(),
            engine: None,
        })
    }

    /// Warm-start the NSGA-II half with known architectures
    pub fn with_nsga2_seeds(mut self, archs: Vec<Architecture>) -> Self {
        self.nsga2_seeds = archs;
        self
    }

    /// Configuration of the NSGA-II half
    pub fn nsga2_config(&self) -> SearchConfig {
        let cfg = self.config.clone();
        let pop_size = cfg.pop_size - cfg.num_random;
        let seed = cfg.seed.wrapping_add(1);
        cfg.with_pop_size(pop_size).with_seed(seed)
    }

    /// Run random search, then NSGA-II.
    ///
    /// If the NSGA-II half stops early the error is returned and the partial
    /// results stay available through [`snapshot`](Self::snapshot).
    pub fn run(&mut self) -> Result<HybridOutcome> {
        if self.engine.is_some() {
            return Err(ArchSearchError::OperationalError(
                "hybrid search already ran".to_string(),
            ));
        }

        let mut sampler = RandomSampler::new(
            Arc::clone(&self.cache),
            self.config.seed,
            &self.config.parallel_config(),
        )?;
        self.random = sampler.sample(self.config.num_random);

        let nsga_config = self.nsga2_config();
        info!(
            num_random = self.config.num_random,
            nsga_pop_size = nsga_config.pop_size,
            generations = nsga_config.num_generations,
            "Starting NSGA-II half of hybrid search"
        );
        let engine = Nsga2Engine::new(nsga_config, Arc::clone(&self.cache))?
            .with_initial_population(std::mem::take(&mut self.nsga2_seeds));
        let engine = self.engine.insert(engine);

        if let Err(e) = engine.run() {
            error!(
                random = self.random.len(),
                error = %e,
                "NSGA-II half stopped early; keeping random results"
            );
            return Err(e);
        }

        Ok(self.snapshot())
    }

    /// Random results and the NSGA-II state reached so far
    pub fn snapshot(&self) -> HybridOutcome {
        let nsga2 = self
            .engine
            .as_ref()
            .map(Nsga2Engine::snapshot)
            .unwrap_or_default();

        let mut combined = self.random.clone();
        combined.extend(nsga2.results());

        HybridOutcome {
            random: self.random.clone(),
            nsga2,
            combined,
        }
    }

    /// Configuration
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }
}
