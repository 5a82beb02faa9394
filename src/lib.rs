//! archsearch - Multi-objective neural architecture search
//!
//! This crate searches a discrete space of small dense-network topologies for
//! architectures that trade accuracy against parameter count:
//! - Architecture encoding, sampling and variation operators
//! - Memoized, thread-safe objective evaluation
//! - NSGA-II, random and hybrid search strategies
//! - Per-generation logbooks and JSON run reports
//!
//! # Modules
//!
//! ## Search Core
//! - [`nas`] - Genome, search space, crossover/mutation, evaluator boundary
//! - [`optimizer`] - NSGA-II engine, random sampler, hybrid combiner
//! - [`cache`] - Session-scoped evaluation cache
//!
//! ## Reporting
//! - [`monitoring`] - Logbook and result statistics
//! - [`tracking`] - Serializable search reports
//!
//! ## Infrastructure
//! - [`utils`] - Bounded evaluation worker pool
//! - [`cli`] - Command-line interface
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use archsearch::prelude::*;
//!
//! let cache = Arc::new(EvaluationCache::new(SyntheticEvaluator::with_dims(2048, 10)));
//! let config = SearchConfig::new().with_pop_size(20).with_generations(10);
//! let outcome = Nsga2Engine::new(config, cache)?.run()?;
//! println!("{}", outcome.logbook);
//! # Ok::<(), archsearch::ArchSearchError>(())
//! ```

// Core error handling
pub mod error;

// Search core
pub mod nas;
pub mod cache;
pub mod optimizer;

// Reporting
pub mod monitoring;
pub mod tracking;

// Infrastructure
pub mod utils;
pub mod cli;

pub use error::{ArchSearchError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{ArchSearchError, Result};

    // Genome and evaluation
    pub use crate::nas::{
        Architecture, DeadlineEvaluator, Fitness, ObjectiveEvaluator, SearchSpace,
        SyntheticEvaluator,
    };
    pub use crate::cache::{CachePolicy, CacheStats, EvaluationCache};

    // Search strategies
    pub use crate::optimizer::{
        pareto_front, EvaluatedArchitecture, HallOfFame, HybridCombiner, HybridOutcome,
        Individual, Nsga2Engine, Nsga2Outcome, RandomSampler, SearchConfig,
    };

    // Reporting
    pub use crate::monitoring::{Logbook, LogbookRow, ResultStatistics};
    pub use crate::tracking::{SearchReport, Strategy};

    // Infrastructure
    pub use crate::utils::{EvaluationPool, ParallelConfig};
}
