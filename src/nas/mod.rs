//! Neural Architecture Search (NAS) Module
//!
//! Genome definition and the operators the search strategies share:
//! - Search space: the architecture encoding and its sampling distribution
//! - Variation: crossover and mutation
//! - Evaluator: the objective boundary to model training

mod search_space;
mod variation;
mod evaluator;

pub use search_space::{
    Architecture, ArchitectureKey, SearchSpace, BASE_UNITS, MAX_DROPOUT, MAX_LAYERS,
    MIN_LAYERS, WIDE_UNITS, WIDE_UNITS_PROB,
};
pub use variation::{CROSSOVER_SWAP_PROB, DEFAULT_INDPB};
pub use evaluator::{
    DeadlineEvaluator, Fitness, ObjectiveEvaluator, SyntheticConfig, SyntheticEvaluator,
    INFEASIBLE_PARAMS,
};
