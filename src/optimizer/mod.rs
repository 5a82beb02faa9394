//! Architecture search strategies
//!
//! Provides the three search drivers and the selection machinery they share:
//! - Random search over the architecture space
//! - NSGA-II multi-objective evolution (accuracy vs. parameter count)
//! - Hybrid random + NSGA-II runs over a split budget
//! - Pareto ranking, crowding distance and the Hall of Fame

mod config;
mod population;
mod pareto;
mod hall_of_fame;
mod nsga2;
mod random_search;
mod hybrid;

pub use config::SearchConfig;
pub use population::{EvaluatedArchitecture, Individual};
pub use pareto::{crowding_distances, non_dominated_sort, pareto_front, select_nsga2, Ranking};
pub use hall_of_fame::{HallOfFame, HallOfFameEntry};
pub use nsga2::{EngineState, Nsga2Engine, Nsga2Outcome};
pub use random_search::RandomSampler;
pub use hybrid::{HybridCombiner, HybridOutcome};
