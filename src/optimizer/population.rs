//! Individuals and evaluated results

use serde::{Deserialize, Serialize};

use crate::nas::{Architecture, Fitness};

/// Member of an NSGA-II population
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    /// Genome
    pub architecture: Architecture,
    /// Fitness, absent until evaluated
    pub fitness: Option<Fitness>,
    /// Pareto rank (0 = non-dominated front)
    pub rank: usize,
    /// Crowding distance within its front
    #[serde(skip)]
    pub crowding_distance: f64,
}

impl Individual {
    /// Wrap an unevaluated architecture
    pub fn new(architecture: Architecture) -> Self {
        Self {
            architecture,
            fitness: None,
            rank: usize::MAX,
            crowding_distance: 0.0,
        }
    }

    /// Wrap an architecture with a known fitness
    pub fn evaluated(architecture: Architecture, fitness: Fitness) -> Self {
        Self {
            fitness: Some(fitness),
            ..Self::new(architecture)
        }
    }

    /// Fitness, treating a missing value as a failure
    pub fn fitness_or_failed(&self) -> Fitness {
        self.fitness.unwrap_or_else(Fitness::failed)
    }

    /// Drop fitness and selection bookkeeping after the genome changed
    pub(crate) fn invalidate(&mut self) {
        self.fitness = None;
        self.rank = usize::MAX;
        self.crowding_distance = 0.0;
    }

    /// Crowded-comparison: lower rank wins, then larger crowding distance
    pub fn crowded_better_than(&self, other: &Individual) -> bool {
        self.rank < other.rank
            || (self.rank == other.rank && self.crowding_distance > other.crowding_distance)
    }
}

/// An architecture paired with its fitness, as reported by every strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatedArchitecture {
    /// Genome
    pub architecture: Architecture,
    /// Resolved fitness
    pub fitness: Fitness,
}

impl EvaluatedArchitecture {
    /// Pair an architecture with its fitness
    pub fn new(architecture: Architecture, fitness: Fitness) -> Self {
        Self {
            architecture,
            fitness,
        }
    }
}

impl From<&Individual> for EvaluatedArchitecture {
    fn from(ind: &Individual) -> Self {
        Self::new(ind.architecture.clone(), ind.fitness_or_failed())
    }
}
