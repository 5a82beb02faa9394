//! Hall of Fame
//!
//! Best architectures seen over a whole run, independent of which ones
//! survive in the population.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::nas::{Architecture, ArchitectureKey, Fitness};

/// A recorded architecture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HallOfFameEntry {
    /// Genome
    pub architecture: Architecture,
    /// Fitness at discovery
    pub fitness: Fitness,
    /// Generation in which it was first recorded
    pub generation: usize,
}

/// Bounded record of the best individuals of a run.
///
/// Ordered by accuracy (descending), then parameter count (ascending); ties
/// keep the earlier discovery first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HallOfFame {
    capacity: usize,
    entries: Vec<HallOfFameEntry>,
    #[serde(skip)]
    seen: HashSet<ArchitectureKey>,
}

impl HallOfFame {
    /// Create a Hall of Fame holding up to `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Offer candidates found in `generation`.
    ///
    /// Architectures already offered earlier are ignored, as are failures.
    /// Returns how many candidates were newly recorded.
    pub fn update<'a, I>(&mut self, candidates: I, generation: usize) -> usize
    where
        I: IntoIterator<Item = (&'a Architecture, Fitness)>,
    {
        let mut inserted = 0;

        for (architecture, fitness) in candidates {
            if fitness.is_failure() || !self.seen.insert(architecture.key()) {
                continue;
            }

            let pos = self
                .entries
                .iter()
                .position(|e| fitness.is_better_than(&e.fitness))
                .unwrap_or(self.entries.len());
            if pos >= self.capacity {
                continue;
            }

            self.entries.insert(
                pos,
                HallOfFameEntry {
                    architecture: architecture.clone(),
                    fitness,
                    generation,
                },
            );
            self.entries.truncate(self.capacity);
            inserted += 1;
        }

        inserted
    }

    /// Best entry
    pub fn best(&self) -> Option<&HallOfFameEntry> {
        self.entries.first()
    }

    /// All entries, best first
    pub fn entries(&self) -> &[HallOfFameEntry] {
        &self.entries
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for HallOfFame {
    fn default() -> Self {
        Self::new(1)
    }
}
