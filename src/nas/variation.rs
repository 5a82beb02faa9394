//! Variation operators
//!
//! Crossover and mutation over [`Architecture`]. Both operators work on
//! copies and only hand back children that pass validation, so parents are
//! never touched and a failed variation leaves nothing half-modified.

use rand::Rng;

use super::search_space::{Architecture, SearchSpace};
use crate::error::{ArchSearchError, Result};

/// Per-gene swap probability used by crossover
pub const CROSSOVER_SWAP_PROB: f64 = 0.3;
/// Default per-gene mutation probability
pub const DEFAULT_INDPB: f64 = 0.4;

impl SearchSpace {
    /// Crossover two architectures into two children.
    ///
    /// The layer counts are swapped with probability [`CROSSOVER_SWAP_PROB`],
    /// then every layer both parents share swaps its width and, separately,
    /// its dropout with the same probability. Each child is finally resized to
    /// its own layer count.
    pub fn crossover<R: Rng + ?Sized>(
        &self,
        parent1: &Architecture,
        parent2: &Architecture,
        rng: &mut R,
    ) -> Result<(Architecture, Architecture)> {
        let mut child1 = parent1.clone();
        let mut child2 = parent2.clone();

        if rng.gen_bool(CROSSOVER_SWAP_PROB) {
            std::mem::swap(&mut child1.num_layers, &mut child2.num_layers);
        }

        let shared = child1
            .num_layers
            .min(child2.num_layers)
            .min(child1.units.len())
            .min(child2.units.len());
        for i in 0..shared {
            if rng.gen_bool(CROSSOVER_SWAP_PROB) {
                std::mem::swap(&mut child1.units[i], &mut child2.units[i]);
            }
            if rng.gen_bool(CROSSOVER_SWAP_PROB) {
                std::mem::swap(&mut child1.dropout[i], &mut child2.dropout[i]);
            }
        }

        let target1 = child1.num_layers;
        let target2 = child2.num_layers;
        child1.resize_with(target1, self, rng);
        child2.resize_with(target2, self, rng);

        commit(&child1, "crossover")?;
        commit(&child2, "crossover")?;
        Ok((child1, child2))
    }

    /// Mutate an architecture, each gene independently with probability `indpb`.
    ///
    /// The layer count is redrawn first, so the per-layer passes see the
    /// resized genome.
    pub fn mutate<R: Rng + ?Sized>(
        &self,
        arch: &Architecture,
        indpb: f64,
        rng: &mut R,
    ) -> Result<Architecture> {
        if !(0.0..=1.0).contains(&indpb) {
            return Err(ArchSearchError::InvalidParameter {
                name: "indpb".to_string(),
                value: indpb.to_string(),
                reason: "must be within [0, 1]".to_string(),
            });
        }

        let mut mutant = arch.clone();

        if rng.gen_bool(indpb) {
            let target = self.sample_num_layers(rng);
            mutant.resize_with(target, self, rng);
        }

        for i in 0..mutant.units.len() {
            if rng.gen_bool(indpb) {
                mutant.units[i] = self.sample_units(rng);
            }
        }
        for i in 0..mutant.dropout.len() {
            if rng.gen_bool(indpb) {
                mutant.dropout[i] = self.sample_dropout(rng);
            }
        }

        commit(&mutant, "mutation")?;
        Ok(mutant)
    }
}

fn commit(child: &Architecture, operator: &str) -> Result<()> {
    child.validate().map_err(|e| {
        ArchSearchError::OperationalError(format!("{} produced an invalid child: {}", operator, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nas::search_space::{MAX_DROPOUT, MAX_LAYERS, MIN_LAYERS};
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn assert_genome(arch: &Architecture) {
        assert!((MIN_LAYERS..=MAX_LAYERS).contains(&arch.num_layers()));
        assert_eq!(arch.units().len(), arch.num_layers());
        assert_eq!(arch.dropout().len(), arch.num_layers());
        assert!(arch.units().iter().all(|u| [64, 128, 256].contains(u)));
        assert!(arch.dropout().iter().all(|d| (0.0..=MAX_DROPOUT).contains(d)));
    }

    #[test]
    fn test_crossover_preserves_invariant() {
        let space = SearchSpace::new();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);

        for _ in 0..1000 {
            let p1 = space.sample(&mut rng);
            let p2 = space.sample(&mut rng);
            let (c1, c2) = space.crossover(&p1, &p2, &mut rng).unwrap();
            assert_genome(&c1);
            assert_genome(&c2);
        }
    }

    #[test]
    fn test_crossover_leaves_parents_untouched() {
        let space = SearchSpace::new();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(9);
        let p1 = Architecture::new(vec![64, 64, 64], vec![0.1, 0.1, 0.1]).unwrap();
        let p2 = Architecture::new(vec![256], vec![0.5]).unwrap();
        let (s1, s2) = (p1.clone(), p2.clone());

        for _ in 0..50 {
            let _ = space.crossover(&p1, &p2, &mut rng).unwrap();
        }
        assert_eq!(p1, s1);
        assert_eq!(p2, s2);
    }

    #[test]
    fn test_crossover_swaps_layer_counts() {
        let space = SearchSpace::new();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(5);
        let p1 = Architecture::new(vec![64, 64, 64], vec![0.1, 0.1, 0.1]).unwrap();
        let p2 = Architecture::new(vec![128], vec![0.4]).unwrap();

        let mut swapped = 0;
        for _ in 0..500 {
            let (c1, c2) = space.crossover(&p1, &p2, &mut rng).unwrap();
            if c1.num_layers() == 1 {
                assert_eq!(c2.num_layers(), 3);
                // shrunk child keeps the head of parent 1 (or a swapped gene)
                assert!(c1.units()[0] == 64 || c1.units()[0] == 128);
                swapped += 1;
            } else {
                assert_eq!(c1.num_layers(), 3);
                assert_eq!(c2.num_layers(), 1);
            }
        }
        assert!(swapped > 100 && swapped < 200, "swapped {}", swapped);
    }

    #[test]
    fn test_mutate_preserves_invariant() {
        let space = SearchSpace::new();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(11);

        for _ in 0..1000 {
            let arch = space.sample(&mut rng);
            let mutant = space.mutate(&arch, DEFAULT_INDPB, &mut rng).unwrap();
            assert_genome(&mutant);
        }
    }

    #[test]
    fn test_mutate_zero_probability_is_identity() {
        let space = SearchSpace::new();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(2);
        let arch = Architecture::new(vec![128, 64], vec![0.3, 0.2]).unwrap();

        let mutant = space.mutate(&arch, 0.0, &mut rng).unwrap();
        assert_eq!(mutant, arch);
    }

    #[test]
    fn test_mutate_full_probability_changes_dropout() {
        let space = SearchSpace::new();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(4);
        let arch = Architecture::new(vec![128, 64], vec![0.3, 0.2]).unwrap();

        let mutant = space.mutate(&arch, 1.0, &mut rng).unwrap();
        assert_genome(&mutant);
        assert_ne!(mutant.dropout(), arch.dropout());
    }

    #[test]
    fn test_mutate_rejects_bad_indpb() {
        let space = SearchSpace::new();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        let arch = space.sample(&mut rng);
        assert!(space.mutate(&arch, 1.5, &mut rng).is_err());
    }

    #[test]
    fn test_variation_rejects_invalid_parent() {
        let space = SearchSpace::new();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        let broken = Architecture::from_raw(5, vec![64; 5], vec![0.1; 5]);
        let ok = Architecture::new(vec![64], vec![0.1]).unwrap();

        // one child always inherits the five-layer count
        for _ in 0..20 {
            let err = space.crossover(&broken, &ok, &mut rng).unwrap_err();
            assert!(matches!(err, ArchSearchError::OperationalError(_)));
        }
    }
}
