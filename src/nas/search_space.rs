//! NAS Search Space Definition
//!
//! Defines the genome of a candidate network (a small stack of dense layers,
//! each with a width and a dropout rate) and the distribution new genomes are
//! drawn from.

use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ArchSearchError, Result};

/// Smallest allowed number of hidden layers
pub const MIN_LAYERS: usize = 1;
/// Largest allowed number of hidden layers
pub const MAX_LAYERS: usize = 3;
/// Widths that are always candidates for a layer
pub const BASE_UNITS: [u32; 2] = [64, 128];
/// Width that joins the candidate set with probability [`WIDE_UNITS_PROB`]
pub const WIDE_UNITS: u32 = 256;
/// Probability that [`WIDE_UNITS`] is offered for a layer
pub const WIDE_UNITS_PROB: f64 = 0.3;
/// Upper bound of the dropout range (lower bound is 0.0)
pub const MAX_DROPOUT: f64 = 0.6;

/// A candidate network topology.
///
/// `units` and `dropout` always have exactly `num_layers` entries once an
/// architecture has passed [`Architecture::validate`]. Values built through
/// [`Architecture::new`] or the [`SearchSpace`] operators are valid by
/// construction; deserialized or [`Architecture::from_raw`] values are not
/// checked until they reach the evaluation cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Architecture {
    pub(crate) num_layers: usize,
    pub(crate) units: Vec<u32>,
    pub(crate) dropout: Vec<f64>,
}

impl Architecture {
    /// Create a validated architecture from per-layer widths and dropout rates
    pub fn new(units: Vec<u32>, dropout: Vec<f64>) -> Result<Self> {
        let arch = Self {
            num_layers: units.len(),
            units,
            dropout,
        };
        arch.validate()?;
        Ok(arch)
    }

    /// Assemble an architecture without checking the genome invariant
    pub fn from_raw(num_layers: usize, units: Vec<u32>, dropout: Vec<f64>) -> Self {
        Self {
            num_layers,
            units,
            dropout,
        }
    }

    /// Check the genome invariant
    pub fn validate(&self) -> Result<()> {
        if !(MIN_LAYERS..=MAX_LAYERS).contains(&self.num_layers) {
            return Err(ArchSearchError::ValidationError(format!(
                "num_layers = {} outside [{}, {}]",
                self.num_layers, MIN_LAYERS, MAX_LAYERS
            )));
        }
        if self.units.len() != self.num_layers || self.dropout.len() != self.num_layers {
            return Err(ArchSearchError::ValidationError(format!(
                "num_layers = {} but {} unit entries and {} dropout entries",
                self.num_layers,
                self.units.len(),
                self.dropout.len()
            )));
        }
        if let Some(u) = self.units.iter().find(|u| !is_unit_choice(**u)) {
            return Err(ArchSearchError::ValidationError(format!(
                "unsupported layer width {}",
                u
            )));
        }
        if let Some(d) = self
            .dropout
            .iter()
            .find(|d| !(0.0..=MAX_DROPOUT).contains(*d))
        {
            return Err(ArchSearchError::ValidationError(format!(
                "dropout {} outside [0.0, {}]",
                d, MAX_DROPOUT
            )));
        }
        Ok(())
    }

    /// Number of hidden layers
    pub fn num_layers(&self) -> usize {
        self.num_layers
    }

    /// Per-layer widths
    pub fn units(&self) -> &[u32] {
        &self.units
    }

    /// Per-layer dropout rates
    pub fn dropout(&self) -> &[f64] {
        &self.dropout
    }

    /// Iterate `(units, dropout)` pairs layer by layer
    pub fn layers(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.units.iter().copied().zip(self.dropout.iter().copied())
    }

    /// Total hidden width, `sum(units)`
    pub fn total_units(&self) -> u64 {
        self.units.iter().map(|&u| u as u64).sum()
    }

    /// Canonical cache key
    pub fn key(&self) -> ArchitectureKey {
        ArchitectureKey {
            num_layers: self.num_layers,
            units: self.units.clone(),
            dropout_centi: self
                .dropout
                .iter()
                .map(|d| (d * 100.0).round() as i64)
                .collect(),
        }
    }

    /// Trainable parameters of the dense classifier this genome describes
    /// (weights and biases of every hidden layer plus the output layer).
    pub fn dense_param_count(&self, input_dim: usize, num_classes: usize) -> u64 {
        let mut params = 0u64;
        let mut fan_in = input_dim as u64;
        for &units in &self.units {
            let units = units as u64;
            params += fan_in * units + units;
            fan_in = units;
        }
        params + fan_in * num_classes as u64 + num_classes as u64
    }

    /// Resize to `target` layers: grow by appending freshly sampled layers,
    /// shrink by truncating from the tail.
    pub(crate) fn resize_with<R: Rng + ?Sized>(
        &mut self,
        target: usize,
        space: &SearchSpace,
        rng: &mut R,
    ) {
        self.units.truncate(target);
        self.dropout.truncate(target);
        while self.units.len() < target {
            let (units, dropout) = space.sample_layer(rng);
            self.units.push(units);
            self.dropout.push(dropout);
        }
        self.num_layers = target;
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, (units, dropout)) in self.layers().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}@{:.2}", units, dropout)?;
        }
        write!(f, "]")
    }
}

fn is_unit_choice(units: u32) -> bool {
    BASE_UNITS.contains(&units) || units == WIDE_UNITS
}

/// Canonical form of an [`Architecture`] used as the memoization key.
///
/// Dropout rates are compared at two-decimal precision, so genomes that only
/// differ below 0.01 share one entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArchitectureKey {
    num_layers: usize,
    units: Vec<u32>,
    dropout_centi: Vec<i64>,
}

impl fmt::Display for ArchitectureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:?}:{:?}", self.num_layers, self.units, self.dropout_centi)
    }
}

/// NAS Search Space
///
/// Sampling distribution shared by the random sampler, the initial NSGA-II
/// population and the growth step of the variation operators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSpace;

impl SearchSpace {
    /// Create the search space
    pub fn new() -> Self {
        Self
    }

    /// Draw a layer count uniformly from `[MIN_LAYERS, MAX_LAYERS]`
    pub fn sample_num_layers<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        rng.gen_range(MIN_LAYERS..=MAX_LAYERS)
    }

    /// Draw one layer width. The wide option is decided once per call.
    pub fn sample_units<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        let mut choices = BASE_UNITS.to_vec();
        if rng.gen_bool(WIDE_UNITS_PROB) {
            choices.push(WIDE_UNITS);
        }
        *choices.choose(rng).unwrap_or(&BASE_UNITS[0])
    }

    /// Draw one dropout rate uniformly from `[0.0, MAX_DROPOUT]`
    pub fn sample_dropout<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        rng.gen_range(0.0..=MAX_DROPOUT)
    }

    /// Draw a `(units, dropout)` pair for one layer
    pub fn sample_layer<R: Rng + ?Sized>(&self, rng: &mut R) -> (u32, f64) {
        let units = self.sample_units(rng);
        let dropout = self.sample_dropout(rng);
        (units, dropout)
    }

    /// Sample a random architecture
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Architecture {
        let num_layers = self.sample_num_layers(rng);
        let mut units = Vec::with_capacity(num_layers);
        let mut dropout = Vec::with_capacity(num_layers);
        for _ in 0..num_layers {
            let (u, d) = self.sample_layer(rng);
            units.push(u);
            dropout.push(d);
        }
        Architecture {
            num_layers,
            units,
            dropout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    #[test]
    fn test_sample_random_architecture() {
        let space = SearchSpace::new();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);

        for _ in 0..500 {
            let arch = space.sample(&mut rng);
            assert!(arch.validate().is_ok(), "sampled invalid genome {:?}", arch);
        }
    }

    #[test]
    fn test_sample_is_reproducible() {
        let space = SearchSpace::new();
        let mut a = Xoshiro256PlusPlus::seed_from_u64(7);
        let mut b = Xoshiro256PlusPlus::seed_from_u64(7);

        let xs: Vec<_> = (0..20).map(|_| space.sample(&mut a)).collect();
        let ys: Vec<_> = (0..20).map(|_| space.sample(&mut b)).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn test_sample_covers_choices() {
        let space = SearchSpace::new();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        let mut layer_counts = [0usize; MAX_LAYERS + 1];
        let mut wide = 0;
        let mut draws = 0;

        for _ in 0..3000 {
            let arch = space.sample(&mut rng);
            layer_counts[arch.num_layers()] += 1;
            for &u in arch.units() {
                draws += 1;
                if u == WIDE_UNITS {
                    wide += 1;
                }
            }
        }

        assert_eq!(layer_counts[0], 0);
        assert!(layer_counts[1..].iter().all(|&c| c > 800));
        // 0.3 chance of being offered, then 1/3 chance of being picked
        let share = wide as f64 / draws as f64;
        assert!(share > 0.06 && share < 0.14, "wide share {}", share);
    }

    #[test]
    fn test_validate_rejects_bad_genomes() {
        assert!(Architecture::from_raw(0, vec![], vec![]).validate().is_err());
        assert!(Architecture::from_raw(4, vec![64; 4], vec![0.1; 4]).validate().is_err());
        assert!(Architecture::from_raw(2, vec![64], vec![0.1, 0.2]).validate().is_err());
        assert!(Architecture::from_raw(1, vec![32], vec![0.1]).validate().is_err());
        assert!(Architecture::from_raw(1, vec![64], vec![0.7]).validate().is_err());
        assert!(Architecture::from_raw(1, vec![64], vec![f64::NAN]).validate().is_err());
        assert!(Architecture::new(vec![64, 256], vec![0.0, 0.6]).is_ok());
    }

    #[test]
    fn test_key_rounds_dropout() {
        let a = Architecture::new(vec![128, 64], vec![0.301, 0.2]).unwrap();
        let b = Architecture::new(vec![128, 64], vec![0.299, 0.2]).unwrap();
        let c = Architecture::new(vec![128, 64], vec![0.31, 0.2]).unwrap();
        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), c.key());
    }

    #[test]
    fn test_dense_param_count() {
        let arch = Architecture::new(vec![64, 128], vec![0.1, 0.2]).unwrap();
        // 10*64+64 + 64*128+128 + 128*3+3
        assert_eq!(arch.dense_param_count(10, 3), 704 + 8320 + 387);
    }

    #[test]
    fn test_resize_grows_and_shrinks() {
        let space = SearchSpace::new();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
        let mut arch = Architecture::new(vec![64], vec![0.5]).unwrap();

        arch.resize_with(3, &space, &mut rng);
        assert_eq!(arch.num_layers(), 3);
        assert_eq!(arch.units()[0], 64);
        assert!(arch.validate().is_ok());

        arch.resize_with(1, &space, &mut rng);
        assert_eq!(arch.units(), &[64]);
        assert_eq!(arch.dropout(), &[0.5]);
    }

    #[test]
    fn test_display() {
        let arch = Architecture::new(vec![128, 64], vec![0.25, 0.1]).unwrap();
        assert_eq!(arch.to_string(), "[128@0.25, 64@0.10]");
    }
}
