//! Search Statistics
//!
//! Aggregate metrics over evaluated architectures. Failed evaluations carry
//! the failure fitness and are left out of every aggregate.

use serde::{Deserialize, Serialize};

use crate::error::{ArchSearchError, Result};
use crate::nas::Fitness;

/// Statistics summary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSummary {
    /// Number of observations
    pub count: usize,
    /// Average value
    pub mean: f64,
    /// Population standard deviation
    pub std: f64,
    /// Minimum value
    pub min: f64,
    /// Maximum value
    pub max: f64,
}

impl StatsSummary {
    /// Create a summary from a slice of values
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let variance: f64 = values.iter()
            .map(|&x| (x - mean).powi(2))
            .sum::<f64>() / count as f64;

        Self {
            count,
            mean,
            std: variance.sqrt(),
            min,
            max,
        }
    }
}

/// Summary of a finished result set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultStatistics {
    /// Results that were scored successfully
    pub valid: usize,
    /// Results carrying the failure fitness
    pub failed: usize,
    /// Mean accuracy
    pub mean_accuracy: f64,
    /// Best accuracy
    pub max_accuracy: f64,
    /// Worst accuracy
    pub min_accuracy: f64,
    /// Mean parameter count
    pub mean_params: f64,
    /// Smallest parameter count
    pub min_params: u64,
}

impl ResultStatistics {
    /// Reduce a result set.
    ///
    /// Returns [`ArchSearchError::NoValidResults`] when nothing in the set was
    /// scored successfully, including when the set is empty.
    pub fn from_fitnesses<'a, I>(fitnesses: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Fitness>,
    {
        let mut failed = 0;
        let mut accuracies = Vec::new();
        let mut params = Vec::new();

        for fitness in fitnesses {
            if fitness.is_failure() {
                failed += 1;
            } else {
                accuracies.push(fitness.accuracy);
                params.push(fitness.param_count);
            }
        }

        if accuracies.is_empty() {
            return Err(ArchSearchError::NoValidResults);
        }

        let accuracy = StatsSummary::from_values(&accuracies);
        let mean_params = params.iter().map(|&p| p as f64).sum::<f64>() / params.len() as f64;

        Ok(Self {
            valid: accuracies.len(),
            failed,
            mean_accuracy: accuracy.mean,
            max_accuracy: accuracy.max,
            min_accuracy: accuracy.min,
            mean_params,
            min_params: params.iter().copied().min().unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_summary() {
        let s = StatsSummary::from_values(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(s.count, 4);
        assert!((s.mean - 2.5).abs() < 1e-12);
        assert!((s.std - 1.118033988749895).abs() < 1e-12);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 4.0);
    }

    #[test]
    fn test_stats_summary_empty() {
        assert_eq!(StatsSummary::from_values(&[]), StatsSummary::default());
    }

    #[test]
    fn test_result_statistics() {
        let results = vec![
            Fitness::new(0.9, 100),
            Fitness::new(0.7, 50),
            Fitness::failed(),
        ];
        let stats = ResultStatistics::from_fitnesses(&results).unwrap();

        assert_eq!(stats.valid, 2);
        assert_eq!(stats.failed, 1);
        assert!((stats.mean_accuracy - 0.8).abs() < 1e-12);
        assert_eq!(stats.max_accuracy, 0.9);
        assert_eq!(stats.min_accuracy, 0.7);
        assert_eq!(stats.mean_params, 75.0);
        assert_eq!(stats.min_params, 50);
    }

    #[test]
    fn test_result_statistics_no_valid_results() {
        let empty: Vec<Fitness> = Vec::new();
        assert!(matches!(
            ResultStatistics::from_fitnesses(&empty),
            Err(ArchSearchError::NoValidResults)
        ));

        let all_failed = vec![Fitness::failed(), Fitness::failed()];
        assert!(matches!(
            ResultStatistics::from_fitnesses(&all_failed),
            Err(ArchSearchError::NoValidResults)
        ));
    }
}
