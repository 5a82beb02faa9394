//! Search reports
//!
//! Everything a finished run hands to external analysis: the final
//! population, Hall of Fame, logbook, raw results and summary figures.

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cache::{CacheStats, EvaluationCache};
use crate::error::Result;
use crate::monitoring::{Logbook, ResultStatistics};
use crate::optimizer::{
    pareto_front, EvaluatedArchitecture, HallOfFame, HybridOutcome, Individual, Nsga2Outcome,
    SearchConfig,
};

/// Search strategy that produced a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Random,
    Nsga2,
    Hybrid,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Random => "random",
            Strategy::Nsga2 => "nsga2",
            Strategy::Hybrid => "hybrid",
        };
        write!(f, "{}", name)
    }
}

/// Serializable summary of one search run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchReport {
    pub strategy: Strategy,
    pub created_at: DateTime<Utc>,
    pub config: SearchConfig,
    /// Raw `(architecture, fitness)` pairs; for NSGA-II, the final population
    pub results: Vec<EvaluatedArchitecture>,
    /// Final NSGA-II population with rank information
    #[serde(default)]
    pub population: Vec<Individual>,
    #[serde(default)]
    pub hall_of_fame: Option<HallOfFame>,
    #[serde(default)]
    pub logbook: Option<Logbook>,
    /// `None` when no result was scored successfully
    pub statistics: Option<ResultStatistics>,
    /// Non-dominated subset of `results`
    pub pareto_front: Vec<EvaluatedArchitecture>,
    pub cache: CacheStats,
    #[serde(default)]
    pub elapsed_secs: f64,
}

impl SearchReport {
    fn base(strategy: Strategy, config: SearchConfig, results: Vec<EvaluatedArchitecture>, cache: &EvaluationCache) -> Self {
        let statistics = ResultStatistics::from_fitnesses(results.iter().map(|r| &r.fitness)).ok();
        let pareto_front = pareto_front(&results);

        Self {
            strategy,
            created_at: Utc::now(),
            config,
            results,
            population: Vec::new(),
            hall_of_fame: None,
            logbook: None,
            statistics,
            pareto_front,
            cache: cache.stats(),
            elapsed_secs: 0.0,
        }
    }

    /// Report for a random search
    pub fn from_random(config: SearchConfig, results: Vec<EvaluatedArchitecture>, cache: &EvaluationCache) -> Self {
        Self::base(Strategy::Random, config, results, cache)
    }

    /// Report for an NSGA-II run
    pub fn from_nsga2(config: SearchConfig, outcome: &Nsga2Outcome, cache: &EvaluationCache) -> Self {
        let mut report = Self::base(Strategy::Nsga2, config, outcome.results(), cache);
        report.population = outcome.population.clone();
        report.hall_of_fame = Some(outcome.hall_of_fame.clone());
        report.logbook = Some(outcome.logbook.clone());
        report
    }

    /// Report for a hybrid run
    pub fn from_hybrid(config: SearchConfig, outcome: &HybridOutcome, cache: &EvaluationCache) -> Self {
        let mut report = Self::base(Strategy::Hybrid, config, outcome.combined.clone(), cache);
        report.population = outcome.nsga2.population.clone();
        report.hall_of_fame = Some(outcome.nsga2.hall_of_fame.clone());
        report.logbook = Some(outcome.nsga2.logbook.clone());
        report
    }

    /// Set wall-clock duration
    pub fn with_elapsed(mut self, secs: f64) -> Self {
        self.elapsed_secs = secs;
        self
    }

    /// Most accurate result, smallest on ties
    pub fn best(&self) -> Option<&EvaluatedArchitecture> {
        self.results
            .iter()
            .filter(|r| !r.fitness.is_failure())
            .fold(None, |best: Option<&EvaluatedArchitecture>, r| match best {
                Some(b) if !r.fitness.is_better_than(&b.fitness) => Some(b),
                _ => Some(r),
            })
    }

    /// Save report to a JSON file
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        info!(path = %path.as_ref().display(), strategy = %self.strategy, "Report saved");
        Ok(())
    }

    /// Load report from a JSON file
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nas::{Architecture, Fitness};

    fn result(units: Vec<u32>, acc: f64) -> EvaluatedArchitecture {
        let n = units.len();
        let params: u64 = units.iter().map(|&u| u as u64).sum();
        EvaluatedArchitecture::new(Architecture::new(units, vec![0.2; n]).unwrap(), Fitness::new(acc, params))
    }

    fn empty_cache() -> EvaluationCache {
        EvaluationCache::new(|_: &Architecture| -> Result<Fitness> { Ok(Fitness::new(0.5, 1)) })
    }

    #[test]
    fn test_random_report_summary() {
        let results = vec![
            result(vec![64], 0.5),
            result(vec![128, 128], 0.9),
            result(vec![64, 64], 0.9),
            EvaluatedArchitecture::new(Architecture::new(vec![256], vec![0.1]).unwrap(), Fitness::failed()),
        ];
        let report = SearchReport::from_random(SearchConfig::default(), results, &empty_cache());

        assert_eq!(report.strategy, Strategy::Random);
        let stats = report.statistics.as_ref().unwrap();
        assert_eq!(stats.valid, 3);
        assert_eq!(stats.failed, 1);
        assert_eq!(report.best().unwrap().architecture.units(), &[64, 64]);
        assert!(report.pareto_front.iter().all(|r| !r.fitness.is_failure()));
        assert!(report.hall_of_fame.is_none());
    }

    #[test]
    fn test_all_failed_has_no_statistics() {
        let results = vec![EvaluatedArchitecture::new(
            Architecture::new(vec![64], vec![0.1]).unwrap(),
            Fitness::failed(),
        )];
        let report = SearchReport::from_random(SearchConfig::default(), results, &empty_cache());
        assert!(report.statistics.is_none());
        assert!(report.best().is_none());
        assert!(report.pareto_front.is_empty());
    }

    #[test]
    fn test_json_file_round_trip() {
        let path = std::env::temp_dir().join(format!("archsearch-report-{}.json", std::process::id()));
        let report = SearchReport::from_random(
            SearchConfig::default(),
            vec![result(vec![128], 0.7)],
            &empty_cache(),
        )
        .with_elapsed(1.5);

        report.save_json(&path).unwrap();
        let loaded = SearchReport::load_json(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded.strategy, Strategy::Random);
        assert_eq!(loaded.results, report.results);
        assert_eq!(loaded.created_at, report.created_at);
        assert_eq!(loaded.elapsed_secs, 1.5);
    }
}
