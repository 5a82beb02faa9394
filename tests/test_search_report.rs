//! Integration tests for random/hybrid search and run reports

use std::sync::Arc;

use archsearch::cache::EvaluationCache;
use archsearch::monitoring::ResultStatistics;
use archsearch::nas::{Architecture, Fitness, SyntheticEvaluator};
use archsearch::optimizer::{pareto_front, HybridCombiner, Nsga2Engine, RandomSampler, SearchConfig};
use archsearch::tracking::{SearchReport, Strategy};
use archsearch::utils::ParallelConfig;
use archsearch::{ArchSearchError, Result};

fn synthetic_cache() -> Arc<EvaluationCache> {
    Arc::new(EvaluationCache::new(SyntheticEvaluator::with_dims(64, 10)))
}

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("archsearch-{}-{}.json", name, std::process::id()))
}

#[test]
fn test_random_search_report() {
    let cache = synthetic_cache();
    let config = SearchConfig::new().with_num_random(30).with_seed(8);
    let results = RandomSampler::new(Arc::clone(&cache), config.seed, &ParallelConfig::new())
        .unwrap()
        .sample(config.num_random);

    let report = SearchReport::from_random(config, results, &cache);

    assert_eq!(report.strategy, Strategy::Random);
    assert_eq!(report.results.len(), 30);
    assert_eq!(report.cache.entries, cache.len());
    assert!(report.statistics.is_some());

    // every front member is non-dominated within the result set
    for member in &report.pareto_front {
        assert!(!report
            .results
            .iter()
            .any(|r| r.fitness.dominates(&member.fitness)));
    }
}

#[test]
fn test_hybrid_report_round_trip() {
    let cache = synthetic_cache();
    let config = SearchConfig::new()
        .with_pop_size(12)
        .with_num_random(5)
        .with_generations(2)
        .with_seed(21);
    let outcome = HybridCombiner::new(config.clone(), Arc::clone(&cache))
        .unwrap()
        .run()
        .unwrap();

    let report = SearchReport::from_hybrid(config, &outcome, &cache).with_elapsed(0.25);
    assert_eq!(report.strategy, Strategy::Hybrid);
    assert_eq!(report.results.len(), 12);
    assert_eq!(report.population.len(), 7);
    assert_eq!(report.logbook.as_ref().map(|l| l.len()), Some(3));

    let path = temp_path("hybrid");
    report.save_json(&path).unwrap();
    let loaded = SearchReport::load_json(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(loaded.results, report.results);
    assert_eq!(loaded.pareto_front, report.pareto_front);
    assert_eq!(loaded.statistics, report.statistics);
    assert_eq!(loaded.logbook, report.logbook);
    assert_eq!(
        loaded.hall_of_fame.as_ref().map(|h| h.entries().to_vec()),
        report.hall_of_fame.as_ref().map(|h| h.entries().to_vec())
    );
}

#[test]
fn test_nsga2_report_pareto_front() {
    let cache = synthetic_cache();
    let config = SearchConfig::new().with_pop_size(10).with_generations(3);
    let outcome = Nsga2Engine::new(config.clone(), Arc::clone(&cache))
        .unwrap()
        .run()
        .unwrap();

    let report = SearchReport::from_nsga2(config, &outcome, &cache);
    assert_eq!(report.pareto_front, pareto_front(&outcome.results()));
    assert!(report.pareto_front.iter().all(|r| {
        outcome
            .population
            .iter()
            .any(|ind| ind.rank == 0 && ind.architecture == r.architecture)
    }));
}

#[test]
fn test_all_failures_report_no_valid_results() {
    let cache = Arc::new(EvaluationCache::new(|_: &Architecture| -> Result<Fitness> {
        Err(ArchSearchError::EvaluatorError("no GPU".to_string()))
    }));
    let results = RandomSampler::new(Arc::clone(&cache), 0, &ParallelConfig::new())
        .unwrap()
        .sample(5);

    assert!(results.iter().all(|r| r.fitness.is_failure()));
    assert!(matches!(
        ResultStatistics::from_fitnesses(results.iter().map(|r| &r.fitness)),
        Err(ArchSearchError::NoValidResults)
    ));

    let report = SearchReport::from_random(SearchConfig::default(), results, &cache);
    assert!(report.statistics.is_none());
    assert!(report.best().is_none());
    assert_eq!(report.cache.failures, cache.stats().failures);
}

#[test]
fn test_stopped_hybrid_run_still_reports() {
    let cache = synthetic_cache();
    let config = SearchConfig::new()
        .with_pop_size(9)
        .with_num_random(4)
        .with_generations(3)
        .with_variation(1.0, 0.0)
        .with_seed(3);
    // any crossover between two four-layer parents is rejected at commit
    let seeds = vec![Architecture::from_raw(4, vec![64; 4], vec![0.1; 4]); 5];
    let mut combiner = HybridCombiner::new(config.clone(), Arc::clone(&cache))
        .unwrap()
        .with_nsga2_seeds(seeds);

    assert!(combiner.run().is_err());
    let partial = combiner.snapshot();
    let report = SearchReport::from_hybrid(config, &partial, &cache);

    assert_eq!(report.results.len(), 9);
    assert_eq!(report.population.len(), 5);
    assert_eq!(report.logbook.as_ref().map(|l| l.len()), Some(1));
    // the random half scored normally, so there is a front to report
    assert!(report.statistics.is_some());
    assert!(!report.pareto_front.is_empty());

    let path = temp_path("stopped-hybrid");
    report.save_json(&path).unwrap();
    let loaded = SearchReport::load_json(&path).unwrap();
    let _ = std::fs::remove_file(&path);
    assert_eq!(loaded.results, report.results);
}
