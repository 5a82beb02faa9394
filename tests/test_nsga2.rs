//! Integration tests for the NSGA-II engine

use std::sync::Arc;

use archsearch::cache::EvaluationCache;
use archsearch::nas::{Architecture, Fitness};
use archsearch::optimizer::{non_dominated_sort, EngineState, Nsga2Engine, SearchConfig};
use archsearch::Result;
use parking_lot::Mutex;

/// accuracy = num_layers / 3, param_count = sum(units)
fn stub(arch: &Architecture) -> Result<Fitness> {
    Ok(Fitness::new(arch.num_layers() as f64 / 3.0, arch.total_units()))
}

fn recording_cache() -> (Arc<EvaluationCache>, Arc<Mutex<Vec<(Architecture, Fitness)>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);
    let cache = EvaluationCache::new(move |arch: &Architecture| -> Result<Fitness> {
        let fitness = stub(arch)?;
        log.lock().push((arch.clone(), fitness));
        Ok(fitness)
    });
    (Arc::new(cache), seen)
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn test_same_seed_identical_runs() {
    let config = SearchConfig::new()
        .with_pop_size(10)
        .with_generations(4)
        .with_seed(1234)
        .with_workers(4);

    let a = Nsga2Engine::new(config.clone(), Arc::new(EvaluationCache::new(stub)))
        .unwrap()
        .run()
        .unwrap();
    let b = Nsga2Engine::new(config, Arc::new(EvaluationCache::new(stub)))
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(a.results(), b.results());
    assert_eq!(a.logbook, b.logbook);
    assert_eq!(a.hall_of_fame.entries(), b.hall_of_fame.entries());
}

#[test]
fn test_different_seeds_explore_differently() {
    let run = |seed| {
        let config = SearchConfig::new().with_pop_size(10).with_generations(1).with_seed(seed);
        Nsga2Engine::new(config, Arc::new(EvaluationCache::new(stub)))
            .unwrap()
            .run()
            .unwrap()
            .results()
    };
    assert_ne!(run(1), run(2));
}

// ============================================================================
// End to end
// ============================================================================

#[test]
fn test_end_to_end_hall_of_fame() {
    let (cache, seen) = recording_cache();
    let config = SearchConfig::new()
        .with_pop_size(4)
        .with_generations(2)
        .with_variation(1.0, 0.0)
        .with_seed(42);

    let mut engine = Nsga2Engine::new(config, Arc::clone(&cache)).unwrap();
    let outcome = engine.run().unwrap();

    assert_eq!(engine.state(), EngineState::Terminal);
    assert_eq!(outcome.generations_completed, 2);
    assert_eq!(outcome.logbook.len(), 3);
    assert_eq!(outcome.population.len(), 4);

    let evaluated = seen.lock().clone();
    assert_eq!(evaluated.len() as u64, cache.evaluation_count());
    assert_eq!(outcome.logbook.total_evaluations(), cache.evaluation_count());

    let best_seen = evaluated
        .iter()
        .map(|(_, f)| *f)
        .fold(None, |best: Option<Fitness>, f| match best {
            Some(b) if !f.is_better_than(&b) => Some(b),
            _ => Some(f),
        })
        .unwrap();
    let hof = outcome.hall_of_fame.best().unwrap();
    assert_eq!(hof.fitness, best_seen);

    // seed 42 evaluates at least one three-layer genome
    let min_units = evaluated
        .iter()
        .filter(|(a, _)| a.num_layers() == 3)
        .map(|(a, _)| a.total_units())
        .min()
        .expect("no three-layer architecture was evaluated");
    assert_eq!(hof.architecture.num_layers(), 3);
    assert_eq!(hof.architecture.total_units(), min_units);
}

#[test]
fn test_population_is_elitist() {
    let config = SearchConfig::new().with_pop_size(8).with_generations(5).with_seed(3);
    let outcome = Nsga2Engine::new(config, Arc::new(EvaluationCache::new(stub)))
        .unwrap()
        .run()
        .unwrap();

    // the best accuracy in the population never decreases across generations
    let maxima: Vec<f64> = outcome.logbook.rows().iter().map(|r| r.accuracy.max).collect();
    for pair in maxima.windows(2) {
        assert!(pair[1] >= pair[0]);
    }

    let fitnesses: Vec<Fitness> = outcome.population.iter().map(|i| i.fitness_or_failed()).collect();
    let fronts = non_dominated_sort(&fitnesses);
    for (rank, front) in fronts.iter().enumerate() {
        for &i in front {
            assert_eq!(outcome.population[i].rank, rank);
        }
    }
}

#[test]
fn test_manual_stepping_matches_run() {
    let config = SearchConfig::new().with_pop_size(6).with_generations(3).with_seed(77);

    let ran = Nsga2Engine::new(config.clone(), Arc::new(EvaluationCache::new(stub)))
        .unwrap()
        .run()
        .unwrap();

    let mut engine = Nsga2Engine::new(config, Arc::new(EvaluationCache::new(stub))).unwrap();
    engine.initialize().unwrap();
    assert!(engine.initialize().is_err());
    for _ in 0..3 {
        engine.step().unwrap();
    }
    let stepped = engine.into_outcome();

    assert_eq!(ran.results(), stepped.results());
    assert_eq!(ran.logbook, stepped.logbook);
}
