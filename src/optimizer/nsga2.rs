//! NSGA-II engine
//!
//! Elitist `mu + lambda` multi-objective search over architectures:
//! crowded binary tournaments pick parents, crossover and mutation produce
//! offspring, and non-dominated sorting with crowding distance decides which
//! `mu` of parents and offspring survive.
//!
//! All random draws happen on the calling thread before evaluations are
//! dispatched to the worker pool, so a seed reproduces a run exactly for any
//! worker count as long as the evaluator is deterministic.

use std::sync::Arc;
use std::time::Instant;

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::config::SearchConfig;
use super::hall_of_fame::HallOfFame;
use super::pareto::{non_dominated_sort, select_nsga2};
use super::population::{EvaluatedArchitecture, Individual};
use crate::cache::EvaluationCache;
use crate::error::{ArchSearchError, Result};
use crate::monitoring::{Logbook, LogbookRow};
use crate::nas::{Architecture, Fitness, SearchSpace};
use crate::utils::EvaluationPool;

/// Lifecycle of an engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    /// Created, initial population not yet evaluated
    Init,
    /// `completed` generations have finished
    Running { completed: usize },
    /// All configured generations have finished
    Terminal,
}

/// Population, Hall of Fame and logbook of a run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Nsga2Outcome {
    /// Last complete population
    pub population: Vec<Individual>,
    /// Best individuals across all generations
    pub hall_of_fame: HallOfFame,
    /// Per-generation statistics
    pub logbook: Logbook,
    /// Generations completed after initialization
    pub generations_completed: usize,
}

impl Nsga2Outcome {
    /// Final population as plain results
    pub fn results(&self) -> Vec<EvaluatedArchitecture> {
        self.population.iter().map(EvaluatedArchitecture::from).collect()
    }
}

/// NSGA-II optimizer
pub struct Nsga2Engine {
    config: SearchConfig,
    space: SearchSpace,
    cache: Arc<EvaluationCache>,
    pool: EvaluationPool,
    rng: Xoshiro256PlusPlus,
    initial: Vec<Architecture>,
    population: Vec<Individual>,
    hall_of_fame: HallOfFame,
    logbook: Logbook,
    state: EngineState,
}

impl Nsga2Engine {
    /// Create an engine evaluating through `cache`
    pub fn new(config: SearchConfig, cache: Arc<EvaluationCache>) -> Result<Self> {
        config.validate()?;
        let pool = EvaluationPool::new(&config.parallel_config())?;

        Ok(Self {
            rng: Xoshiro256PlusPlus::seed_from_u64(config.seed),
            hall_of_fame: HallOfFame::new(config.hall_of_fame_size),
            space: SearchSpace::new(),
            config,
            cache,
            pool,
            initial: Vec::new(),
            population: Vec::new(),
            logbook: Logbook::new(),
            state: EngineState::Init,
        })
    }

    /// Seed the initial population with known architectures.
    ///
    /// Seeds fill the first slots of generation 0 (extra seeds are dropped)
    /// and the remaining slots are sampled. Seeds are validated by the cache
    /// like any other genome, so a malformed seed is scored as failed.
    pub fn with_initial_population(mut self, archs: Vec<Architecture>) -> Self {
        self.initial = archs;
        self
    }

    /// Evaluate the initial population.
    ///
    /// With zero configured generations the engine is terminal afterwards.
    pub fn initialize(&mut self) -> Result<()> {
        if self.state != EngineState::Init {
            return Err(ArchSearchError::OperationalError(
                "engine already initialized".to_string(),
            ));
        }

        let mu = self.config.pop_size;
        let mut archs: Vec<Architecture> = std::mem::take(&mut self.initial);
        archs.truncate(mu);
        let seeded = archs.len();
        archs.extend((seeded..mu).map(|_| self.space.sample(&mut self.rng)));

        let before = self.cache.evaluation_count();
        let fitnesses = self.pool.evaluate_all(&self.cache, &archs);
        let nevals = self.cache.evaluation_count() - before;

        let individuals: Vec<Individual> = archs
            .into_iter()
            .zip(fitnesses)
            .map(|(arch, fitness)| Individual::evaluated(arch, fitness))
            .collect();

        let front0 = first_front(&individuals);
        self.hall_of_fame.update(front0.iter().map(|(a, f)| (a, *f)), 0);

        // rank the initial population so tournaments have something to compare
        let (population, _) = select_nsga2(individuals, mu);

        let row = LogbookRow::record(0, nevals, &fitness_of(&population));
        info!(
            gen = 0,
            nevals,
            acc_max = row.accuracy.max,
            params_min = row.param_count.min,
            seeded,
            "Initial population evaluated"
        );
        self.logbook.push(row);
        self.population = population;
        self.state = if self.config.num_generations == 0 {
            EngineState::Terminal
        } else {
            EngineState::Running { completed: 0 }
        };
        Ok(())
    }

    /// Run one generation.
    ///
    /// The next population is built completely before it replaces the
    /// current one; on error the engine keeps its last complete state.
    pub fn step(&mut self) -> Result<()> {
        let completed = match self.state {
            EngineState::Running { completed } => completed,
            EngineState::Init => {
                return Err(ArchSearchError::OperationalError(
                    "step called before initialize".to_string(),
                ))
            }
            EngineState::Terminal => {
                return Err(ArchSearchError::OperationalError(
                    "all generations already completed".to_string(),
                ))
            }
        };
        let gen = completed + 1;
        let start = Instant::now();

        let mut offspring = self.vary()?;

        // Evaluate offspring whose genome changed
        let pending: Vec<usize> = offspring
            .iter()
            .enumerate()
            .filter(|(_, ind)| ind.fitness.is_none())
            .map(|(i, _)| i)
            .collect();
        let archs: Vec<Architecture> = pending
            .iter()
            .map(|&i| offspring[i].architecture.clone())
            .collect();

        let before = self.cache.evaluation_count();
        let fitnesses = self.pool.evaluate_all(&self.cache, &archs);
        let nevals = self.cache.evaluation_count() - before;

        for (&i, fitness) in pending.iter().zip(fitnesses) {
            offspring[i].fitness = Some(fitness);
        }

        // Parents and offspring compete for mu slots
        let mut pool = self.population.clone();
        pool.extend(offspring);
        let front0 = first_front(&pool);
        let (survivors, _) = select_nsga2(pool, self.config.pop_size);

        if survivors.len() != self.config.pop_size {
            return Err(ArchSearchError::OperationalError(format!(
                "survivor selection returned {} individuals, expected {}",
                survivors.len(),
                self.config.pop_size
            )));
        }

        // Commit
        let row = LogbookRow::record(gen, nevals, &fitness_of(&survivors));
        info!(
            gen,
            nevals,
            acc_avg = row.accuracy.mean,
            acc_max = row.accuracy.max,
            params_min = row.param_count.min,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Generation complete"
        );
        self.logbook.push(row);
        let recorded = self
            .hall_of_fame
            .update(front0.iter().map(|(a, f)| (a, *f)), gen);
        debug!(gen, recorded, "Hall of Fame updated");
        self.population = survivors;
        self.state = if gen >= self.config.num_generations {
            EngineState::Terminal
        } else {
            EngineState::Running { completed: gen }
        };
        Ok(())
    }

    /// Initialize (if needed) and run every remaining generation
    pub fn run(&mut self) -> Result<Nsga2Outcome> {
        if self.state == EngineState::Init {
            self.initialize()?;
        }

        while let EngineState::Running { completed } = self.state {
            if let Err(e) = self.step() {
                error!(
                    completed,
                    error = %e,
                    "Search stopped early; keeping completed generations"
                );
                return Err(e);
            }
        }

        Ok(self.snapshot())
    }

    /// Produce `lambda` offspring by tournament selection and variation
    fn vary(&mut self) -> Result<Vec<Individual>> {
        let lambda = self.config.offspring_size();
        let mut offspring: Vec<Individual> = (0..lambda)
            .map(|_| {
                let winner = tournament(&self.population, &mut self.rng);
                self.population[winner].clone()
            })
            .collect();

        for pair in offspring.chunks_mut(2) {
            if let [a, b] = pair {
                if self.rng.gen_bool(self.config.cxpb) {
                    let (c1, c2) = self
                        .space
                        .crossover(&a.architecture, &b.architecture, &mut self.rng)?;
                    a.architecture = c1;
                    b.architecture = c2;
                    a.invalidate();
                    b.invalidate();
                }
            }
        }

        for child in offspring.iter_mut() {
            if self.rng.gen_bool(self.config.mutpb) {
                child.architecture =
                    self.space
                        .mutate(&child.architecture, self.config.indpb, &mut self.rng)?;
                child.invalidate();
            }
        }

        Ok(offspring)
    }

    /// Copy of the current population, Hall of Fame and logbook
    pub fn snapshot(&self) -> Nsga2Outcome {
        Nsga2Outcome {
            population: self.population.clone(),
            hall_of_fame: self.hall_of_fame.clone(),
            logbook: self.logbook.clone(),
            generations_completed: self.generations_completed(),
        }
    }

    /// Consume the engine, returning its current state
    pub fn into_outcome(self) -> Nsga2Outcome {
        let generations_completed = self.generations_completed();
        Nsga2Outcome {
            population: self.population,
            hall_of_fame: self.hall_of_fame,
            logbook: self.logbook,
            generations_completed,
        }
    }

    /// Generations completed after initialization
    pub fn generations_completed(&self) -> usize {
        match self.state {
            EngineState::Init => 0,
            EngineState::Running { completed } => completed,
            EngineState::Terminal => self.logbook.len().saturating_sub(1),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Current population
    pub fn population(&self) -> &[Individual] {
        &self.population
    }

    /// Hall of Fame so far
    pub fn hall_of_fame(&self) -> &HallOfFame {
        &self.hall_of_fame
    }

    /// Logbook so far
    pub fn logbook(&self) -> &Logbook {
        &self.logbook
    }

    /// Configuration
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }
}

/// Binary tournament under the crowded-comparison operator; the first
/// contestant wins ties.
fn tournament<R: Rng + ?Sized>(population: &[Individual], rng: &mut R) -> usize {
    let a = rng.gen_range(0..population.len());
    let b = rng.gen_range(0..population.len());
    if population[b].crowded_better_than(&population[a]) {
        b
    } else {
        a
    }
}

/// Non-dominated members of `individuals`, in order
fn first_front(individuals: &[Individual]) -> Vec<(Architecture, Fitness)> {
    let fitnesses = fitness_of(individuals);
    non_dominated_sort(&fitnesses)
        .first()
        .map(|front| {
            front
                .iter()
                .map(|&i| (individuals[i].architecture.clone(), fitnesses[i]))
                .collect()
        })
        .unwrap_or_default()
}

fn fitness_of(individuals: &[Individual]) -> Vec<Fitness> {
    individuals.iter().map(Individual::fitness_or_failed).collect()
}
