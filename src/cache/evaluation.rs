//! Evaluation Cache
//!
//! A thread-safe memo of architecture fitness keyed by the canonical genome.
//! The external evaluator runs at most once per retained key; its failures are
//! recorded as the failure fitness instead of being propagated.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::error::{ArchSearchError, Result};
use crate::nas::{Architecture, ArchitectureKey, Fitness, ObjectiveEvaluator};

/// Retention policy for cached evaluations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CachePolicy {
    /// Keep every entry for the lifetime of the cache
    #[default]
    Unbounded,
    /// Keep at most `max_entries`, evicting the oldest insertion first
    Bounded { max_entries: usize },
}

/// Snapshot of cache counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that had to call the evaluator
    pub misses: u64,
    /// Evaluator invocations
    pub evaluations: u64,
    /// Evaluator invocations that failed or timed out
    pub failures: u64,
    /// Architectures rejected by validation
    pub rejected: u64,
    /// Entries currently held
    pub entries: usize,
    /// Overall hit rate
    pub hit_rate: f64,
}

#[derive(Default)]
struct CacheStore {
    entries: HashMap<ArchitectureKey, Fitness>,
    insertion_order: VecDeque<ArchitectureKey>,
}

/// Memoizing front for an [`ObjectiveEvaluator`].
///
/// One instance is meant to be shared (behind an `Arc`) by every strategy in a
/// session; [`EvaluationCache::clear`] marks an explicit session boundary.
pub struct EvaluationCache {
    evaluator: Arc<dyn ObjectiveEvaluator>,
    policy: CachePolicy,
    store: Mutex<CacheStore>,

    // Statistics
    hits: AtomicU64,
    misses: AtomicU64,
    evaluations: AtomicU64,
    failures: AtomicU64,
    rejected: AtomicU64,
}

impl EvaluationCache {
    /// Create an unbounded cache around `evaluator`
    pub fn new<E: ObjectiveEvaluator + 'static>(evaluator: E) -> Self {
        Self::with_policy(evaluator, CachePolicy::Unbounded)
    }

    /// Create a cache with an explicit retention policy
    pub fn with_policy<E: ObjectiveEvaluator + 'static>(evaluator: E, policy: CachePolicy) -> Self {
        Self::from_shared(Arc::new(evaluator), policy)
    }

    /// Create a cache around an already shared evaluator
    pub fn from_shared(evaluator: Arc<dyn ObjectiveEvaluator>, policy: CachePolicy) -> Self {
        Self {
            evaluator,
            policy,
            store: Mutex::new(CacheStore::default()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evaluations: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        }
    }

    /// Resolve the fitness of `arch`, never failing.
    ///
    /// Invalid architectures and evaluator failures both come back as
    /// [`Fitness::failed`]; the cause is logged.
    pub fn evaluate(&self, arch: &Architecture) -> Fitness {
        match self.try_evaluate(arch) {
            Ok(fitness) => fitness,
            Err(e) if e.is_recoverable() => {
                warn!(architecture = %arch, error = %e, "Evaluation failed, using failure fitness");
                Fitness::failed()
            }
            Err(e) => {
                error!(architecture = %arch, error = %e, "Evaluator fault, using failure fitness");
                Fitness::failed()
            }
        }
    }

    /// Resolve the fitness of `arch`, reporting why it could not be scored.
    ///
    /// Returns `ValidationError` without touching the cache or the evaluator
    /// when the genome invariant does not hold. An evaluator failure is
    /// cached as [`Fitness::failed`] and returned as the error; later lookups
    /// of the same key return the cached failure fitness.
    pub fn try_evaluate(&self, arch: &Architecture) -> Result<Fitness> {
        if let Err(e) = arch.validate() {
            self.rejected.fetch_add(1, Ordering::Relaxed);
            return Err(e);
        }

        let key = arch.key();
        if let Some(fitness) = self.store.lock().entries.get(&key).copied() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(fitness);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        // the lock is not held while the evaluator runs
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        let outcome = self.evaluator.run(arch).and_then(check_fitness);

        match outcome {
            Ok(fitness) => {
                debug!(
                    architecture = %arch,
                    accuracy = fitness.accuracy,
                    param_count = fitness.param_count,
                    "Evaluated architecture"
                );
                Ok(self.store_result(key, fitness))
            }
            Err(e) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                let stored = self.store_result(key, Fitness::failed());
                if stored.is_failure() {
                    Err(e)
                } else {
                    // a concurrent evaluation of the same key succeeded first
                    Ok(stored)
                }
            }
        }
    }

    /// Insert unless another writer got there first; returns the retained value.
    ///
    /// A stored failure is replaced by a successful result racing in behind it.
    fn store_result(&self, key: ArchitectureKey, fitness: Fitness) -> Fitness {
        let mut store = self.store.lock();

        if let Some(existing) = store.entries.get_mut(&key) {
            if existing.is_failure() && !fitness.is_failure() {
                *existing = fitness;
            }
            return *existing;
        }

        store.entries.insert(key.clone(), fitness);
        store.insertion_order.push_back(key);

        if let CachePolicy::Bounded { max_entries } = self.policy {
            while store.entries.len() > max_entries.max(1) {
                match store.insertion_order.pop_front() {
                    Some(oldest) => {
                        store.entries.remove(&oldest);
                    }
                    None => break,
                }
            }
        }

        fitness
    }

    /// Cached fitness for `arch`, if any
    pub fn get(&self, arch: &Architecture) -> Option<Fitness> {
        self.store.lock().entries.get(&arch.key()).copied()
    }

    /// Check if `arch` has a cached fitness
    pub fn contains(&self, arch: &Architecture) -> bool {
        self.store.lock().entries.contains_key(&arch.key())
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.store.lock().entries.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Retention policy
    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Drop every entry and reset the counters
    pub fn clear(&self) {
        let mut store = self.store.lock();
        store.entries.clear();
        store.insertion_order.clear();
        drop(store);

        for counter in [
            &self.hits,
            &self.misses,
            &self.evaluations,
            &self.failures,
            &self.rejected,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }

    /// Number of evaluator invocations so far
    pub fn evaluation_count(&self) -> u64 {
        self.evaluations.load(Ordering::Relaxed)
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        CacheStats {
            hits,
            misses,
            evaluations: self.evaluations.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            entries: self.len(),
            hit_rate,
        }
    }
}

fn check_fitness(fitness: Fitness) -> Result<Fitness> {
    if !(0.0..=1.0).contains(&fitness.accuracy) {
        return Err(ArchSearchError::EvaluatorError(format!(
            "accuracy {} outside [0, 1]",
            fitness.accuracy
        )));
    }
    Ok(fitness)
}
