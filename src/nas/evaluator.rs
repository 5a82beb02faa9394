//! Architecture Evaluator
//!
//! The boundary between the search engine and whatever trains and scores a
//! candidate network. The engine only ever sees a [`Fitness`].

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::search_space::Architecture;
use crate::error::{ArchSearchError, Result};

/// Parameter count recorded for failed or invalid architectures; stands in
/// for an infinite size so the failure is dominated by every real result.
pub const INFEASIBLE_PARAMS: u64 = u64::MAX;

/// Two-objective fitness: maximize `accuracy`, minimize `param_count`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fitness {
    /// Validation accuracy in `[0, 1]`
    pub accuracy: f64,
    /// Trainable parameters
    pub param_count: u64,
}

impl Fitness {
    /// Create a new fitness value
    pub fn new(accuracy: f64, param_count: u64) -> Self {
        Self {
            accuracy,
            param_count,
        }
    }

    /// The sentinel `(0.0, +inf)` assigned to failures
    pub fn failed() -> Self {
        Self::new(0.0, INFEASIBLE_PARAMS)
    }

    /// Whether this is the failure sentinel
    pub fn is_failure(&self) -> bool {
        self.param_count == INFEASIBLE_PARAMS
    }

    /// Pareto dominance: at least as good on both objectives and strictly
    /// better on one.
    pub fn dominates(&self, other: &Fitness) -> bool {
        let no_worse =
            self.accuracy >= other.accuracy && self.param_count <= other.param_count;
        let better = self.accuracy > other.accuracy || self.param_count < other.param_count;
        no_worse && better
    }

    /// Lexicographic preference: higher accuracy first, then fewer parameters
    pub fn is_better_than(&self, other: &Fitness) -> bool {
        if self.accuracy != other.accuracy {
            return self.accuracy > other.accuracy;
        }
        self.param_count < other.param_count
    }

    /// Objective values as `[accuracy, param_count]`
    pub fn objectives(&self) -> [f64; 2] {
        [self.accuracy, self.param_count as f64]
    }
}

/// Trains and scores one architecture.
///
/// Implementations may fail; failures never escape the evaluation cache.
/// `run` can be called from several worker threads at once.
pub trait ObjectiveEvaluator: Send + Sync {
    /// Score one architecture
    fn run(&self, architecture: &Architecture) -> Result<Fitness>;
}

impl<F> ObjectiveEvaluator for F
where
    F: Fn(&Architecture) -> Result<Fitness> + Send + Sync,
{
    fn run(&self, architecture: &Architecture) -> Result<Fitness> {
        self(architecture)
    }
}

/// Synthetic evaluator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntheticConfig {
    /// Input feature dimension
    pub input_dim: usize,
    /// Number of output classes
    pub num_classes: usize,
    /// Dropout rate the accuracy proxy favours
    pub preferred_dropout: f64,
    /// Parameter count at which the capacity term saturates by ~63%
    pub capacity_scale: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            input_dim: 2048,
            num_classes: 10,
            preferred_dropout: 0.2,
            capacity_scale: 200_000.0,
        }
    }
}

/// Deterministic stand-in for model training.
///
/// The parameter count is exact for a dense classifier; accuracy is a smooth
/// proxy that grows with capacity and depth and falls off as dropout moves
/// away from `preferred_dropout`.
#[derive(Debug, Clone, Default)]
pub struct SyntheticEvaluator {
    config: SyntheticConfig,
}

impl SyntheticEvaluator {
    /// Create new evaluator
    pub fn new(config: SyntheticConfig) -> Self {
        Self { config }
    }

    /// Create for a given input and output size
    pub fn with_dims(input_dim: usize, num_classes: usize) -> Self {
        Self::new(SyntheticConfig {
            input_dim,
            num_classes,
            ..Default::default()
        })
    }

    /// Estimate number of parameters in architecture
    pub fn estimate_params(&self, arch: &Architecture) -> u64 {
        arch.dense_param_count(self.config.input_dim, self.config.num_classes)
    }

    fn simulate_accuracy(&self, arch: &Architecture, params: u64) -> f64 {
        let capacity = 1.0 - (-(params as f64) / self.config.capacity_scale).exp();
        let depth = arch.num_layers() as f64 / 3.0;
        let dropout_penalty = arch
            .dropout()
            .iter()
            .map(|d| (d - self.config.preferred_dropout).abs())
            .sum::<f64>()
            / arch.num_layers().max(1) as f64;

        (0.45 + 0.3 * capacity + 0.15 * depth - 0.2 * dropout_penalty).clamp(0.0, 1.0)
    }
}

impl ObjectiveEvaluator for SyntheticEvaluator {
    fn run(&self, arch: &Architecture) -> Result<Fitness> {
        if self.config.input_dim == 0 || self.config.num_classes == 0 {
            return Err(ArchSearchError::EvaluatorError(
                "input_dim and num_classes must be positive".to_string(),
            ));
        }
        let params = self.estimate_params(arch);
        Ok(Fitness::new(self.simulate_accuracy(arch, params), params))
    }
}

/// Wraps an evaluator with a wall-clock deadline.
///
/// Each call runs on its own thread; if the deadline passes first the call
/// reports [`ArchSearchError::Timeout`] and the late result is dropped.
///
/// The timed-out thread is detached, not cancelled: it keeps running (and
/// holding whatever the inner evaluator holds) until the inner call returns.
/// An inner evaluator that never returns leaks one thread per timeout.
pub struct DeadlineEvaluator<E> {
    inner: Arc<E>,
    deadline: Duration,
}

impl<E> DeadlineEvaluator<E>
where
    E: ObjectiveEvaluator + 'static,
{
    /// Wrap `inner` with `deadline`
    pub fn new(inner: E, deadline: Duration) -> Self {
        Self {
            inner: Arc::new(inner),
            deadline,
        }
    }

    /// Configured deadline
    pub fn deadline(&self) -> Duration {
        self.deadline
    }
}

impl<E> ObjectiveEvaluator for DeadlineEvaluator<E>
where
    E: ObjectiveEvaluator + 'static,
{
    fn run(&self, architecture: &Architecture) -> Result<Fitness> {
        let (tx, rx) = mpsc::channel();
        let inner = Arc::clone(&self.inner);
        let arch = architecture.clone();
        let start = Instant::now();

        thread::Builder::new()
            .name("archsearch-eval".to_string())
            .spawn(move || {
                // receiver may be gone after a timeout
                let _ = tx.send(inner.run(&arch));
            })?;

        match rx.recv_timeout(self.deadline) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                warn!(
                    architecture = %architecture,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Evaluation exceeded deadline"
                );
                Err(ArchSearchError::Timeout {
                    seconds: self.deadline.as_secs_f64(),
                })
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(ArchSearchError::EvaluatorError(
                "evaluator thread terminated without a result".to_string(),
            )),
        }
    }
}
