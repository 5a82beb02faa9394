//! Evaluation caching
//!
//! Session-scoped memoization of the objective evaluator, shared by every
//! search strategy in a run.

mod evaluation;

pub use evaluation::{CachePolicy, CacheStats, EvaluationCache};
