//! Per-generation logbook

use std::fmt;

use serde::{Deserialize, Serialize};

use super::stats::StatsSummary;
use crate::nas::Fitness;

/// One logbook row: objective statistics over a population
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogbookRow {
    /// Generation index (0 = initial population)
    pub gen: usize,
    /// Evaluator invocations during this generation
    pub nevals: u64,
    /// Individuals with a successful evaluation
    pub valid: usize,
    /// Accuracy statistics
    pub accuracy: StatsSummary,
    /// Parameter count statistics
    pub param_count: StatsSummary,
}

impl LogbookRow {
    /// Summarize the fitness of a population
    pub fn record(gen: usize, nevals: u64, fitnesses: &[Fitness]) -> Self {
        let (accuracy, params): (Vec<f64>, Vec<f64>) = fitnesses
            .iter()
            .filter(|f| !f.is_failure())
            .map(|f| (f.accuracy, f.param_count as f64))
            .unzip();

        Self {
            gen,
            nevals,
            valid: accuracy.len(),
            accuracy: StatsSummary::from_values(&accuracy),
            param_count: StatsSummary::from_values(&params),
        }
    }
}

/// Ordered per-generation statistics of one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Logbook {
    rows: Vec<LogbookRow>,
}

impl Logbook {
    /// Create an empty logbook
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row
    pub fn push(&mut self, row: LogbookRow) {
        self.rows.push(row);
    }

    /// All rows in generation order
    pub fn rows(&self) -> &[LogbookRow] {
        &self.rows
    }

    /// Most recent row
    pub fn last(&self) -> Option<&LogbookRow> {
        self.rows.last()
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the logbook is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Total evaluator invocations across all rows
    pub fn total_evaluations(&self) -> u64 {
        self.rows.iter().map(|r| r.nevals).sum()
    }
}

impl fmt::Display for Logbook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>4} {:>6} {:>9} {:>9} {:>9} {:>12} {:>12}",
            "gen", "nevals", "acc_avg", "acc_std", "acc_max", "params_avg", "params_min"
        )?;
        for row in &self.rows {
            writeln!(
                f,
                "{:>4} {:>6} {:>9.4} {:>9.4} {:>9.4} {:>12.0} {:>12.0}",
                row.gen,
                row.nevals,
                row.accuracy.mean,
                row.accuracy.std,
                row.accuracy.max,
                row.param_count.mean,
                row.param_count.min
            )?;
        }
        Ok(())
    }
}
