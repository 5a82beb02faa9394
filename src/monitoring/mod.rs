//! Monitoring module
//!
//! Per-generation logbook and result-set statistics.

mod logbook;
mod stats;

pub use logbook::{Logbook, LogbookRow};
pub use stats::{ResultStatistics, StatsSummary};
