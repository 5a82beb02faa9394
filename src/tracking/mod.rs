//! Run tracking
//!
//! Serializable reports of finished searches for downstream analysis.

mod report;

pub use report::{SearchReport, Strategy};
