//! Error types for the architecture search engine

use thiserror::Error;

/// Result type alias for search operations
pub type Result<T> = std::result::Result<T, ArchSearchError>;

/// Main error type for the search engine
#[derive(Error, Debug)]
pub enum ArchSearchError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Evaluator error: {0}")]
    EvaluatorError(String),

    #[error("Evaluation timed out after {seconds:.3}s")]
    Timeout { seconds: f64 },

    #[error("Operational error: {0}")]
    OperationalError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("No valid results")]
    NoValidResults,

    #[error("Thread pool error: {0}")]
    ThreadPoolError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl ArchSearchError {
    /// Errors the evaluation cache absorbs into the failure fitness.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ArchSearchError::ValidationError(_)
                | ArchSearchError::EvaluatorError(_)
                | ArchSearchError::Timeout { .. }
        )
    }
}

impl From<serde_json::Error> for ArchSearchError {
    fn from(err: serde_json::Error) -> Self {
        ArchSearchError::SerializationError(err.to_string())
    }
}

impl From<rayon::ThreadPoolBuildError> for ArchSearchError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        ArchSearchError::ThreadPoolError(err.to_string())
    }
}
