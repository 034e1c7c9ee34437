//! Fatal engine errors.
//!
//! Everything recoverable is a [`crate::diagnostics::Diagnostic`]; these are
//! the only conditions that stop a run.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The spec document is not a tree the extractor can walk.
    #[error("invalid input shape: {0}")]
    InvalidInputShape(String),

    /// Config values that would make the run meaningless.
    #[error("invalid config: {0}")]
    Config(String),
}
