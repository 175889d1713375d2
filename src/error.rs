//! Error type shared by every fallible operation in the crate.

use thiserror::Error;

/// Errors reported by container, layer, configuration and dataset operations.
///
/// Every variant is raised before the receiver of the failing operation is
/// mutated, so a caller can treat the error as fatal for the current batch
/// without worrying about half-written state.
#[derive(Debug, Error)]
pub enum Error {
    /// Operand dimensions are incompatible for the requested operation.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Bounds-checked access, row-range view or reshape outside valid bounds.
    #[error("out of range: {0}")]
    Range(String),

    /// A hyperparameter or architecture description is invalid.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// A dataset file does not follow the expected binary format.
    #[error("invalid format: {0}")]
    Format(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
