//! Error types for the blend optimization core.

use thiserror::Error;

/// Errors that can occur while setting up a blend optimization.
///
/// Only input validation fails hard. Solver non-convergence and
/// missing parameter data degrade into `success = false` and warnings
/// on the result instead of surfacing here.
#[derive(Error, Debug)]
pub enum BlendError {
    /// Fewer than two materials were supplied.
    #[error("at least 2 materials are required for blending, got {0}")]
    TooFewMaterials(usize),
}

/// Result type for blend operations.
pub type BlendResult<T> = Result<T, BlendError>;
