//! Error types for the rendering crate.

use thiserror::Error;

use crate::backend::BackendError;

/// Errors raised by buffer management and drawing.
///
/// Invalid drawer parameters are not errors; see
/// [`TickOutcome::Skipped`](crate::TickOutcome::Skipped).
#[derive(Debug, Error)]
pub enum DrawError {
    /// CPU storage or a backend buffer could not be allocated.
    #[error("failed to allocate {what} for {capacity} instances")]
    AllocationFailure {
        /// Which storage failed.
        what: &'static str,
        /// Requested capacity in instances.
        capacity: usize,
    },

    /// The render backend refused an operation.
    #[error("render backend error: {0}")]
    Backend(#[from] BackendError),

    /// A configuration document could not be parsed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Storage was accessed before initialization.
    #[error("instance buffers are not initialized")]
    NotInitialized,
}

/// Result type for drawing operations.
pub type DrawResult<T> = Result<T, DrawError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BufferId;

    #[test]
    fn test_error_display() {
        let err = DrawError::AllocationFailure {
            what: "matrices",
            capacity: 512,
        };
        assert_eq!(err.to_string(), "failed to allocate matrices for 512 instances");

        let err: DrawError = BackendError::UnknownBuffer(BufferId(3)).into();
        assert_eq!(err.to_string(), "render backend error: unknown buffer BufferId(3)");
    }
}
