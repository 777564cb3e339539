//! Error types for During.

use std::sync::Arc;

use thiserror::Error;

use crate::operation::OperationKind;

/// Result type alias using During's Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Error produced by a caller-supplied predicate.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for During operations.
///
/// The error is cheap to clone so that the same failure can be handed to a
/// pipeline's error callback and returned from [`Pipeline::run`].
///
/// [`Pipeline::run`]: crate::pipeline::Pipeline::run
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// No registered operation has this name.
    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    /// The arguments or predicate given for an operation have the wrong shape.
    #[error("invalid arguments for {operation}: {reason}")]
    InvalidArguments {
        /// Operation the arguments were given for.
        operation: OperationKind,
        /// What was wrong with them.
        reason: String,
    },

    /// A per-element predicate reported an error.
    #[error("step {step} ({operation}) failed on element {index}: {source}")]
    Predicate {
        /// Position of the failing step in the pipeline.
        step: usize,
        /// Operation of the failing step.
        operation: OperationKind,
        /// Position of the element whose predicate failed.
        index: usize,
        /// The error reported by the predicate.
        #[source]
        source: Arc<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// The pipeline has already been handed off for execution.
    #[error("pipeline has already been run")]
    AlreadyRun,

    /// The run was dropped before it reached a terminal state.
    #[error("pipeline run was cancelled")]
    Cancelled,

    /// A spawned pipeline task did not complete.
    #[error("pipeline task failed: {0}")]
    Join(String),
}

impl Error {
    /// Build a predicate error from the caller's boxed error.
    pub(crate) fn predicate(
        step: usize,
        operation: OperationKind,
        index: usize,
        source: BoxError,
    ) -> Self {
        Error::Predicate {
            step,
            operation,
            index,
            source: Arc::from(source),
        }
    }

    pub(crate) fn invalid_arguments(operation: OperationKind, reason: impl Into<String>) -> Self {
        Error::InvalidArguments {
            operation,
            reason: reason.into(),
        }
    }

    /// The caller's error, if this failure came from a predicate.
    pub fn predicate_source(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Error::Predicate { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
