//! Error taxonomy shared by every routine in the crate.

use thiserror::Error;

/// Failures reported by the factorization and realization routines.
///
/// Nothing in the crate retries on its own. Tolerances are explicit
/// parameters, so retrying with a different contour radius or cutoff is a
/// caller decision.
#[derive(Error, Debug)]
pub enum PotapovError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A caller-supplied function failed while being sampled.
    #[error("Estimation failed {context}: {source}")]
    EstimationFailure {
        context: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Decomposition did not converge: {0}")]
    Convergence(String),

    #[error("Singular matrix: {0}")]
    Singular(String),

    #[error("Precondition violated: {0}")]
    PreconditionViolation(String),
}

impl PotapovError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        PotapovError::InvalidInput(message.into())
    }

    pub(crate) fn estimation(context: impl Into<String>, source: anyhow::Error) -> Self {
        PotapovError::EstimationFailure {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PotapovError>;
