//! Error taxonomy for the orchestration core.

use thiserror::Error;

/// Top-level error type surfaced by the store and workflows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrchestrationError {
    /// Input rejected before any remote call (empty/whitespace title,
    /// content, name, or raw text).
    #[error("validation error: {0}")]
    Validation(String),

    /// A mutation was requested on a key that already has one in flight.
    /// Carries the busy key.
    #[error("operation already in progress: {0}")]
    AlreadyInProgress(String),

    /// The operation is not permitted in the current state (e.g. splitting
    /// a chapter that already has scenes).
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Upstream 429-class failure.
    #[error("temporarily unavailable, retry later: {0}")]
    RateLimited(String),

    /// Any other collaborator failure; the detail is surfaced verbatim.
    #[error("remote error: {0}")]
    Remote(String),

    /// A superseded async response. Internal only: dropped silently, never
    /// shown to the rendering layer.
    #[error("stale response")]
    Stale,
}

/// Failure reported by a remote collaborator. Carries a human-readable
/// detail and distinguishes the rate-limit class from everything else.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The collaborator answered with a 429-class failure.
    #[error("temporarily unavailable, retry later: {detail}")]
    RateLimited {
        /// Human-readable detail from the collaborator.
        detail: String,
    },

    /// Any other collaborator failure.
    #[error("{detail}")]
    Remote {
        /// Human-readable detail from the collaborator.
        detail: String,
    },
}

impl From<GatewayError> for OrchestrationError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::RateLimited { detail } => Self::RateLimited(detail),
            GatewayError::Remote { detail } => Self::Remote(detail),
        }
    }
}

/// Rejects empty or whitespace-only input with a `Validation` error naming
/// the field.
///
/// # Errors
///
/// Returns `OrchestrationError::Validation` when `value` has no
/// non-whitespace characters.
pub fn require_non_blank(field: &str, value: &str) -> Result<(), OrchestrationError> {
    if value.trim().is_empty() {
        return Err(OrchestrationError::Validation(format!(
            "{field} must not be empty"
        )));
    }
    Ok(())
}
