//! Screening for AI responses that are errors disguised as content.
//!
//! The AI collaborator sometimes reports a client-visible failure as a
//! successful response whose title or content begins with a literal marker.
//! This module is the single place that recognizes the marker and turns it
//! into a proper `GatewayError`; nothing else in the workspace checks for
//! the sentinel string.

use crate::error::GatewayError;

/// Literal prefix the AI collaborator uses for failures returned as content.
pub const AI_FAILURE_MARKER: &str = "ERROR:";

/// Checks a generated title/content pair for the failure marker.
///
/// A payload is an error iff its title or content begins with
/// [`AI_FAILURE_MARKER`]. The remainder of the marked field is the detail;
/// details naming a 429 or rate limit classify as `RateLimited`, everything
/// else as `Remote`.
///
/// # Errors
///
/// Returns the classified `GatewayError` when the marker is present.
pub fn screen_ai_payload(title: &str, content: &str) -> Result<(), GatewayError> {
    for field in [title, content] {
        if let Some(detail) = field.trim_start().strip_prefix(AI_FAILURE_MARKER) {
            return Err(classify_detail(detail.trim()));
        }
    }
    Ok(())
}

fn classify_detail(detail: &str) -> GatewayError {
    let lowered = detail.to_lowercase();
    if lowered.contains("429") || lowered.contains("rate limit") {
        GatewayError::RateLimited {
            detail: detail.to_string(),
        }
    } else {
        GatewayError::Remote {
            detail: detail.to_string(),
        }
    }
}
