//! Route for rephrase suggestions over a text selection.

use axum::extract::State;
use axum::{Json, Router, routing::post};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use storyforge_core::error::{OrchestrationError, require_non_blank};
use storyforge_core::gateway::RephraseRequest;
use storyforge_tracking::OpKey;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct RephraseBody {
    /// The text to rephrase.
    pub selected_text: String,
    /// Prose immediately before the selection.
    #[serde(default)]
    pub context_before: String,
    /// Prose immediately after the selection.
    #[serde(default)]
    pub context_after: String,
}

/// Response body for POST /.
#[derive(Debug, Serialize)]
pub struct RephraseSuggestions {
    /// Alternative phrasings, best first.
    pub suggestions: Vec<String>,
}

/// POST / — stateless: tracked like any operation, but nothing in the
/// workspace changes.
#[instrument(skip(state, body))]
async fn rephrase(
    State(state): State<AppState>,
    Json(body): Json<RephraseBody>,
) -> Result<Json<RephraseSuggestions>, ApiError> {
    require_non_blank("selected text", &body.selected_text)?;
    let project_id = state.workspace.active_project_id()?;

    let key = OpKey::rephrase(project_id);
    state.workspace.registry().try_begin(&key)?;
    let request = RephraseRequest {
        selected_text: body.selected_text,
        context_before: body.context_before,
        context_after: body.context_after,
    };
    match state.ai.rephrase_text(project_id, &request).await {
        Ok(suggestions) => {
            state.workspace.registry().end(&key, None);
            Ok(Json(RephraseSuggestions { suggestions }))
        }
        Err(err) => {
            let err = OrchestrationError::from(err);
            state.workspace.registry().end(&key, Some(err.clone()));
            Err(err.into())
        }
    }
}

/// Returns the rephrase router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(rephrase))
}
