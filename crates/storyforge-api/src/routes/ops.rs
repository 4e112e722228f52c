//! Routes for operation tracking and project-wide maintenance.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::{Json, Router, routing::get, routing::post};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use storyforge_tracking::OpKey;

use crate::error::ApiError;
use crate::state::AppState;

/// Query parameters for GET /busy.
#[derive(Debug, Deserialize)]
pub struct BusyQuery {
    /// Optional busy key to look up individually.
    pub key: Option<String>,
}

/// Per-key status, when a key was asked for.
#[derive(Debug, Serialize)]
pub struct KeyStatus {
    /// Whether an operation on the key is in flight.
    pub busy: bool,
    /// The last recorded failure for the key, if any.
    pub last_error: Option<String>,
}

/// Response body for GET /busy.
#[derive(Debug, Serialize)]
pub struct BusyResponse {
    /// Whether any tracked operation is in flight.
    pub any_busy: bool,
    /// Status of the requested key.
    pub key: Option<KeyStatus>,
}

/// GET /busy?key=
#[instrument(skip(state))]
async fn busy(
    State(state): State<AppState>,
    Query(query): Query<BusyQuery>,
) -> Json<BusyResponse> {
    let registry = state.workspace.registry();
    let key = query.key.map(|raw| {
        let key = OpKey::raw(&raw);
        KeyStatus {
            busy: registry.is_busy(&key),
            last_error: registry.last_error(&key).map(|e| e.to_string()),
        }
    });
    Json(BusyResponse {
        any_busy: registry.is_any_busy(),
        key,
    })
}

/// POST /rebuild
#[instrument(skip(state))]
async fn rebuild(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.workspace.rebuild_index().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Returns the router for operation tracking.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/busy", get(busy))
        .route("/rebuild", post(rebuild))
}
