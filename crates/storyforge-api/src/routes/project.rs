//! Routes for the active project.

use axum::extract::State;
use axum::{Json, Router, routing::get, routing::post, routing::put};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use storyforge_core::model::Project;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /open.
#[derive(Debug, Deserialize)]
pub struct OpenProjectRequest {
    /// The project to open.
    pub project_id: Uuid,
}

/// Request body for PUT /name.
#[derive(Debug, Deserialize)]
pub struct RenameProjectRequest {
    /// The new project name.
    pub name: String,
}

/// Snapshot of the active project.
#[derive(Debug, Serialize)]
pub struct ProjectSnapshot {
    /// The active project, if one is open.
    pub project: Option<Project>,
    /// Whether any tracked operation is currently in flight.
    pub any_busy: bool,
}

fn snapshot(state: &AppState) -> ProjectSnapshot {
    ProjectSnapshot {
        project: state.workspace.project(),
        any_busy: state.workspace.registry().is_any_busy(),
    }
}

/// POST /open
#[instrument(skip(state, request), fields(project_id = %request.project_id))]
async fn open_project(
    State(state): State<AppState>,
    Json(request): Json<OpenProjectRequest>,
) -> Result<Json<ProjectSnapshot>, ApiError> {
    info!("opening project");
    state.workspace.open_project(request.project_id).await?;
    Ok(Json(snapshot(&state)))
}

/// GET /
#[instrument(skip(state))]
async fn get_project(State(state): State<AppState>) -> Json<ProjectSnapshot> {
    Json(snapshot(&state))
}

/// PUT /name
#[instrument(skip(state, request))]
async fn rename_project(
    State(state): State<AppState>,
    Json(request): Json<RenameProjectRequest>,
) -> Result<Json<ProjectSnapshot>, ApiError> {
    state.workspace.rename_project(&request.name).await?;
    Ok(Json(snapshot(&state)))
}

/// Returns the router for the project context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/open", post(open_project))
        .route("/", get(get_project))
        .route("/name", put(rename_project))
}
