//! Routes for the scene-draft workflow.

use axum::extract::State;
use axum::{Json, Router, routing::get, routing::post};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use storyforge_core::model::{Scene, SceneDraft};
use storyforge_drafting::DraftState;

use crate::error::ApiError;
use crate::routes::Mutated;
use crate::state::AppState;

/// Request body for POST /generate.
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    /// The chapter the draft belongs to.
    pub chapter_id: Uuid,
    /// Short summary of what the scene should contain.
    pub prompt_summary: String,
    /// Source references the generator may draw on.
    #[serde(default)]
    pub sources: Vec<String>,
}

/// Request body for POST /edit.
#[derive(Debug, Deserialize)]
pub struct EditRequest {
    /// Replacement title, if any.
    pub title: Option<String>,
    /// Replacement content, if any.
    pub content: Option<String>,
}

/// Rendering-layer view of the draft workflow.
#[derive(Debug, Serialize)]
pub struct DraftView {
    /// Current phase name.
    pub phase: &'static str,
    /// Target chapter, when a draft is in play.
    pub chapter_id: Option<Uuid>,
    /// The draft under review or being committed.
    pub draft: Option<SceneDraft>,
    /// Generation failure, when in the failed phase.
    pub error: Option<String>,
    /// Most recent commit failure, when under review after one.
    pub commit_error: Option<String>,
}

fn view(state: &AppState) -> DraftView {
    match state.drafts.state() {
        DraftState::Idle => DraftView {
            phase: "idle",
            chapter_id: None,
            draft: None,
            error: None,
            commit_error: None,
        },
        DraftState::Generating { chapter_id } => DraftView {
            phase: "generating",
            chapter_id: Some(chapter_id),
            draft: None,
            error: None,
            commit_error: None,
        },
        DraftState::ReviewReady {
            chapter_id,
            draft,
            commit_error,
        } => DraftView {
            phase: "review_ready",
            chapter_id: Some(chapter_id),
            draft: Some(draft),
            error: None,
            commit_error: commit_error.map(|e| e.to_string()),
        },
        DraftState::Committing { chapter_id, draft } => DraftView {
            phase: "committing",
            chapter_id: Some(chapter_id),
            draft: Some(draft),
            error: None,
            commit_error: None,
        },
        DraftState::Failed { chapter_id, error } => DraftView {
            phase: "failed",
            chapter_id: Some(chapter_id),
            draft: None,
            error: Some(error.to_string()),
            commit_error: None,
        },
    }
}

/// POST /generate
#[instrument(skip(state, request), fields(chapter_id = %request.chapter_id))]
async fn generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<DraftView>, ApiError> {
    state
        .drafts
        .generate(request.chapter_id, &request.prompt_summary, request.sources)
        .await?;
    Ok(Json(view(&state)))
}

/// POST /edit
#[instrument(skip(state, request))]
async fn edit(
    State(state): State<AppState>,
    Json(request): Json<EditRequest>,
) -> Result<Json<DraftView>, ApiError> {
    state
        .drafts
        .edit(request.title.as_deref(), request.content.as_deref())?;
    Ok(Json(view(&state)))
}

/// POST /commit
#[instrument(skip(state))]
async fn commit(State(state): State<AppState>) -> Result<Json<Mutated<Scene>>, ApiError> {
    let scene = state.drafts.commit().await?;
    Ok(Json(scene.into()))
}

/// POST /discard
#[instrument(skip(state))]
async fn discard(State(state): State<AppState>) -> Json<DraftView> {
    state.drafts.discard();
    Json(view(&state))
}

/// GET /
#[instrument(skip(state))]
async fn get_state(State(state): State<AppState>) -> Json<DraftView> {
    Json(view(&state))
}

/// Returns the router for the draft workflow.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/generate", post(generate))
        .route("/edit", post(edit))
        .route("/commit", post(commit))
        .route("/discard", post(discard))
        .route("/", get(get_state))
}
