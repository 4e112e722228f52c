//! Routes for the chapter collection.

use axum::extract::{Path, Query, State};
use axum::{Json, Router, routing::get, routing::post, routing::put};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use storyforge_core::gateway::CompileOptions;
use storyforge_core::model::Chapter;

use crate::error::ApiError;
use crate::routes::{ConfirmQuery, DeletionOutcome, Mutated};
use crate::state::AppState;

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct CreateChapterRequest {
    /// Title of the new chapter.
    pub title: String,
}

/// Request body for PUT /{chapter_id}.
#[derive(Debug, Deserialize)]
pub struct RenameChapterRequest {
    /// The new chapter title.
    pub title: String,
}

/// Response body for POST /{chapter_id}/compile.
#[derive(Debug, Serialize)]
pub struct CompiledChapter {
    /// The compiled document.
    pub content: String,
}

/// GET / — loads the list from the store, then snapshots it.
#[instrument(skip(state))]
async fn list_chapters(State(state): State<AppState>) -> Result<Json<Vec<Chapter>>, ApiError> {
    state.workspace.load_chapters().await?;
    Ok(Json(state.workspace.chapters()))
}

/// POST /
#[instrument(skip(state, request))]
async fn create_chapter(
    State(state): State<AppState>,
    Json(request): Json<CreateChapterRequest>,
) -> Result<Json<Mutated<Chapter>>, ApiError> {
    let created = state.workspace.create_chapter(&request.title).await?;
    Ok(Json(created.into()))
}

/// PUT /{chapter_id}
#[instrument(skip(state, request))]
async fn rename_chapter(
    State(state): State<AppState>,
    Path(chapter_id): Path<Uuid>,
    Json(request): Json<RenameChapterRequest>,
) -> Result<Json<Mutated<Chapter>>, ApiError> {
    let renamed = state
        .workspace
        .rename_chapter(chapter_id, &request.title)
        .await?;
    Ok(Json(renamed.into()))
}

/// DELETE /{chapter_id}?confirm=
#[instrument(skip(state))]
async fn delete_chapter(
    State(state): State<AppState>,
    Path(chapter_id): Path<Uuid>,
    Query(query): Query<ConfirmQuery>,
) -> Result<Json<DeletionOutcome>, ApiError> {
    let deleted = state
        .workspace
        .delete_chapter(chapter_id, move || query.confirm)
        .await?;
    Ok(Json(DeletionOutcome { deleted }))
}

/// POST /{chapter_id}/compile
#[instrument(skip(state, options))]
async fn compile_chapter(
    State(state): State<AppState>,
    Path(chapter_id): Path<Uuid>,
    options: Option<Json<CompileOptions>>,
) -> Result<Json<CompiledChapter>, ApiError> {
    let options = options.map_or_else(CompileOptions::default, |Json(options)| options);
    let content = state.workspace.compile_chapter(chapter_id, &options).await?;
    Ok(Json(CompiledChapter { content }))
}

/// Returns the router for the chapter context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_chapters).post(create_chapter))
        .route("/{chapter_id}", put(rename_chapter).delete(delete_chapter))
        .route("/{chapter_id}/compile", post(compile_chapter))
}
