//! Routes for a chapter's scene collection. Nested under
//! `/chapters/{chapter_id}/scenes`.

use axum::extract::{Path, Query, State};
use axum::{Json, Router, routing::delete, routing::get};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use storyforge_core::model::Scene;

use crate::error::ApiError;
use crate::routes::{ConfirmQuery, DeletionOutcome, Mutated};
use crate::state::AppState;

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct CreateSceneRequest {
    /// Title of the new scene.
    pub title: String,
    /// Prose of the new scene.
    pub content: String,
}

/// GET / — loads the chapter's scenes from the store, then snapshots them.
#[instrument(skip(state))]
async fn list_scenes(
    State(state): State<AppState>,
    Path(chapter_id): Path<Uuid>,
) -> Result<Json<Vec<Scene>>, ApiError> {
    state.workspace.load_scenes(chapter_id).await?;
    Ok(Json(state.workspace.scenes(chapter_id).unwrap_or_default()))
}

/// POST /
#[instrument(skip(state, request))]
async fn create_scene(
    State(state): State<AppState>,
    Path(chapter_id): Path<Uuid>,
    Json(request): Json<CreateSceneRequest>,
) -> Result<Json<Mutated<Scene>>, ApiError> {
    let created = state
        .workspace
        .create_scene(chapter_id, &request.title, &request.content)
        .await?;
    Ok(Json(created.into()))
}

/// DELETE /{scene_id}?confirm=
#[instrument(skip(state))]
async fn delete_scene(
    State(state): State<AppState>,
    Path((chapter_id, scene_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<ConfirmQuery>,
) -> Result<Json<DeletionOutcome>, ApiError> {
    let deleted = state
        .workspace
        .delete_scene(chapter_id, scene_id, move || query.confirm)
        .await?;
    Ok(Json(DeletionOutcome { deleted }))
}

/// Returns the router for the scene context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_scenes).post(create_scene))
        .route("/{scene_id}", delete(delete_scene))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use storyforge_core::gateway::{AiGateway, PersistenceGateway};
    use storyforge_test_support::{InMemoryPersistence, ScriptedAi};
    use tower::ServiceExt;

    /// Router as mounted by the app, so chapter-scoped paths resolve.
    fn nested() -> Router<AppState> {
        Router::new().nest("/chapters/{chapter_id}/scenes", router())
    }

    async fn open_state() -> (Arc<InMemoryPersistence>, AppState, Uuid) {
        let persistence = Arc::new(InMemoryPersistence::new());
        let ai = Arc::new(ScriptedAi::new());
        let state = AppState::new(
            Arc::clone(&persistence) as Arc<dyn PersistenceGateway>,
            ai as Arc<dyn AiGateway>,
        );
        let project = persistence.seed_project("Long Night");
        state.workspace.open_project(project.id).await.unwrap();
        let chapter = persistence.seed_chapter(project.id, "Ch", 1);
        (persistence, state, chapter.id)
    }

    #[tokio::test]
    async fn test_list_scenes_loads_in_server_order() {
        // Arrange
        let (persistence, state, chapter_id) = open_state().await;
        persistence.seed_scene(chapter_id, "Two", 2, "b");
        persistence.seed_scene(chapter_id, "One", 1, "a");
        let app = nested().with_state(state);

        let request = Request::builder()
            .uri(format!("/chapters/{chapter_id}/scenes"))
            .body(Body::empty())
            .unwrap();

        // Act
        let response = app.oneshot(request).await.unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        let titles: Vec<&str> = json
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["One", "Two"]);
    }

    #[tokio::test]
    async fn test_create_scene_appends_after_siblings() {
        // Arrange
        let (persistence, state, chapter_id) = open_state().await;
        persistence.seed_scene(chapter_id, "One", 1, "a");
        state.workspace.load_scenes(chapter_id).await.unwrap();
        let app = nested().with_state(state);
        let body = serde_json::json!({ "title": "Two", "content": "b" });

        let request = Request::builder()
            .method("POST")
            .uri(format!("/chapters/{chapter_id}/scenes"))
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();

        // Act
        let response = app.oneshot(request).await.unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["entity"]["order"], 2);
    }

    #[tokio::test]
    async fn test_create_before_loading_scenes_maps_to_409() {
        // Arrange
        let (_persistence, state, chapter_id) = open_state().await;
        let app = nested().with_state(state);
        let body = serde_json::json!({ "title": "Orphan", "content": "x" });

        let request = Request::builder()
            .method("POST")
            .uri(format!("/chapters/{chapter_id}/scenes"))
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();

        // Act
        let response = app.oneshot(request).await.unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"], "invalid_state");
    }

    #[tokio::test]
    async fn test_delete_with_confirm_renumbers_survivors() {
        // Arrange
        let (persistence, state, chapter_id) = open_state().await;
        persistence.seed_scene(chapter_id, "One", 1, "a");
        let middle = persistence.seed_scene(chapter_id, "Two", 2, "b");
        persistence.seed_scene(chapter_id, "Three", 3, "c");
        state.workspace.load_scenes(chapter_id).await.unwrap();
        let app = nested().with_state(state.clone());

        let request = Request::builder()
            .method("DELETE")
            .uri(format!(
                "/chapters/{chapter_id}/scenes/{}?confirm=true",
                middle.id
            ))
            .body(Body::empty())
            .unwrap();

        // Act
        let response = app.oneshot(request).await.unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::OK);
        let scenes = state.workspace.scenes(chapter_id).unwrap();
        let summary: Vec<(&str, u32)> = scenes
            .iter()
            .map(|s| (s.title.as_str(), s.order))
            .collect();
        assert_eq!(summary, vec![("One", 1), ("Three", 2)]);
    }
}
