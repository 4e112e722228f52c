//! Routes for the character roster.

use axum::extract::{Path, Query, State};
use axum::{Json, Router, routing::delete, routing::get};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use storyforge_core::model::Character;

use crate::error::ApiError;
use crate::routes::{ConfirmQuery, DeletionOutcome, Mutated};
use crate::state::AppState;

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct CreateCharacterRequest {
    /// Name of the new character.
    pub name: String,
}

/// GET / — loads the roster from the store, then snapshots it.
#[instrument(skip(state))]
async fn list_characters(
    State(state): State<AppState>,
) -> Result<Json<Vec<Character>>, ApiError> {
    state.workspace.load_characters().await?;
    Ok(Json(state.workspace.characters()))
}

/// POST /
#[instrument(skip(state, request))]
async fn create_character(
    State(state): State<AppState>,
    Json(request): Json<CreateCharacterRequest>,
) -> Result<Json<Mutated<Character>>, ApiError> {
    let created = state.workspace.create_character(&request.name).await?;
    Ok(Json(created.into()))
}

/// DELETE /{character_id}?confirm=
#[instrument(skip(state))]
async fn delete_character(
    State(state): State<AppState>,
    Path(character_id): Path<Uuid>,
    Query(query): Query<ConfirmQuery>,
) -> Result<Json<DeletionOutcome>, ApiError> {
    let deleted = state
        .workspace
        .delete_character(character_id, move || query.confirm)
        .await?;
    Ok(Json(DeletionOutcome { deleted }))
}

/// Returns the router for the character context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_characters).post(create_character))
        .route("/{character_id}", delete(delete_character))
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

    async fn open_state() -> (Arc<InMemoryPersistence>, AppState) {
        let persistence = Arc::new(InMemoryPersistence::new());
        let ai = Arc::new(ScriptedAi::new());
        let state = AppState::new(
            Arc::clone(&persistence) as Arc<dyn PersistenceGateway>,
            ai as Arc<dyn AiGateway>,
        );
        let project = persistence.seed_project("Long Night");
        state.workspace.open_project(project.id).await.unwrap();
        (persistence, state)
    }

    #[tokio::test]
    async fn test_list_characters_sorted_by_name() {
        // Arrange
        let (persistence, state) = open_state().await;
        let project_id = state.workspace.project().unwrap().id;
        persistence.seed_character(project_id, "Mira");
        persistence.seed_character(project_id, "Aldous");
        let app = router().with_state(state);

        let request = Request::builder().uri("/").body(Body::empty()).unwrap();

        // Act
        let response = app.oneshot(request).await.unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        let names: Vec<&str> = json
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Aldous", "Mira"]);
    }

    #[tokio::test]
    async fn test_create_character_with_blank_name_maps_to_400() {
        // Arrange
        let (_persistence, state) = open_state().await;
        let app = router().with_state(state);
        let body = serde_json::json!({ "name": "" });

        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();

        // Act
        let response = app.oneshot(request).await.unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_declined_keeps_character() {
        // Arrange
        let (persistence, state) = open_state().await;
        let project_id = state.workspace.project().unwrap().id;
        let character = persistence.seed_character(project_id, "Mira");
        state.workspace.load_characters().await.unwrap();
        let app = router().with_state(state.clone());

        let request = Request::builder()
            .method("DELETE")
            .uri(format!("/{}?confirm=false", character.id))
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
        assert_eq!(json["deleted"], false);
        assert_eq!(state.workspace.characters().len(), 1);
    }
}
