//! Routes for the chapter-split workflow.

use axum::extract::State;
use axum::{Json, Router, routing::get, routing::post};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use storyforge_core::model::SceneProposal;
use storyforge_drafting::SplitState;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /start.
#[derive(Debug, Deserialize)]
pub struct StartSplitRequest {
    /// The chapter to split into.
    pub chapter_id: Uuid,
    /// Raw pasted chapter text.
    pub raw_text: String,
}

/// Rendering-layer view of the split workflow.
#[derive(Debug, Serialize)]
pub struct SplitView {
    /// Current phase name.
    pub phase: &'static str,
    /// Target chapter, when a split is in play.
    pub chapter_id: Option<Uuid>,
    /// Proposals pending commit (all of them under review, only the
    /// unsucceeded ones after a partial failure).
    pub proposals: Vec<SceneProposal>,
    /// Per-proposal failure messages from the last commit attempt.
    pub errors: Vec<String>,
}

fn view(state: &AppState) -> SplitView {
    match state.splits.state() {
        SplitState::Idle => SplitView {
            phase: "idle",
            chapter_id: None,
            proposals: vec![],
            errors: vec![],
        },
        SplitState::Splitting { chapter_id } => SplitView {
            phase: "splitting",
            chapter_id: Some(chapter_id),
            proposals: vec![],
            errors: vec![],
        },
        SplitState::ReviewReady {
            chapter_id,
            proposals,
        } => SplitView {
            phase: "review_ready",
            chapter_id: Some(chapter_id),
            proposals,
            errors: vec![],
        },
        SplitState::Committing { chapter_id } => SplitView {
            phase: "committing",
            chapter_id: Some(chapter_id),
            proposals: vec![],
            errors: vec![],
        },
        SplitState::PartiallyFailed {
            chapter_id,
            remaining,
            errors,
        } => SplitView {
            phase: "partially_failed",
            chapter_id: Some(chapter_id),
            proposals: remaining,
            errors,
        },
    }
}

/// POST /start
#[instrument(skip(state, request), fields(chapter_id = %request.chapter_id))]
async fn start(
    State(state): State<AppState>,
    Json(request): Json<StartSplitRequest>,
) -> Result<Json<SplitView>, ApiError> {
    state
        .splits
        .split(request.chapter_id, &request.raw_text)
        .await?;
    Ok(Json(view(&state)))
}

/// POST /commit-all
#[instrument(skip(state))]
async fn commit_all(State(state): State<AppState>) -> Result<Json<SplitView>, ApiError> {
    state.splits.commit_all().await?;
    Ok(Json(view(&state)))
}

/// POST /discard
#[instrument(skip(state))]
async fn discard(State(state): State<AppState>) -> Json<SplitView> {
    state.splits.discard();
    Json(view(&state))
}

/// GET /
#[instrument(skip(state))]
async fn get_state(State(state): State<AppState>) -> Json<SplitView> {
    Json(view(&state))
}

/// Returns the router for the split workflow.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/start", post(start))
        .route("/commit-all", post(commit_all))
        .route("/discard", post(discard))
        .route("/", get(get_state))
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

    async fn open_state() -> (Arc<InMemoryPersistence>, Arc<ScriptedAi>, AppState, Uuid) {
        let persistence = Arc::new(InMemoryPersistence::new());
        let ai = Arc::new(ScriptedAi::new());
        let state = AppState::new(
            Arc::clone(&persistence) as Arc<dyn PersistenceGateway>,
            Arc::clone(&ai) as Arc<dyn AiGateway>,
        );
        let project = persistence.seed_project("Long Night");
        state.workspace.open_project(project.id).await.unwrap();
        let chapter = persistence.seed_chapter(project.id, "Ch", 1);
        state.workspace.load_scenes(chapter.id).await.unwrap();
        (persistence, ai, state, chapter.id)
    }

    fn post_json(uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap()
    }

    fn proposal(title: &str, content: &str) -> SceneProposal {
        SceneProposal {
            title: title.to_string(),
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn test_start_then_commit_all_creates_scenes() {
        // Arrange
        let (_persistence, ai, state, chapter_id) = open_state().await;
        ai.push_split(Ok(vec![proposal("X", "first"), proposal("Y", "second")]));
        let app = router().with_state(state.clone());
        let body = serde_json::json!({ "chapter_id": chapter_id, "raw_text": "X\n\nY" });

        let response = app
            .clone()
            .oneshot(post_json("/start", &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let request = Request::builder()
            .method("POST")
            .uri("/commit-all")
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
        assert_eq!(json["phase"], "idle");
        let orders: Vec<u32> = state
            .workspace
            .scenes(chapter_id)
            .unwrap()
            .iter()
            .map(|s| s.order)
            .collect();
        assert_eq!(orders, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_start_on_non_empty_chapter_maps_to_409() {
        // Arrange
        let (persistence, ai, state, chapter_id) = open_state().await;
        persistence.seed_scene(chapter_id, "Existing", 1, "x");
        state.workspace.load_scenes(chapter_id).await.unwrap();
        let app = router().with_state(state);
        let body = serde_json::json!({ "chapter_id": chapter_id, "raw_text": "text" });

        // Act
        let response = app.oneshot(post_json("/start", &body)).await.unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"], "invalid_state");
        assert_eq!(ai.call_count("split_chapter_into_scenes"), 0);
    }

    #[tokio::test]
    async fn test_partial_failure_reports_remaining_and_errors() {
        // Arrange
        let (persistence, ai, state, chapter_id) = open_state().await;
        ai.push_split(Ok(vec![
            proposal("One", "a"),
            proposal("Two", "b"),
            proposal("Three", "c"),
        ]));
        state
            .splits
            .split(chapter_id, "One\n\nTwo\n\nThree")
            .await
            .unwrap();
        persistence.fail_on_call(
            "create_scene",
            2,
            storyforge_core::error::GatewayError::Remote {
                detail: "write failed".to_string(),
            },
        );
        let app = router().with_state(state.clone());

        let request = Request::builder()
            .method("POST")
            .uri("/commit-all")
            .body(Body::empty())
            .unwrap();

        // Act
        let response = app.clone().oneshot(request).await.unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["phase"], "partially_failed");
        assert_eq!(json["proposals"][0]["title"], "Two");
        assert_eq!(json["errors"].as_array().unwrap().len(), 1);
    }
}
