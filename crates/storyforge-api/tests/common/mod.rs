//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use storyforge_api::routes;
use storyforge_api::state::AppState;
use storyforge_core::gateway::{AiGateway, PersistenceGateway};
use storyforge_test_support::{InMemoryPersistence, ScriptedAi};

/// Everything a flow test needs: the app router plus handles to the fakes
/// and the shared state.
pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub persistence: Arc<InMemoryPersistence>,
    pub ai: Arc<ScriptedAi>,
}

/// Build the full app router over in-memory fakes. Uses the same route
/// structure as `main.rs`.
pub fn build_test_app() -> TestApp {
    let persistence = Arc::new(InMemoryPersistence::new());
    let ai = Arc::new(ScriptedAi::new());
    let state = AppState::new(
        Arc::clone(&persistence) as Arc<dyn PersistenceGateway>,
        Arc::clone(&ai) as Arc<dyn AiGateway>,
    );
    TestApp {
        app: routes::app(state.clone()),
        state,
        persistence,
        ai,
    }
}

/// Send a GET request and return the response status and JSON body.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();
    send(app, request).await
}

/// Send a POST request with an empty body and return the response.
pub async fn post_empty(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// Send a PUT request with a JSON body and return the response.
pub async fn put_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("PUT")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();
    send(app, request).await
}

/// Send a DELETE request and return the response.
pub async fn delete(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}
