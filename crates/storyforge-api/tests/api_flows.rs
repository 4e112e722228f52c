//! End-to-end flows over the full router with in-memory collaborators.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{build_test_app, delete, get_json, post_empty, post_json, put_json};
use storyforge_core::gateway::DraftPayload;
use storyforge_core::model::SceneProposal;

#[tokio::test]
async fn test_health_endpoint_reports_ok() {
    let t = build_test_app();

    let (status, body) = get_json(t.app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_project_lifecycle_over_http() {
    let t = build_test_app();
    let project = t.persistence.seed_project("Long Night");

    let (status, body) = post_json(
        t.app.clone(),
        "/api/v1/project/open",
        &json!({ "project_id": project.id }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["project"]["name"], "Long Night");

    let (status, body) = put_json(
        t.app.clone(),
        "/api/v1/project/name",
        &json!({ "name": "Longest Night" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["project"]["name"], "Longest Night");

    let (_, body) = get_json(t.app, "/api/v1/project").await;
    assert_eq!(body["project"]["name"], "Longest Night");
    assert_eq!(body["any_busy"], false);
}

#[tokio::test]
async fn test_chapter_orders_stay_dense_over_http() {
    let t = build_test_app();
    let project = t.persistence.seed_project("Long Night");
    post_json(
        t.app.clone(),
        "/api/v1/project/open",
        &json!({ "project_id": project.id }),
    )
    .await;
    get_json(t.app.clone(), "/api/v1/chapters").await;

    for title in ["One", "Two", "Three"] {
        let (status, _) = post_json(
            t.app.clone(),
            "/api/v1/chapters",
            &json!({ "title": title }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let second = t.state.workspace.chapters()[1].id;
    let (status, body) = delete(
        t.app.clone(),
        &format!("/api/v1/chapters/{second}?confirm=true"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], true);

    let (_, body) = get_json(t.app, "/api/v1/chapters").await;
    let summary: Vec<(String, u64)> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| {
            (
                c["title"].as_str().unwrap().to_string(),
                c["order"].as_u64().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        summary,
        vec![("One".to_string(), 1), ("Three".to_string(), 2)]
    );
}

#[tokio::test]
async fn test_split_flow_populates_empty_chapter() {
    let t = build_test_app();
    let project = t.persistence.seed_project("Long Night");
    post_json(
        t.app.clone(),
        "/api/v1/project/open",
        &json!({ "project_id": project.id }),
    )
    .await;
    let chapter = t.persistence.seed_chapter(project.id, "Pasted", 1);
    let scenes_uri = format!("/api/v1/chapters/{}/scenes", chapter.id);
    get_json(t.app.clone(), &scenes_uri).await;

    t.ai.push_split(Ok(vec![
        SceneProposal {
            title: "X".to_string(),
            content: "first".to_string(),
        },
        SceneProposal {
            title: "Y".to_string(),
            content: "second".to_string(),
        },
    ]));

    let (status, body) = post_json(
        t.app.clone(),
        "/api/v1/split/start",
        &json!({ "chapter_id": chapter.id, "raw_text": "X\n\nY" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phase"], "review_ready");
    assert_eq!(body["proposals"].as_array().unwrap().len(), 2);

    let (status, body) = post_empty(t.app.clone(), "/api/v1/split/commit-all").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phase"], "idle");

    let (_, body) = get_json(t.app, &scenes_uri).await;
    let orders: Vec<u64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["order"].as_u64().unwrap())
        .collect();
    assert_eq!(orders, vec![1, 2]);
}

#[tokio::test]
async fn test_draft_flow_appends_third_scene() {
    let t = build_test_app();
    let project = t.persistence.seed_project("Long Night");
    post_json(
        t.app.clone(),
        "/api/v1/project/open",
        &json!({ "project_id": project.id }),
    )
    .await;
    let chapter = t.persistence.seed_chapter(project.id, "Ch", 1);
    t.persistence.seed_scene(chapter.id, "One", 1, "a");
    t.persistence.seed_scene(chapter.id, "Two", 2, "b");
    let scenes_uri = format!("/api/v1/chapters/{}/scenes", chapter.id);
    get_json(t.app.clone(), &scenes_uri).await;

    t.ai.push_draft(Ok(DraftPayload {
        title: "Three".to_string(),
        content: "And then...".to_string(),
        sources: vec![],
    }));

    let (status, body) = post_json(
        t.app.clone(),
        "/api/v1/draft/generate",
        &json!({ "chapter_id": chapter.id, "prompt_summary": "continue" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phase"], "review_ready");

    let (status, body) = post_empty(t.app.clone(), "/api/v1/draft/commit").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["entity"]["order"], 3);

    let (_, body) = get_json(t.app, &scenes_uri).await;
    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["One", "Two", "Three"]);
}

#[tokio::test]
async fn test_error_shaped_draft_payload_maps_to_502() {
    let t = build_test_app();
    let project = t.persistence.seed_project("Long Night");
    post_json(
        t.app.clone(),
        "/api/v1/project/open",
        &json!({ "project_id": project.id }),
    )
    .await;
    let chapter = t.persistence.seed_chapter(project.id, "Ch", 1);
    get_json(
        t.app.clone(),
        &format!("/api/v1/chapters/{}/scenes", chapter.id),
    )
    .await;

    t.ai.push_draft(Ok(DraftPayload {
        title: "ERROR: model unavailable".to_string(),
        content: String::new(),
        sources: vec![],
    }));

    let (status, body) = post_json(
        t.app.clone(),
        "/api/v1/draft/generate",
        &json!({ "chapter_id": chapter.id, "prompt_summary": "go" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "remote_error");

    // The failure is visible on the busy key afterwards.
    let key = format!("generate:{}", chapter.id);
    let (_, body) = get_json(t.app, &format!("/api/v1/ops/busy?key={key}")).await;
    assert_eq!(body["key"]["busy"], false);
    assert!(
        body["key"]["last_error"]
            .as_str()
            .unwrap()
            .contains("model unavailable")
    );
}

#[tokio::test]
async fn test_operations_without_open_project_map_to_409() {
    let t = build_test_app();

    let (status, body) = get_json(t.app.clone(), "/api/v1/chapters").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "invalid_state");

    let (status, _) = post_empty(t.app, "/api/v1/ops/rebuild").await;
    assert_eq!(status, StatusCode::CONFLICT);
}
