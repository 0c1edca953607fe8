use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::time::{sleep, timeout};
use tower::ServiceExt;

use backlot::application::services::PipelineRegistry;
use backlot::infrastructure::images::MockImageClient;
use backlot::infrastructure::llm::MockLlmClient;
use backlot::infrastructure::storage::LocalProjectStore;
use backlot::presentation::{AppState, Settings, create_router};

const WAIT: Duration = Duration::from_secs(10);

fn test_router(image_delay_ms: u64) -> Router {
    let state = AppState {
        registry: Arc::new(PipelineRegistry::new(Duration::from_secs(3600))),
        store: Arc::new(LocalProjectStore::new()),
        llm: Arc::new(MockLlmClient::new(0)),
        images: Arc::new(MockImageClient::new(image_delay_ms)),
        settings: Settings::from_env(),
    };
    create_router(state)
}

async fn send_json(app: &Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn start_pipeline(app: &Router, kind: &str, project: &TempDir) -> String {
    let (status, body) = send_json(
        app,
        "POST",
        &format!("/api/pipelines/{}", kind),
        json!({ "project_path": project.path().to_str().unwrap() }),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["success"], json!(true));
    body["pipeline_id"].as_str().unwrap().to_string()
}

async fn wait_terminal(app: &Router, pipeline_id: &str) -> Value {
    timeout(WAIT, async {
        loop {
            let (status, body) =
                get(app, &format!("/api/pipelines/status/{}", pipeline_id)).await;
            assert_eq!(status, StatusCode::OK);
            let run_status = body["status"].as_str().unwrap();
            if matches!(run_status, "complete" | "error" | "cancelled") {
                return body;
            }
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("pipeline did not reach a terminal status")
}

fn writer_project() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("world_bible")).unwrap();
    std::fs::write(
        dir.path().join("world_bible/pitch.md"),
        "A courtesan poet in Tang Dynasty China hides a forbidden manuscript.",
    )
    .unwrap();
    dir
}

fn storyboard_project(frames: usize) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("storyboard")).unwrap();
    let frame_list: Vec<Value> = (0..frames)
        .map(|i| {
            json!({
                "frame_id": format!("1.{}.cA", i + 1),
                "scene_number": 1,
                "prompt": format!("Frame {}", i + 1),
                "tags": {},
            })
        })
        .collect();
    std::fs::write(
        dir.path().join("storyboard/visual_script.json"),
        json!({ "total_frames": frames, "frames": frame_list }).to_string(),
    )
    .unwrap();
    dir
}

#[tokio::test]
async fn given_health_check_when_called_then_returns_healthy() {
    let app = test_router(0);
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("healthy"));
}

#[tokio::test]
async fn given_models_endpoint_when_called_then_lists_image_models() {
    let app = test_router(0);
    let (status, body) = get(&app, "/api/models").await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body["models"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn given_unknown_kind_when_starting_then_returns_bad_request() {
    let app = test_router(0);
    let (status, _) = send_json(
        &app,
        "POST",
        "/api/pipelines/composer",
        json!({ "project_path": "/tmp/demo" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn given_empty_project_path_when_starting_then_returns_bad_request() {
    let app = test_router(0);
    let (status, _) = send_json(
        &app,
        "POST",
        "/api/pipelines/writer",
        json!({ "project_path": "" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn given_malformed_or_unknown_ids_when_polling_then_distinct_errors() {
    let app = test_router(0);

    let (status, _) = get(&app, "/api/pipelines/status/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = get(
        &app,
        "/api/pipelines/status/00000000-0000-4000-8000-000000000000",
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("not found"));

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/pipelines/cancel/00000000-0000-4000-8000-000000000000",
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn given_writer_pipeline_when_run_then_completes_and_cursor_drains() {
    let app = test_router(0);
    let project = writer_project();
    let pipeline_id = start_pipeline(&app, "writer", &project).await;

    let final_body = wait_terminal(&app, &pipeline_id).await;
    assert_eq!(final_body["status"], json!("complete"));
    assert_eq!(final_body["progress"], json!(1.0));
    assert!(final_body["error"].is_null());
    for stage in final_body["stages"].as_array().unwrap() {
        assert_eq!(stage["status"], json!("complete"));
    }

    // Full history, then an empty incremental read from the end.
    let (_, full) = get(
        &app,
        &format!("/api/pipelines/status/{}?since=0", pipeline_id),
    )
    .await;
    let total = full["next_since"].as_u64().unwrap();
    let log_count = full["logs_since"].as_array().unwrap().len() as u64;
    assert_eq!(total, log_count);
    assert!(total > 0);

    let (_, drained) = get(
        &app,
        &format!("/api/pipelines/status/{}?since={}", pipeline_id, total),
    )
    .await;
    assert_eq!(drained["status"], json!("complete"));
    assert!(drained["logs_since"].as_array().unwrap().is_empty());

    // Chunked reads reproduce the full history in order.
    let mut collected = Vec::new();
    let mut cursor = 0u64;
    while cursor < total {
        let (_, chunk) = get(
            &app,
            &format!("/api/pipelines/status/{}?since={}", pipeline_id, cursor),
        )
        .await;
        let entries = chunk["logs_since"].as_array().unwrap();
        let first = entries.first().unwrap();
        cursor = first["sequence"].as_u64().unwrap();
        collected.push(first["text"].clone());
    }
    let expected: Vec<Value> = full["logs_since"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["text"].clone())
        .collect();
    assert_eq!(collected, expected);

    // The writer artifacts actually landed in the project.
    assert!(project.path().join("world_bible/world_config.json").exists());
    assert!(project.path().join("story_outline.json").exists());
}

#[tokio::test]
async fn given_missing_pitch_when_running_writer_then_errors_on_first_stage() {
    let app = test_router(0);
    let project = tempfile::tempdir().unwrap();
    let pipeline_id = start_pipeline(&app, "writer", &project).await;

    let body = wait_terminal(&app, &pipeline_id).await;
    assert_eq!(body["status"], json!("error"));
    assert!(body["error"].as_str().unwrap().contains("No pitch found"));

    let stages = body["stages"].as_array().unwrap();
    assert_eq!(stages[0]["status"], json!("error"));
    for stage in &stages[1..] {
        assert_eq!(stage["status"], json!("initializing"));
    }
}

#[tokio::test]
async fn given_storyboard_run_when_cancelled_mid_frames_then_terminal_cancelled() {
    let app = test_router(25);
    let project = storyboard_project(40);
    let pipeline_id = start_pipeline(&app, "storyboard", &project).await;

    // Wait until the frame loop is visibly under way.
    timeout(WAIT, async {
        loop {
            let (_, body) = get(&app, &format!("/api/pipelines/status/{}", pipeline_id)).await;
            if body["completed_items"].as_u64().unwrap_or(0) >= 2 {
                return;
            }
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("frame loop never started");

    let (status, body) = send_json(
        &app,
        "POST",
        &format!("/api/pipelines/cancel/{}", pipeline_id),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));

    let final_body = wait_terminal(&app, &pipeline_id).await;
    assert_eq!(final_body["status"], json!("cancelled"));
    assert!(final_body["ended_at"].is_string());
    assert!(final_body["completed_items"].as_u64().unwrap() < 40);

    // Cancel after terminal stays a success, not an error.
    let (status, body) = send_json(
        &app,
        "POST",
        &format!("/api/pipelines/cancel/{}", pipeline_id),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
}

#[tokio::test]
async fn given_request_id_header_when_calling_then_echoed_back() {
    let app = test_router(0);
    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .header("x-request-id", "resync-check-1")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "resync-check-1"
    );
}
