use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::time::timeout;

use backlot::application::services::PipelineRegistry;
use backlot::client::{RunView, StatusPoller, StoredRun, ViewPhase};
use backlot::domain::RunStatus;
use backlot::infrastructure::images::MockImageClient;
use backlot::infrastructure::llm::MockLlmClient;
use backlot::infrastructure::storage::LocalProjectStore;
use backlot::presentation::{AppState, Settings, create_router};

const WAIT: Duration = Duration::from_secs(10);

async fn spawn_server() -> SocketAddr {
    let state = AppState {
        registry: Arc::new(PipelineRegistry::new(Duration::from_secs(3600))),
        store: Arc::new(LocalProjectStore::new()),
        llm: Arc::new(MockLlmClient::new(0)),
        images: Arc::new(MockImageClient::new(0)),
        settings: Settings::from_env(),
    };
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn given_live_run_when_watched_then_view_settles_and_resync_rebuilds_it() {
    let addr = spawn_server().await;
    let base_url = format!("http://{}", addr);

    let project = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(project.path().join("world_bible")).unwrap();
    std::fs::write(
        project.path().join("world_bible/pitch.md"),
        "A lighthouse keeper finds a message from her future self.",
    )
    .unwrap();

    let client = reqwest::Client::new();
    let response = client
        .post(format!("{}/api/pipelines/writer", base_url))
        .json(&serde_json::json!({
            "project_path": project.path().to_str().unwrap(),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::ACCEPTED);
    let body: serde_json::Value = response.json().await.unwrap();
    let pipeline_id = body["pipeline_id"].as_str().unwrap().to_string();

    let mut view = RunView::new(StoredRun {
        pipeline_id: pipeline_id.clone(),
        kind: "writer".to_string(),
        display_name: "writer_demo".to_string(),
    });
    let poller = StatusPoller::new(base_url.clone(), Duration::from_millis(20));

    timeout(WAIT, poller.watch(&mut view))
        .await
        .expect("poller never settled");
    assert_eq!(view.phase(), ViewPhase::Finished);
    assert_eq!(view.status(), RunStatus::Complete);
    assert_eq!(view.progress(), 1.0);
    assert!(!view.logs().is_empty());

    // Page reload: only the stored identity survives; a fresh watch with
    // cursor 0 rebuilds the identical log view from one full snapshot.
    let logs_before = view.logs().to_vec();
    view.resync();
    assert_eq!(view.cursor(), 0);
    timeout(WAIT, poller.watch(&mut view))
        .await
        .expect("resync watch never settled");
    assert_eq!(view.logs(), &logs_before[..]);
    assert_eq!(view.status(), RunStatus::Complete);
}

#[tokio::test]
async fn given_unknown_run_when_watched_then_marked_lost() {
    let addr = spawn_server().await;

    let mut view = RunView::new(StoredRun {
        pipeline_id: "00000000-0000-4000-8000-000000000000".to_string(),
        kind: "writer".to_string(),
        display_name: "writer_demo".to_string(),
    });
    let poller = StatusPoller::new(format!("http://{}", addr), Duration::from_millis(20));

    timeout(WAIT, poller.watch(&mut view))
        .await
        .expect("poller never settled");
    assert_eq!(view.phase(), ViewPhase::Lost);
    assert_eq!(view.status(), RunStatus::Error);
    assert!(view.error().is_some());
}
