use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::ports::{ImageClient, LlmClient};
use crate::domain::RunId;
use crate::presentation::state::AppState;

use super::pipeline_types::StatusResponse;

#[derive(Deserialize)]
pub struct StatusQuery {
    #[serde(default)]
    pub since: Option<u64>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Poll one run. `since` is the caller's log cursor; omitting it (or passing
/// 0) returns the full log history, which is how a reloaded client resyncs.
#[tracing::instrument(skip(state, query))]
pub async fn pipeline_status_handler<L, I>(
    State(state): State<AppState<L, I>>,
    Path(pipeline_id): Path<String>,
    Query(query): Query<StatusQuery>,
) -> impl IntoResponse
where
    L: LlmClient + 'static,
    I: ImageClient + 'static,
{
    let uuid = match Uuid::parse_str(&pipeline_id) {
        Ok(u) => u,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("Invalid pipeline ID: {}", pipeline_id),
                }),
            )
                .into_response();
        }
    };

    let since = query.since.unwrap_or(0);
    match state.registry.snapshot(RunId::from_uuid(uuid), since) {
        Some(snapshot) => {
            (StatusCode::OK, Json(StatusResponse::from_snapshot(&snapshot))).into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Pipeline not found: {}", pipeline_id),
            }),
        )
            .into_response(),
    }
}
