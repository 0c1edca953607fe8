use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;
use uuid::Uuid;

use crate::application::ports::{ImageClient, LlmClient};
use crate::application::services::CancelOutcome;
use crate::domain::RunId;
use crate::presentation::state::AppState;

use super::pipeline_types::CancelResponse;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Request cooperative cancellation. Idempotent: cancelling a run that
/// already finished succeeds without doing anything.
#[tracing::instrument(skip(state))]
pub async fn cancel_pipeline_handler<L, I>(
    State(state): State<AppState<L, I>>,
    Path(pipeline_id): Path<String>,
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

    match state.registry.cancel(RunId::from_uuid(uuid)) {
        CancelOutcome::Requested => {
            tracing::info!(pipeline_id = %pipeline_id, "Cancellation requested");
            (
                StatusCode::OK,
                Json(CancelResponse {
                    success: true,
                    message: "Cancellation requested".to_string(),
                }),
            )
                .into_response()
        }
        CancelOutcome::AlreadyTerminal => (
            StatusCode::OK,
            Json(CancelResponse {
                success: true,
                message: "Pipeline already finished".to_string(),
            }),
        )
            .into_response(),
        CancelOutcome::NotFound => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Pipeline not found: {}", pipeline_id),
            }),
        )
            .into_response(),
    }
}
