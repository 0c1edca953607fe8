use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;

use crate::application::pipelines::{self, PipelineContext, PipelineParams};
use crate::application::ports::{ImageClient, LlmClient};
use crate::domain::PipelineKind;
use crate::presentation::state::AppState;

use super::pipeline_types::{PipelineRequest, PipelineResponse};

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Start a named pipeline. Registration and runner spawn are immediate; the
/// returned id is the only thing a client needs to observe the run.
#[tracing::instrument(skip(state, request))]
pub async fn start_pipeline_handler<L, I>(
    State(state): State<AppState<L, I>>,
    Path(kind): Path<String>,
    Json(request): Json<PipelineRequest>,
) -> impl IntoResponse
where
    L: LlmClient + 'static,
    I: ImageClient + 'static,
{
    let kind = match PipelineKind::from_str(&kind) {
        Ok(kind) => kind,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected start request");
            return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: e })).into_response();
        }
    };

    if request.project_path.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "project_path is required".to_string(),
            }),
        )
            .into_response();
    }

    let params = PipelineParams {
        llm_model: request
            .llm
            .unwrap_or_else(|| state.settings.llm.model.clone()),
        image_model: request
            .image_model
            .unwrap_or_else(|| state.settings.images.model.clone()),
        max_frames: request.max_frames,
        media_type: request.media_type,
        visual_style: request.visual_style,
        style_notes: request.style_notes,
        scene_filter: request.scene_filter,
        entity_filter: request.entity_filter,
    };

    let llm: Arc<dyn LlmClient> = Arc::clone(&state.llm) as Arc<dyn LlmClient>;
    let images: Arc<dyn ImageClient> = Arc::clone(&state.images) as Arc<dyn ImageClient>;
    let ctx = Arc::new(PipelineContext {
        project_dir: PathBuf::from(&request.project_path),
        params,
        store: Arc::clone(&state.store),
        llm,
        images,
    });

    let name = format!("{}_{}", kind, request.project_path);
    let stages = pipelines::build(kind, ctx);
    let pipeline_id = state.registry.start(kind, name, stages);

    tracing::info!(pipeline_id = %pipeline_id, kind = %kind, "Pipeline started");

    (
        StatusCode::ACCEPTED,
        Json(PipelineResponse {
            success: true,
            message: format!("{} pipeline started", kind),
            pipeline_id: Some(pipeline_id.to_string()),
        }),
    )
        .into_response()
}
