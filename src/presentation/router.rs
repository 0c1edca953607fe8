use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::application::ports::{ImageClient, LlmClient};
use crate::infrastructure::observability::request_id_middleware;
use crate::presentation::handlers::{
    cancel_pipeline_handler, health_handler, models_handler, pipeline_status_handler,
    start_pipeline_handler,
};
use crate::presentation::state::AppState;

pub fn create_router<L, I>(state: AppState<L, I>) -> Router
where
    L: LlmClient + 'static,
    I: ImageClient + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/models", get(models_handler))
        .route("/api/pipelines/{kind}", post(start_pipeline_handler::<L, I>))
        .route(
            "/api/pipelines/status/{pipeline_id}",
            get(pipeline_status_handler::<L, I>),
        )
        .route(
            "/api/pipelines/cancel/{pipeline_id}",
            post(cancel_pipeline_handler::<L, I>),
        )
        .layer(middleware::from_fn(request_id_middleware))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}
