use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;

#[derive(Serialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelInfo>,
}

#[derive(Serialize)]
pub struct ModelInfo {
    pub key: &'static str,
    pub display_name: &'static str,
    pub provider: &'static str,
    pub description: &'static str,
    pub default: bool,
}

/// Image models the storyboard pipeline can be pointed at.
pub async fn models_handler() -> impl IntoResponse {
    let models = vec![
        ModelInfo {
            key: "flux_2_pro",
            display_name: "Flux 2 Pro",
            provider: "Replicate",
            description: "High quality, up to 8 reference images. Best for character consistency.",
            default: true,
        },
        ModelInfo {
            key: "seedream",
            display_name: "Seedream 4.5",
            provider: "Replicate",
            description: "Fast, up to 14 reference images. Great character likeness preservation.",
            default: false,
        },
        ModelInfo {
            key: "nano_banana_pro",
            display_name: "Nano Banana Pro",
            provider: "Replicate",
            description: "Fast generation with good quality. Supports reference images.",
            default: false,
        },
    ];
    (StatusCode::OK, Json(ModelsResponse { models }))
}
