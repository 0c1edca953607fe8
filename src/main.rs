use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use backlot::application::ports::{ImageClient, LlmClient};
use backlot::application::services::PipelineRegistry;
use backlot::infrastructure::images::{HttpImageClient, MockImageClient};
use backlot::infrastructure::llm::{MockLlmClient, OpenAiClient};
use backlot::infrastructure::observability::{TracingConfig, init_tracing};
use backlot::infrastructure::storage::LocalProjectStore;
use backlot::presentation::{AppState, ScaffoldConfig, Settings, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env();
    let scaffold = ScaffoldConfig::default();

    init_tracing(
        TracingConfig {
            environment: settings.environment.as_str().to_string(),
            json_format: settings.logging.json_format,
        },
        settings.server.port,
    );

    if scaffold.enabled || settings.llm.api_key.is_empty() {
        tracing::info!("Scaffold mode: running with mock generation clients");
        let llm = Arc::new(MockLlmClient::new(scaffold.mock_response_delay_ms));
        let images = Arc::new(MockImageClient::new(scaffold.mock_response_delay_ms));
        serve(settings, llm, images).await
    } else {
        let llm = Arc::new(OpenAiClient::new(
            settings.llm.base_url.clone(),
            settings.llm.api_key.clone(),
            settings.llm.model.clone(),
        ));
        let images = Arc::new(HttpImageClient::new(
            settings.images.base_url.clone(),
            settings.images.api_key.clone(),
        ));
        serve(settings, llm, images).await
    }
}

async fn serve<L, I>(settings: Settings, llm: Arc<L>, images: Arc<I>) -> anyhow::Result<()>
where
    L: LlmClient + 'static,
    I: ImageClient + 'static,
{
    let registry = Arc::new(PipelineRegistry::new(Duration::from_secs(
        settings.engine.retention_secs,
    )));
    registry.spawn_sweeper(Duration::from_secs(settings.engine.sweep_interval_secs));

    let addr = SocketAddr::new(settings.server.host.parse()?, settings.server.port);

    let state = AppState {
        registry,
        store: Arc::new(LocalProjectStore::new()),
        llm,
        images,
        settings,
    };
    let router = create_router(state);

    tracing::info!("Listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
