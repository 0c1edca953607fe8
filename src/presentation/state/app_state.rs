use std::sync::Arc;

use crate::application::ports::{ImageClient, LlmClient, ProjectStore};
use crate::application::services::PipelineRegistry;
use crate::presentation::config::Settings;

pub struct AppState<L, I>
where
    L: LlmClient,
    I: ImageClient,
{
    pub registry: Arc<PipelineRegistry>,
    pub store: Arc<dyn ProjectStore>,
    pub llm: Arc<L>,
    pub images: Arc<I>,
    pub settings: Settings,
}

impl<L, I> Clone for AppState<L, I>
where
    L: LlmClient,
    I: ImageClient,
{
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            store: Arc::clone(&self.store),
            llm: Arc::clone(&self.llm),
            images: Arc::clone(&self.images),
            settings: self.settings.clone(),
        }
    }
}
