mod cancel_pipeline;
mod health;
mod models;
mod pipeline_status;
pub mod pipeline_types;
mod start_pipeline;

pub use cancel_pipeline::cancel_pipeline_handler;
pub use health::health_handler;
pub use models::models_handler;
pub use pipeline_status::pipeline_status_handler;
pub use start_pipeline::start_pipeline_handler;
