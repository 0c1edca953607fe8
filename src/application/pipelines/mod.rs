//! The named pipeline catalog. Each pipeline is an ordered stage list built
//! against a shared `PipelineContext`; the engine itself only ever sees the
//! `Stage` trait objects.

mod context;
mod director;
mod ingestion;
mod outline_generator;
mod references;
mod storyboard;
mod world_builder;
mod writer;

use std::sync::Arc;

pub use context::{PipelineContext, PipelineParams};

use crate::application::ports::Stage;
use crate::domain::PipelineKind;

pub fn build(kind: PipelineKind, ctx: Arc<PipelineContext>) -> Vec<Box<dyn Stage>> {
    match kind {
        PipelineKind::Ingestion => ingestion::stages(ctx),
        PipelineKind::Writer => writer::stages(ctx),
        PipelineKind::WorldBuilder => world_builder::stages(ctx),
        PipelineKind::OutlineGenerator => outline_generator::stages(ctx),
        PipelineKind::Director => director::stages(ctx),
        PipelineKind::References => references::stages(ctx),
        PipelineKind::Storyboard => storyboard::stages(ctx),
    }
}
