use std::fmt;
use std::str::FromStr;

/// The named pipelines the engine knows how to launch. Informational to the
/// engine itself; the stage catalog decides what each one actually runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineKind {
    Ingestion,
    Writer,
    WorldBuilder,
    OutlineGenerator,
    Director,
    References,
    Storyboard,
}

impl PipelineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineKind::Ingestion => "ingestion",
            PipelineKind::Writer => "writer",
            PipelineKind::WorldBuilder => "world_builder",
            PipelineKind::OutlineGenerator => "outline_generator",
            PipelineKind::Director => "director",
            PipelineKind::References => "references",
            PipelineKind::Storyboard => "storyboard",
        }
    }
}

impl FromStr for PipelineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ingestion" => Ok(PipelineKind::Ingestion),
            "writer" => Ok(PipelineKind::Writer),
            "world_builder" | "world-builder" => Ok(PipelineKind::WorldBuilder),
            "outline_generator" | "outline-generator" => Ok(PipelineKind::OutlineGenerator),
            "director" => Ok(PipelineKind::Director),
            "references" => Ok(PipelineKind::References),
            "storyboard" => Ok(PipelineKind::Storyboard),
            _ => Err(format!("Unknown pipeline kind: {}", s)),
        }
    }
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
