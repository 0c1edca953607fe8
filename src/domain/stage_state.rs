use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

/// Status of a single stage within a run. `Initializing` is the not-yet-started
/// state; stage statuses only move forward from there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageStatus {
    Initializing,
    Running,
    Complete,
    Error,
}

impl StageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageStatus::Initializing => "initializing",
            StageStatus::Running => "running",
            StageStatus::Complete => "complete",
            StageStatus::Error => "error",
        }
    }
}

impl FromStr for StageStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initializing" => Ok(StageStatus::Initializing),
            "running" => Ok(StageStatus::Running),
            "complete" => Ok(StageStatus::Complete),
            "error" => Ok(StageStatus::Error),
            _ => Err(format!("Invalid stage status: {}", s)),
        }
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct StageState {
    pub name: String,
    pub status: StageStatus,
    pub message: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl StageState {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: StageStatus::Initializing,
            message: None,
            started_at: None,
            completed_at: None,
        }
    }
}
