use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Notify;
use tokio::time::{sleep, timeout};

use backlot::application::ports::{Stage, StageError};
use backlot::application::services::{CancelOutcome, PipelineRegistry, ProgressReporter};
use backlot::domain::{PipelineKind, RunId, RunStatus, Snapshot, StageStatus};

const WAIT: Duration = Duration::from_secs(5);

fn registry() -> PipelineRegistry {
    PipelineRegistry::new(Duration::from_secs(3600))
}

struct InstantStage {
    name: &'static str,
}

#[async_trait]
impl Stage for InstantStage {
    fn name(&self) -> &str {
        self.name
    }

    async fn run(&self, progress: &ProgressReporter) -> Result<(), StageError> {
        progress.log(format!("{} did its work", self.name));
        Ok(())
    }
}

/// Blocks until the test opens its gate, so cancellation and mid-run
/// assertions are deterministic.
struct GatedStage {
    name: &'static str,
    gate: Arc<Notify>,
    entered: Arc<Notify>,
}

#[async_trait]
impl Stage for GatedStage {
    fn name(&self) -> &str {
        self.name
    }

    async fn run(&self, _progress: &ProgressReporter) -> Result<(), StageError> {
        self.entered.notify_one();
        self.gate.notified().await;
        Ok(())
    }
}

struct FailingStage {
    name: &'static str,
}

#[async_trait]
impl Stage for FailingStage {
    fn name(&self) -> &str {
        self.name
    }

    async fn run(&self, _progress: &ProgressReporter) -> Result<(), StageError> {
        Err(StageError::Failed("model call failed".to_string()))
    }
}

/// Iterates a known collection, checking cancellation at each boundary the
/// way the storyboard frame loop does.
struct ItemLoopStage {
    name: &'static str,
    items: u64,
    delay: Duration,
}

#[async_trait]
impl Stage for ItemLoopStage {
    fn name(&self) -> &str {
        self.name
    }

    async fn run(&self, progress: &ProgressReporter) -> Result<(), StageError> {
        for i in 0..self.items {
            if progress.is_cancelled() {
                progress.log(format!("Cancelled after {} items", i));
                return Ok(());
            }
            sleep(self.delay).await;
            let label = format!("item {}", i + 1);
            progress.set_item(Some(&label), i + 1, self.items);
            progress.log(format!("Finished {}", label));
        }
        Ok(())
    }
}

async fn wait_until<F>(registry: &PipelineRegistry, id: RunId, predicate: F) -> Snapshot
where
    F: Fn(&Snapshot) -> bool,
{
    timeout(WAIT, async {
        loop {
            let snapshot = registry.snapshot(id, 0).expect("run should exist");
            if predicate(&snapshot) {
                return snapshot;
            }
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time")
}

async fn wait_terminal(registry: &PipelineRegistry, id: RunId) -> Snapshot {
    wait_until(registry, id, |s| s.status.is_terminal()).await
}

#[tokio::test]
async fn given_three_stages_when_run_then_completes_with_progress_one() {
    let registry = registry();
    let id = registry.start(
        PipelineKind::Writer,
        "writer_demo",
        vec![
            Box::new(InstantStage { name: "Load Pitch" }),
            Box::new(InstantStage { name: "Generate Script" }),
            Box::new(InstantStage { name: "Save Outputs" }),
        ],
    );

    let snapshot = wait_terminal(&registry, id).await;
    assert_eq!(snapshot.status, RunStatus::Complete);
    assert_eq!(snapshot.progress, 1.0);
    assert!(snapshot.ended_at.is_some());
    assert!(
        snapshot
            .stages
            .iter()
            .all(|s| s.status == StageStatus::Complete)
    );
    assert!(!snapshot.logs_since.is_empty());
}

#[tokio::test]
async fn given_running_pipeline_when_polled_then_progress_never_decreases() {
    let registry = registry();
    let id = registry.start(
        PipelineKind::Storyboard,
        "storyboard_demo",
        vec![
            Box::new(InstantStage { name: "Load Visual Script" }),
            Box::new(ItemLoopStage {
                name: "Generate Images",
                items: 6,
                delay: Duration::from_millis(10),
            }),
            Box::new(InstantStage { name: "Save Outputs" }),
        ],
    );

    let mut last = 0.0f64;
    let final_snapshot = timeout(WAIT, async {
        loop {
            let snapshot = registry.snapshot(id, 0).expect("run should exist");
            assert!(
                snapshot.progress >= last,
                "progress went backwards: {} -> {}",
                last,
                snapshot.progress
            );
            last = snapshot.progress;
            if snapshot.status.is_terminal() {
                return snapshot;
            }
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("run did not finish");

    assert_eq!(final_snapshot.status, RunStatus::Complete);
    assert_eq!(final_snapshot.progress, 1.0);
    assert_eq!(final_snapshot.completed_items, 6);
    assert_eq!(final_snapshot.total_items, 6);
}

#[tokio::test]
async fn given_incremental_polls_when_concatenated_then_match_full_history() {
    let registry = registry();
    let id = registry.start(
        PipelineKind::Writer,
        "writer_demo",
        vec![
            Box::new(InstantStage { name: "Load Pitch" }),
            Box::new(ItemLoopStage {
                name: "Generate Script",
                items: 4,
                delay: Duration::from_millis(10),
            }),
            Box::new(InstantStage { name: "Save Outputs" }),
        ],
    );

    // Poll incrementally while the run is live, advancing the cursor each
    // time, exactly like a browser client.
    let mut cursor = 0u64;
    let mut collected: Vec<(u64, String)> = Vec::new();
    timeout(WAIT, async {
        loop {
            let snapshot = registry.snapshot(id, cursor).expect("run should exist");
            for entry in &snapshot.logs_since {
                collected.push((entry.sequence, entry.text.clone()));
            }
            cursor = snapshot.next_since;
            if snapshot.status.is_terminal() {
                // One more poll to drain anything after the terminal log.
                let last = registry.snapshot(id, cursor).expect("run should exist");
                for entry in &last.logs_since {
                    collected.push((entry.sequence, entry.text.clone()));
                }
                return;
            }
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("run did not finish");

    let full = registry.snapshot(id, 0).expect("run should exist");
    let expected: Vec<(u64, String)> = full
        .logs_since
        .iter()
        .map(|e| (e.sequence, e.text.clone()))
        .collect();
    assert_eq!(collected, expected);

    // Same cursor twice with no new logs: empty both times.
    let drained = registry.snapshot(id, full.next_since).expect("run exists");
    assert!(drained.logs_since.is_empty());
    let drained_again = registry.snapshot(id, full.next_since).expect("run exists");
    assert!(drained_again.logs_since.is_empty());
}

#[tokio::test]
async fn given_cancel_right_after_create_then_no_stage_completes() {
    let registry = registry();
    let gate = Arc::new(Notify::new());
    let entered = Arc::new(Notify::new());
    let id = registry.start(
        PipelineKind::Writer,
        "writer_demo",
        vec![
            Box::new(GatedStage {
                name: "Load Pitch",
                gate: Arc::clone(&gate),
                entered: Arc::clone(&entered),
            }),
            Box::new(InstantStage { name: "Save Outputs" }),
        ],
    );

    assert_eq!(registry.cancel(id), CancelOutcome::Requested);
    gate.notify_one();

    let snapshot = wait_terminal(&registry, id).await;
    assert_eq!(snapshot.status, RunStatus::Cancelled);
    assert!(snapshot.ended_at.is_some());
    assert!(
        snapshot
            .stages
            .iter()
            .all(|s| s.status != StageStatus::Complete)
    );
}

#[tokio::test]
async fn given_cancel_mid_stage_then_later_stages_stay_unexecuted() {
    let registry = registry();
    let gate = Arc::new(Notify::new());
    let entered = Arc::new(Notify::new());
    let id = registry.start(
        PipelineKind::Writer,
        "writer_demo",
        vec![
            Box::new(InstantStage { name: "Load Pitch" }),
            Box::new(GatedStage {
                name: "Generate Script",
                gate: Arc::clone(&gate),
                entered: Arc::clone(&entered),
            }),
            Box::new(InstantStage { name: "Save Outputs" }),
        ],
    );

    // First stage done, second stage in flight.
    timeout(WAIT, entered.notified()).await.expect("stage 2 entered");
    let mid = wait_until(&registry, id, |s| {
        s.status == RunStatus::Running && s.stages[0].status == StageStatus::Complete
    })
    .await;
    assert_eq!(mid.current_stage.as_deref(), Some("Generate Script"));

    assert_eq!(registry.cancel(id), CancelOutcome::Requested);
    // Idempotent while still running.
    assert_eq!(registry.cancel(id), CancelOutcome::Requested);
    gate.notify_one();

    let snapshot = wait_terminal(&registry, id).await;
    assert_eq!(snapshot.status, RunStatus::Cancelled);
    assert!(snapshot.ended_at.is_some());
    assert_ne!(snapshot.stages[1].status, StageStatus::Complete);
    assert_eq!(snapshot.stages[2].status, StageStatus::Initializing);
}

#[tokio::test]
async fn given_item_loop_when_cancelled_then_stops_at_iteration_boundary() {
    let registry = registry();
    let id = registry.start(
        PipelineKind::Storyboard,
        "storyboard_demo",
        vec![Box::new(ItemLoopStage {
            name: "Generate Images",
            items: 50,
            delay: Duration::from_millis(10),
        })],
    );

    wait_until(&registry, id, |s| s.completed_items >= 2).await;
    registry.cancel(id);

    let snapshot = wait_terminal(&registry, id).await;
    assert_eq!(snapshot.status, RunStatus::Cancelled);
    assert!(snapshot.completed_items < 50);
}

#[tokio::test]
async fn given_failing_stage_then_error_recorded_and_rest_unexecuted() {
    let registry = registry();
    let id = registry.start(
        PipelineKind::Director,
        "director_demo",
        vec![
            Box::new(InstantStage { name: "Load Outline" }),
            Box::new(FailingStage { name: "Analyze Scenes" }),
            Box::new(InstantStage { name: "Save Outputs" }),
        ],
    );

    let snapshot = wait_terminal(&registry, id).await;
    assert_eq!(snapshot.status, RunStatus::Error);
    assert_eq!(snapshot.error.as_deref(), Some("model call failed"));
    assert_eq!(snapshot.stages[0].status, StageStatus::Complete);
    assert_eq!(snapshot.stages[1].status, StageStatus::Error);
    assert_eq!(snapshot.stages[2].status, StageStatus::Initializing);
    assert!(snapshot.ended_at.is_some());
}

#[tokio::test]
async fn given_cancel_requests_when_run_missing_or_done_then_distinct_outcomes() {
    let registry = registry();
    assert_eq!(
        registry.cancel(RunId::new()),
        CancelOutcome::NotFound
    );

    let id = registry.start(
        PipelineKind::Writer,
        "writer_demo",
        vec![Box::new(InstantStage { name: "Load Pitch" })],
    );
    wait_terminal(&registry, id).await;
    assert_eq!(registry.cancel(id), CancelOutcome::AlreadyTerminal);
}

#[tokio::test]
async fn given_retention_window_when_sweeping_then_only_old_terminal_runs_go() {
    let registry = registry();
    let id = registry.start(
        PipelineKind::Writer,
        "writer_demo",
        vec![Box::new(InstantStage { name: "Load Pitch" })],
    );
    wait_terminal(&registry, id).await;

    // Fresh terminal run survives a sweep inside the window.
    assert_eq!(registry.sweep(Utc::now()), 0);
    assert!(registry.snapshot(id, 0).is_some());

    // Outside the window it is gone, and polling yields NotFound.
    assert_eq!(registry.sweep(Utc::now() + chrono::Duration::hours(2)), 1);
    assert!(registry.snapshot(id, 0).is_none());
    assert_eq!(registry.cancel(id), CancelOutcome::NotFound);
}

#[tokio::test]
async fn given_in_flight_run_when_sweeping_then_it_is_kept() {
    let registry = registry();
    let gate = Arc::new(Notify::new());
    let entered = Arc::new(Notify::new());
    let id = registry.start(
        PipelineKind::Writer,
        "writer_demo",
        vec![Box::new(GatedStage {
            name: "Load Pitch",
            gate: Arc::clone(&gate),
            entered: Arc::clone(&entered),
        })],
    );

    timeout(WAIT, entered.notified()).await.expect("stage entered");
    assert_eq!(registry.sweep(Utc::now() + chrono::Duration::hours(2)), 0);
    assert!(registry.snapshot(id, 0).is_some());

    gate.notify_one();
    wait_terminal(&registry, id).await;
}
