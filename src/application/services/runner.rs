use std::sync::Arc;

use crate::application::ports::Stage;

use super::reporter::ProgressReporter;
use super::run_handle::RunHandle;

/// Drive one run's stage sequence to a terminal status. Runs on the run's
/// own tokio task; this function is the only writer the record ever has.
///
/// Cancellation is observed between stages and, through the reporter, at
/// iteration boundaries inside a stage. A stage that finished while the flag
/// was already set is not counted: its result is discarded and no further
/// stage work starts.
pub(crate) async fn execute(handle: Arc<RunHandle>, stages: Vec<Box<dyn Stage>>) {
    let reporter = ProgressReporter::new(Arc::clone(&handle));
    let total = stages.len();

    handle.update(|run| {
        run.mark_initializing();
        run.append_log(format!("Starting {} pipeline...", run.name));
    });

    if handle.is_cancelled() {
        cancel(&handle, "Cancelled before any stage started");
        return;
    }

    handle.update(|run| run.mark_running());

    for (index, stage) in stages.iter().enumerate() {
        if handle.is_cancelled() {
            cancel(&handle, format!("Cancelled before stage '{}'", stage.name()));
            return;
        }

        handle.update(|run| {
            run.begin_stage(index);
            run.append_log(format!("Starting {}", stage.name()));
        });

        match stage.run(&reporter).await {
            Ok(()) => {
                if handle.is_cancelled() {
                    cancel(&handle, format!("Cancelled during {}", stage.name()));
                    return;
                }
                handle.update(|run| {
                    run.complete_stage(index);
                    run.append_log(format!("{} complete", stage.name()));
                    // Progress hits 1.0 only on the terminal transition.
                    if index + 1 < total {
                        run.set_progress((index + 1) as f64 / total as f64);
                    }
                });
            }
            Err(e) => {
                let message = e.to_string();
                tracing::error!(stage = stage.name(), error = %message, "Stage failed");
                handle.update(|run| {
                    run.fail_stage(index, &message);
                    run.append_log(format!("Error in {}: {}", stage.name(), message));
                    run.mark_error(&message);
                });
                return;
            }
        }
    }

    handle.update(|run| {
        run.append_log("Pipeline complete");
        run.mark_complete();
    });
    tracing::info!("Pipeline run complete");
}

fn cancel(handle: &RunHandle, message: impl Into<String>) {
    let message = message.into();
    tracing::info!(%message, "Pipeline run cancelled");
    handle.update(|run| {
        run.append_log(message);
        run.mark_cancelled();
    });
}
