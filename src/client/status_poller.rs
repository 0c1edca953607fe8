use std::time::Duration;

use reqwest::Client;

use crate::presentation::handlers::pipeline_types::StatusResponse;

use super::run_view::RunView;

/// Fixed-interval poller driving a `RunView` until it settles. Transport
/// errors retry the same cursor and are never treated as run failure.
pub struct StatusPoller {
    client: Client,
    base_url: String,
    interval: Duration,
}

impl StatusPoller {
    pub fn new(base_url: impl Into<String>, interval: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            interval,
        }
    }

    /// One poll at the view's current cursor. Returns false when polling
    /// should continue, true when the view settled.
    pub async fn poll_once(&self, view: &mut RunView) -> bool {
        let url = format!(
            "{}/api/pipelines/status/{}?since={}",
            self.base_url,
            view.stored().pipeline_id,
            view.cursor()
        );

        match self.client.get(&url).send().await {
            Ok(response) if response.status() == reqwest::StatusCode::NOT_FOUND => {
                view.mark_lost();
            }
            Ok(response) if response.status().is_success() => {
                match response.json::<StatusResponse>().await {
                    Ok(snapshot) => view.apply(&snapshot),
                    Err(e) => {
                        tracing::warn!(error = %e, "Malformed status payload; retrying");
                    }
                }
            }
            Ok(response) => {
                tracing::warn!(status = %response.status(), "Status poll failed; retrying");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Status poll transport error; retrying");
            }
        }

        view.is_settled()
    }

    /// Poll until the view settles (terminal status or lost run).
    pub async fn watch(&self, view: &mut RunView) {
        loop {
            if self.poll_once(view).await {
                return;
            }
            tokio::time::sleep(self.interval).await;
        }
    }
}
