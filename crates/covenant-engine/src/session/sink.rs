//! Upload targets for recorded interactions and collected fixtures.

use crate::model::Fixture;
use crate::session::RecordedInteraction;
use anyhow::Context;
use async_trait::async_trait;
use std::time::Duration;

/// Global HTTP client for sink uploads
static HTTP_CLIENT: std::sync::OnceLock<reqwest::Client> = std::sync::OnceLock::new();

fn get_http_client() -> &'static reqwest::Client {
    HTTP_CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client")
    })
}

/// Destination for flushed batches. Each publish call receives one batch
/// and is atomic from the session's point of view: an `Err` drops the
/// whole batch (logged upstream, never retried).
#[async_trait]
pub trait RecordingSink: Send + Sync {
    async fn publish_interactions(&self, batch: &[RecordedInteraction]) -> anyhow::Result<()>;
    async fn publish_fixtures(&self, batch: &[Fixture]) -> anyhow::Result<()>;
}

/// JSON-over-HTTP sink posting to the platform's collection endpoints.
pub struct HttpSink {
    endpoint: String,
}

impl HttpSink {
    /// `endpoint` is the collection base URL; batches land on
    /// `{endpoint}/interactions` and `{endpoint}/fixtures`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl RecordingSink for HttpSink {
    async fn publish_interactions(&self, batch: &[RecordedInteraction]) -> anyhow::Result<()> {
        let url = format!("{}/interactions", self.endpoint.trim_end_matches('/'));
        get_http_client()
            .post(&url)
            .json(batch)
            .send()
            .await
            .with_context(|| format!("posting interaction batch to {url}"))?
            .error_for_status()
            .with_context(|| format!("interaction batch rejected by {url}"))?;
        Ok(())
    }

    async fn publish_fixtures(&self, batch: &[Fixture]) -> anyhow::Result<()> {
        let url = format!("{}/fixtures", self.endpoint.trim_end_matches('/'));
        get_http_client()
            .post(&url)
            .json(batch)
            .send()
            .await
            .with_context(|| format!("posting fixture batch to {url}"))?
            .error_for_status()
            .with_context(|| format!("fixture batch rejected by {url}"))?;
        Ok(())
    }
}

/// In-memory sink for tests and local inspection.
#[derive(Default)]
pub struct MemorySink {
    pub interactions: parking_lot::Mutex<Vec<RecordedInteraction>>,
    pub fixtures: parking_lot::Mutex<Vec<Fixture>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interaction_count(&self) -> usize {
        self.interactions.lock().len()
    }

    pub fn fixture_count(&self) -> usize {
        self.fixtures.lock().len()
    }
}

#[async_trait]
impl RecordingSink for MemorySink {
    async fn publish_interactions(&self, batch: &[RecordedInteraction]) -> anyhow::Result<()> {
        self.interactions.lock().extend_from_slice(batch);
        Ok(())
    }

    async fn publish_fixtures(&self, batch: &[Fixture]) -> anyhow::Result<()> {
        self.fixtures.lock().extend_from_slice(batch);
        Ok(())
    }
}

/// Sink that rejects every batch; exercises the swallowed-failure path.
#[derive(Default)]
pub struct FailingSink;

#[async_trait]
impl RecordingSink for FailingSink {
    async fn publish_interactions(&self, _batch: &[RecordedInteraction]) -> anyhow::Result<()> {
        anyhow::bail!("sink unavailable")
    }

    async fn publish_fixtures(&self, _batch: &[Fixture]) -> anyhow::Result<()> {
        anyhow::bail!("sink unavailable")
    }
}
