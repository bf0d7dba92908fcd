//! Recording session: the asynchronous, batched side effects that follow
//! a router decision.
//!
//! Interactions append to an in-memory pending list and are flushed on an
//! explicit `flush`, on a size threshold, or at session teardown. Flush
//! failures are logged and swallowed — they never block or fail the
//! request path that triggered them. Within one session the pending list
//! preserves call order; flush batches are per-batch atomic with no
//! server-side ordering guarantee beyond that.

mod sink;

pub use sink::{FailingSink, HttpSink, MemorySink, RecordingSink};

use crate::config::SessionConfig;
use crate::metrics;
use crate::model::{
    Fixture, FixtureData, FixtureRequest, FixtureResponse, FixtureSource, FixtureStatus,
    UnifiedRequest, UnifiedResponse,
};
use crate::router::{RouterDisposition, RouterOutcome};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// One observed exchange, classified.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedInteraction {
    pub id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub request: UnifiedRequest,
    pub response: UnifiedResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub disposition: RouterDisposition,
}

impl RecordedInteraction {
    /// Capture a router outcome as an interaction record.
    pub fn from_outcome(request: &UnifiedRequest, outcome: &RouterOutcome) -> Self {
        let selected = outcome.match_result.selected.as_ref();
        Self {
            id: Uuid::new_v4(),
            recorded_at: Utc::now(),
            request: request.clone(),
            response: outcome.response.clone(),
            operation_id: selected.map(|c| c.operation.id.clone()),
            confidence: selected.map(|c| c.confidence),
            disposition: outcome.disposition,
        }
    }
}

/// Buffered recording of interactions and collected fixtures for one
/// mock/verification session.
pub struct RecordingSession {
    sink: Arc<dyn RecordingSink>,
    config: SessionConfig,
    pending_interactions: Mutex<Vec<RecordedInteraction>>,
    pending_fixtures: Mutex<Vec<Fixture>>,
    closed: AtomicBool,
}

impl RecordingSession {
    pub fn new(sink: Arc<dyn RecordingSink>, config: SessionConfig) -> Self {
        Self {
            sink,
            config,
            pending_interactions: Mutex::new(Vec::new()),
            pending_fixtures: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Apply the recording policy to a router outcome: the interaction is
    /// always recorded; a draft fixture is collected only for 2xx-class
    /// successful outcomes.
    pub async fn observe(&self, request: &UnifiedRequest, outcome: &RouterOutcome) {
        let interaction = RecordedInteraction::from_outcome(request, outcome);
        if let Some(fixture) = collect_fixture(&interaction) {
            self.pending_fixtures.lock().push(fixture);
        }
        self.record(interaction).await;
    }

    /// Append one interaction, flushing when the threshold is reached.
    pub async fn record(&self, interaction: RecordedInteraction) {
        if self.closed.load(Ordering::SeqCst) {
            debug!("session already closed; dropping interaction");
            return;
        }
        let should_flush = {
            let mut pending = self.pending_interactions.lock();
            pending.push(interaction);
            pending.len() >= self.config.flush_threshold
        };
        if should_flush {
            self.flush_with_trigger("threshold").await;
        }
    }

    /// Explicit flush of both pending lists.
    pub async fn flush(&self) {
        self.flush_with_trigger("explicit").await;
    }

    /// Close the session, attempting a final best-effort flush before
    /// releasing resources. Safe to call more than once.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.flush_with_trigger("close").await;
    }

    pub fn pending_interactions(&self) -> usize {
        self.pending_interactions.lock().len()
    }

    pub fn pending_fixtures(&self) -> usize {
        self.pending_fixtures.lock().len()
    }

    async fn flush_with_trigger(&self, trigger: &str) {
        // Drain under the lock, publish outside it. A failed publish
        // drops the batch: best-effort delivery, not guaranteed.
        let interactions = std::mem::take(&mut *self.pending_interactions.lock());
        let fixtures = std::mem::take(&mut *self.pending_fixtures.lock());
        if interactions.is_empty() && fixtures.is_empty() {
            return;
        }

        let mut ok = true;
        if !interactions.is_empty() {
            if let Err(error) = self.sink.publish_interactions(&interactions).await {
                ok = false;
                warn!(
                    %error,
                    dropped = interactions.len(),
                    trigger,
                    "interaction batch upload failed; batch dropped"
                );
            }
        }
        if !fixtures.is_empty() {
            if let Err(error) = self.sink.publish_fixtures(&fixtures).await {
                ok = false;
                warn!(
                    %error,
                    dropped = fixtures.len(),
                    trigger,
                    "fixture batch upload failed; batch dropped"
                );
            }
        }
        metrics::record_flush(trigger, ok);
    }
}

/// Derive a draft consumer fixture from a successful matched exchange.
fn collect_fixture(interaction: &RecordedInteraction) -> Option<Fixture> {
    if interaction.disposition == RouterDisposition::Unmatched {
        return None;
    }
    if !interaction.response.is_2xx() {
        return None;
    }
    let operation_id = interaction.operation_id.as_ref()?;

    Some(Fixture {
        id: Uuid::new_v4().to_string(),
        operation: operation_id.clone(),
        source: FixtureSource::Consumer,
        priority: 0,
        status: FixtureStatus::Draft,
        data: FixtureData {
            request: Some(FixtureRequest::from(&interaction.request)),
            response: Some(FixtureResponse {
                status: Some(interaction.response.status),
                headers: interaction.response.headers.clone(),
                body: Some(interaction.response.body.clone()),
            }),
            state: None,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ApiOperation, OperationMatchCandidate, OperationMatchResult};

    fn outcome(
        operation_id: Option<&str>,
        status: u16,
        disposition: RouterDisposition,
    ) -> RouterOutcome {
        let match_result = match operation_id {
            Some(id) => OperationMatchResult::from_candidates(vec![OperationMatchCandidate {
                operation: ApiOperation::new(id),
                confidence: 1.0,
                reasons: vec![],
            }]),
            None => OperationMatchResult::unmatched(),
        };
        RouterOutcome {
            match_result,
            fixture_selection: None,
            response: UnifiedResponse::with_status(status, serde_json::json!({"ok": true})),
            disposition,
        }
    }

    fn session_with(threshold: usize) -> (Arc<MemorySink>, RecordingSession) {
        let sink = Arc::new(MemorySink::new());
        let config = SessionConfig {
            flush_threshold: threshold,
            endpoint: None,
        };
        let session = RecordingSession::new(sink.clone(), config);
        (sink, session)
    }

    #[tokio::test]
    async fn test_threshold_triggers_flush() {
        let (sink, session) = session_with(2);
        let request = UnifiedRequest::rest("GET", "/castles");

        session
            .observe(&request, &outcome(Some("listCastles"), 200, RouterDisposition::MatchedGenerated))
            .await;
        assert_eq!(sink.interaction_count(), 0);
        assert_eq!(session.pending_interactions(), 1);

        session
            .observe(&request, &outcome(Some("listCastles"), 200, RouterDisposition::MatchedGenerated))
            .await;
        assert_eq!(sink.interaction_count(), 2);
        assert_eq!(session.pending_interactions(), 0);
    }

    #[tokio::test]
    async fn test_explicit_flush_drains_pending() {
        let (sink, session) = session_with(100);
        let request = UnifiedRequest::rest("GET", "/castles");

        session
            .observe(&request, &outcome(Some("listCastles"), 200, RouterDisposition::MatchedWithFixture))
            .await;
        session.flush().await;

        assert_eq!(sink.interaction_count(), 1);
        assert_eq!(sink.fixture_count(), 1);
        assert_eq!(session.pending_interactions(), 0);
        assert_eq!(session.pending_fixtures(), 0);
    }

    #[tokio::test]
    async fn test_close_flushes_and_seals_session() {
        let (sink, session) = session_with(100);
        let request = UnifiedRequest::rest("GET", "/castles");

        session
            .observe(&request, &outcome(Some("listCastles"), 200, RouterDisposition::MatchedGenerated))
            .await;
        session.close().await;
        assert_eq!(sink.interaction_count(), 1);

        // Recording after close is dropped
        session
            .record(RecordedInteraction::from_outcome(
                &request,
                &outcome(Some("listCastles"), 200, RouterDisposition::MatchedGenerated),
            ))
            .await;
        session.flush().await;
        assert_eq!(sink.interaction_count(), 1);
    }

    #[tokio::test]
    async fn test_flush_failure_is_swallowed_and_drops_batch() {
        let sink = Arc::new(FailingSink);
        let session = RecordingSession::new(
            sink,
            SessionConfig {
                flush_threshold: 1,
                endpoint: None,
            },
        );
        let request = UnifiedRequest::rest("GET", "/castles");

        // Threshold flush fires and fails; the call itself must not.
        session
            .observe(&request, &outcome(Some("listCastles"), 200, RouterDisposition::MatchedGenerated))
            .await;

        // Batch was dropped, not retried
        assert_eq!(session.pending_interactions(), 0);
    }

    #[tokio::test]
    async fn test_fixture_collection_requires_2xx() {
        let (sink, session) = session_with(100);
        let request = UnifiedRequest::rest("GET", "/castles");

        session
            .observe(&request, &outcome(Some("listCastles"), 404, RouterDisposition::MatchedGenerated))
            .await;
        session
            .observe(&request, &outcome(None, 404, RouterDisposition::Unmatched))
            .await;
        session
            .observe(&request, &outcome(Some("listCastles"), 201, RouterDisposition::MatchedWithFixture))
            .await;
        session.flush().await;

        // All three interactions recorded, only the 201 collected
        assert_eq!(sink.interaction_count(), 3);
        assert_eq!(sink.fixture_count(), 1);
        let fixtures = sink.fixtures.lock();
        assert_eq!(fixtures[0].operation, "listCastles");
        assert_eq!(fixtures[0].source, FixtureSource::Consumer);
        assert_eq!(fixtures[0].status, FixtureStatus::Draft);
    }

    #[tokio::test]
    async fn test_batches_preserve_call_order() {
        let (sink, session) = session_with(100);

        for path in ["/a", "/b", "/c"] {
            let request = UnifiedRequest::rest("GET", path);
            session
                .observe(&request, &outcome(Some("op"), 200, RouterDisposition::MatchedGenerated))
                .await;
        }
        session.flush().await;

        let recorded = sink.interactions.lock();
        let paths: Vec<&str> = recorded
            .iter()
            .filter_map(|i| i.request.path.as_deref())
            .collect();
        assert_eq!(paths, vec!["/a", "/b", "/c"]);
    }

    #[tokio::test]
    async fn test_empty_flush_is_a_no_op() {
        let (sink, session) = session_with(100);
        session.flush().await;
        assert_eq!(sink.interaction_count(), 0);
    }
}
