// Copyright 2025 Tracelight Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Tracking client integration tests against fake transports.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracelight::{
    Attachment, AttachmentRole, ClientConfig, EventRecord, Properties, Sentiment, SessionOutcome,
    SignalRecord, TracelightError, TrackingClient, Transport, TransportError, WireRecord,
};

/// Always succeeds; remembers every delivered batch.
#[derive(Default)]
struct RecordingTransport {
    batches: Mutex<Vec<Vec<WireRecord>>>,
}

impl RecordingTransport {
    fn delivered_keys(&self) -> Vec<String> {
        self.batches
            .lock()
            .iter()
            .flatten()
            .map(WireRecord::idempotency_key)
            .collect()
    }

    fn batch_count(&self) -> usize {
        self.batches.lock().len()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, batch: &[WireRecord]) -> Result<(), TransportError> {
        self.batches.lock().push(batch.to_vec());
        Ok(())
    }
}

/// Fails a fixed number of attempts, then succeeds.
struct FlakyTransport {
    failures: u32,
    attempts: AtomicU32,
}

impl FlakyTransport {
    fn new(failures: u32) -> Self {
        Self {
            failures,
            attempts: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl Transport for FlakyTransport {
    async fn send(&self, _batch: &[WireRecord]) -> Result<(), TransportError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.failures {
            Err(TransportError::Request("connection refused".into()))
        } else {
            Ok(())
        }
    }
}

/// Accepts the request but never responds.
struct HangingTransport {
    attempts: AtomicU32,
}

#[async_trait]
impl Transport for HangingTransport {
    async fn send(&self, _batch: &[WireRecord]) -> Result<(), TransportError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(())
    }
}

/// Never succeeds.
struct DeadTransport;

#[async_trait]
impl Transport for DeadTransport {
    async fn send(&self, _batch: &[WireRecord]) -> Result<(), TransportError> {
        Err(TransportError::Rejected {
            status: 503,
            message: "collector unavailable".into(),
        })
    }
}

fn config() -> ClientConfig {
    ClientConfig::new("wk_test").with_retry_backoff(Duration::from_millis(1))
}

fn client_with(transport: Arc<dyn Transport>) -> TrackingClient {
    TrackingClient::with_transport(config(), transport).unwrap()
}

#[test]
fn empty_write_key_is_a_configuration_error() {
    let err = TrackingClient::with_transport(
        ClientConfig::new(""),
        Arc::new(RecordingTransport::default()),
    )
    .unwrap_err();
    assert!(matches!(err, TracelightError::Configuration(_)));
}

#[tokio::test]
async fn flush_delivers_everything_then_drains() {
    let transport = Arc::new(RecordingTransport::default());
    let client = client_with(transport.clone());

    for i in 0..4 {
        client
            .track_event(
                EventRecord::new("user_001", "chatbot_turn")
                    .with_input(format!("turn {}", i))
                    .with_output("ok"),
            )
            .unwrap();
    }
    assert_eq!(client.pending_records(), 4);

    let report = client.flush().await.unwrap();
    assert_eq!(report.delivered, 4);
    assert!(report.is_clean());
    assert_eq!(client.pending_records(), 0);

    // Flushing again is a no-op.
    let again = client.flush().await.unwrap();
    assert_eq!(again.delivered, 0);
    assert!(again.is_clean());
    assert_eq!(transport.delivered_keys().len(), 4);
}

#[tokio::test]
async fn records_are_delivered_in_enqueue_order() {
    let transport = Arc::new(RecordingTransport::default());
    let client = client_with(transport.clone());

    let first = client
        .track_event(EventRecord::new("u", "a").with_event_id("evt_a"))
        .unwrap();
    client
        .track_signal(SignalRecord::reaction(&first, "thumbs_up", Sentiment::Positive))
        .unwrap();
    client
        .track_event(EventRecord::new("u", "b").with_event_id("evt_b"))
        .unwrap();

    client.flush().await.unwrap();
    assert_eq!(
        transport.delivered_keys(),
        vec!["evt_a", "evt_a/thumbs_up", "evt_b"]
    );
}

#[tokio::test]
async fn batches_respect_batch_size() {
    let transport = Arc::new(RecordingTransport::default());
    let client = TrackingClient::with_transport(
        config().with_batch_size(2),
        transport.clone(),
    )
    .unwrap();

    for _ in 0..5 {
        client
            .track_event(EventRecord::new("u", "chatbot_turn"))
            .unwrap();
    }
    let report = client.flush().await.unwrap();
    assert_eq!(report.delivered, 5);
    assert_eq!(transport.batch_count(), 3);
}

#[tokio::test]
async fn flaky_transport_retries_then_delivers() {
    let transport = Arc::new(FlakyTransport::new(2));
    let client = client_with(transport.clone());

    client
        .track_event(EventRecord::new("u", "user_message"))
        .unwrap();

    let report = client.flush().await.unwrap();
    assert_eq!(report.delivered, 1);
    assert!(report.is_clean());
    // Two failures plus the success consume the configured three attempts.
    assert_eq!(transport.attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn hung_deliveries_are_cut_off_per_attempt() {
    let transport = Arc::new(HangingTransport {
        attempts: AtomicU32::new(0),
    });
    let client = TrackingClient::with_transport(
        config().with_timeout(Duration::from_millis(20)),
        transport.clone(),
    )
    .unwrap();

    let event_id = client
        .track_event(EventRecord::new("u", "user_message"))
        .unwrap();

    // Each attempt hits the per-attempt timeout instead of blocking flush
    // forever; after the configured maximum the record is dropped and
    // reported.
    let report = client.flush().await.unwrap();
    assert_eq!(report.delivered, 0);
    assert_eq!(report.failed, vec![event_id]);
    assert_eq!(transport.attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn dead_transport_reports_failures_without_erroring() {
    let client = client_with(Arc::new(DeadTransport));

    let event_id = client
        .track_event(EventRecord::new("u", "tool_call_failed"))
        .unwrap();
    client
        .track_signal(SignalRecord::reaction(&event_id, "thumbs_down", Sentiment::Negative))
        .unwrap();

    let report = client.flush().await.unwrap();
    assert_eq!(report.delivered, 0);
    assert_eq!(report.failed.len(), 2);
    assert!(report.failed.contains(&event_id));

    // The tracking path is unaffected by the delivery failure.
    client
        .track_event(EventRecord::new("u", "user_message"))
        .unwrap();
    assert_eq!(client.pending_records(), 1);
}

#[tokio::test]
async fn signals_are_not_joined_against_local_events() {
    let transport = Arc::new(RecordingTransport::default());
    let client = client_with(transport.clone());

    // The referenced event was never tracked by this client; the signal is
    // still accepted and forwarded, rejection is the collector's call.
    client
        .track_signal(SignalRecord::feedback(
            "evt_from_another_process",
            "user_feedback",
            "third time the booking hasn't worked",
        ))
        .unwrap();

    let report = client.flush().await.unwrap();
    assert_eq!(report.delivered, 1);
}

#[tokio::test]
async fn signal_without_event_id_is_rejected_locally() {
    let client = client_with(Arc::new(RecordingTransport::default()));
    let err = client
        .track_signal(SignalRecord::reaction("", "thumbs_up", Sentiment::Positive))
        .unwrap_err();
    assert!(matches!(err, TracelightError::Validation(_)));
    assert_eq!(client.pending_records(), 0);
}

#[tokio::test]
async fn shutdown_flushes_then_closes() {
    let transport = Arc::new(RecordingTransport::default());
    let client = client_with(transport.clone());

    client
        .track_event(EventRecord::new("u", "user_message"))
        .unwrap();

    let report = client.shutdown().await.unwrap();
    assert_eq!(report.delivered, 1);

    assert!(matches!(
        client.track_event(EventRecord::new("u", "late")).unwrap_err(),
        TracelightError::ClientClosed
    ));
    assert!(matches!(
        client.identify("u", Properties::new()).unwrap_err(),
        TracelightError::ClientClosed
    ));
    assert!(matches!(
        client.flush().await.unwrap_err(),
        TracelightError::ClientClosed
    ));
    assert!(matches!(
        client.shutdown().await.unwrap_err(),
        TracelightError::ClientClosed
    ));
}

#[tokio::test]
async fn interaction_accumulates_attachments_in_order() {
    let transport = Arc::new(RecordingTransport::default());
    let client = client_with(transport.clone());

    let mut interaction = client
        .begin_interaction("user_001", "code_generation", "Write a fibonacci function")
        .unwrap();
    let interaction_id = interaction.id().to_string();

    interaction
        .add_attachments(vec![
            Attachment::text(
                "Additional context",
                "It should be recursive",
                AttachmentRole::Input,
            ),
            Attachment::text("More context", "Handle edge cases", AttachmentRole::Input),
        ])
        .unwrap();

    let event_id = interaction
        .finish(
            "def fibonacci(n): ...",
            vec![Attachment::code(
                "fibonacci.py",
                "def fibonacci(n): ...",
                AttachmentRole::Output,
                "python",
            )],
        )
        .unwrap();
    assert_eq!(event_id, interaction_id);

    // Sealed: both mutation paths fail, and nothing new is emitted.
    assert!(matches!(
        interaction.add_attachments(vec![]).unwrap_err(),
        TracelightError::SealedInteraction(_)
    ));
    assert!(matches!(
        interaction.finish("again", vec![]).unwrap_err(),
        TracelightError::SealedInteraction(_)
    ));

    client.flush().await.unwrap();
    let batches = transport.batches.lock();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 1);
    match &batches[0][0] {
        WireRecord::Event(event) => {
            assert_eq!(event.event_id, interaction_id);
            assert_eq!(event.attachments.len(), 3);
            assert_eq!(event.attachments[0].name, "Additional context");
            assert_eq!(event.attachments[1].name, "More context");
            assert_eq!(event.attachments[2].name, "fibonacci.py");
            assert_eq!(event.attachments[2].language.as_deref(), Some("python"));
        }
        other => panic!("expected event record, got {:?}", other),
    }
}

#[tokio::test]
async fn session_lifecycle_reaches_the_wire() {
    let transport = Arc::new(RecordingTransport::default());
    let client = client_with(transport.clone());

    let session_id = client
        .create_session("Complex Multi-Step Support Agent Test", "support_agent")
        .unwrap();

    for _ in 0..3 {
        client.record_llm_call(&session_id, 100, 50, 0.01).unwrap();
    }
    let usage = client.usage_summary(&session_id).unwrap();
    assert_eq!(usage.llm_calls, 3);
    assert_eq!(usage.total_tokens, 450);

    client
        .complete_session(
            &session_id,
            SessionOutcome::success().with_metric("customer_satisfaction_score", 4.5),
        )
        .unwrap();

    // Double completion is a usage error.
    assert!(matches!(
        client
            .complete_session(&session_id, SessionOutcome::success())
            .unwrap_err(),
        TracelightError::SessionCompleted(_)
    ));

    client.flush().await.unwrap();
    let batches = transport.batches.lock();
    let records: Vec<&WireRecord> = batches.iter().flatten().collect();
    assert_eq!(records.len(), 2);
    assert!(matches!(records[0], WireRecord::SessionStart(s) if s.session_id == session_id));
    match records[1] {
        WireRecord::SessionEnd(end) => {
            assert_eq!(end.session_id, session_id);
            assert_eq!(end.usage.llm_calls, 3);
            assert!((end.usage.total_cost - 0.03).abs() < 1e-9);
            assert!(end.custom_metrics.contains_key("customer_satisfaction_score"));
        }
        other => panic!("expected session end record, got {:?}", other),
    }
}

#[tokio::test]
async fn unknown_session_is_an_error() {
    let client = client_with(Arc::new(RecordingTransport::default()));
    assert!(matches!(
        client.record_llm_call("ses_missing", 1, 1, 0.0).unwrap_err(),
        TracelightError::UnknownSession(_)
    ));
}

#[tokio::test]
async fn identify_is_queued_not_sent() {
    let transport = Arc::new(RecordingTransport::default());
    let client = client_with(transport.clone());

    let mut traits = Properties::new();
    traits.insert("name".into(), "Test User".into());
    traits.insert("plan".into(), "trial".into());
    client.identify("test_user_001", traits).unwrap();

    assert_eq!(transport.batch_count(), 0);
    assert_eq!(client.pending_records(), 1);

    let report = client.flush().await.unwrap();
    assert_eq!(report.delivered, 1);
    assert_eq!(transport.delivered_keys(), vec!["identify/test_user_001"]);
}
