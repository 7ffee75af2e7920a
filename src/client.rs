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

//! Tracking client.
//!
//! The process-wide façade: tracking calls enqueue records into a local
//! buffer and never touch the network; `flush` drains the buffer to the
//! collector with bounded retries and backoff. Delivery failures are
//! reported in the [`FlushReport`], never raised into the caller's primary
//! workflow.

use crate::config::ClientConfig;
use crate::error::{Result, TracelightError};
use crate::interaction::Interaction;
use crate::session::{Session, SessionOutcome};
use crate::transport::{HttpTransport, Transport};
use crate::types::{
    generate_id, EventRecord, IdentifyRecord, Properties, SessionStartRecord, SignalRecord,
    UsageSummary, WireRecord,
};
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Outcome of a `flush` or `shutdown`: how many records the collector
/// accepted, and the idempotency keys of records dropped after exhausting
/// their delivery attempts.
#[derive(Debug, Clone, Default)]
pub struct FlushReport {
    pub delivered: usize,
    pub failed: Vec<String>,
}

impl FlushReport {
    /// True when every drained record was delivered.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Tracking client for Rust applications.
///
/// Constructed once and passed by reference to all call sites; there is no
/// ambient global instance.
///
/// # Example
///
/// ```no_run
/// use tracelight::{ClientConfig, EventRecord, TrackingClient};
///
/// #[tokio::main]
/// async fn main() -> tracelight::Result<()> {
///     let client = TrackingClient::new(ClientConfig::new("wk_live_123"))?;
///
///     let event = EventRecord::new("user_001", "user_message")
///         .with_model("gemini-2.5-pro")
///         .with_input("What is the capital of France?")
///         .with_output("The capital of France is Paris.");
///     let event_id = client.track_event(event)?;
///     println!("tracked {}", event_id);
///
///     let report = client.shutdown().await?;
///     println!("delivered {} records", report.delivered);
///     Ok(())
/// }
/// ```
pub struct TrackingClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    buffer: Mutex<VecDeque<WireRecord>>,
    sessions: Mutex<HashMap<String, Arc<Session>>>,
    closed: AtomicBool,
}

impl std::fmt::Debug for TrackingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackingClient")
            .field("config", &self.config)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl TrackingClient {
    /// Create a client delivering over HTTP to the configured collector.
    ///
    /// Fails with a configuration error if the write key is empty.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = Arc::new(HttpTransport::new(&config)?);
        Ok(Self::build(config, transport))
    }

    /// Create a client with an injected transport. This is the seam tests
    /// use to run against a fake collector.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, transport))
    }

    fn build(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            transport,
            buffer: Mutex::new(VecDeque::new()),
            sessions: Mutex::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Number of buffered records not yet flushed.
    pub fn pending_records(&self) -> usize {
        self.buffer.lock().len()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TracelightError::ClientClosed);
        }
        Ok(())
    }

    fn enqueue(&self, record: WireRecord) {
        self.buffer.lock().push_back(record);
    }

    /// Associate a user id with a trait bag. Queued, not sent immediately.
    pub fn identify(&self, user_id: impl Into<String>, traits: Properties) -> Result<()> {
        self.ensure_open()?;
        let user_id = user_id.into();
        if user_id.is_empty() {
            return Err(TracelightError::Validation("identify requires a user id".into()));
        }

        self.enqueue(WireRecord::Identify(IdentifyRecord {
            user_id,
            traits,
            timestamp: Utc::now(),
        }));
        Ok(())
    }

    /// Enqueue one event record and return its id (caller-supplied or
    /// generated). Never blocks on network I/O.
    pub fn track_event(&self, mut event: EventRecord) -> Result<String> {
        self.ensure_open()?;
        if event.event_id.is_empty() {
            event.event_id = generate_id("evt");
        }
        let event_id = event.event_id.clone();
        debug!(event_id = %event_id, event = %event.event, "buffered event");
        self.enqueue(WireRecord::Event(event));
        Ok(event_id)
    }

    /// Enqueue one signal record. The referenced event id must be non-empty;
    /// whether it exists is for the collector to decide.
    pub fn track_signal(&self, signal: SignalRecord) -> Result<()> {
        self.ensure_open()?;
        if signal.event_id.is_empty() {
            return Err(TracelightError::Validation(
                "signal requires a referenced event id".into(),
            ));
        }
        debug!(event_id = %signal.event_id, name = %signal.name, "buffered signal");
        self.enqueue(WireRecord::Signal(signal));
        Ok(())
    }

    /// Open an incremental interaction that finalizes into one event record.
    pub fn begin_interaction(
        &self,
        user_id: impl Into<String>,
        event: impl Into<String>,
        input: impl Into<String>,
    ) -> Result<Interaction<'_>> {
        self.ensure_open()?;
        Ok(Interaction::new(
            self,
            generate_id("int"),
            user_id.into(),
            event.into(),
            input.into(),
        ))
    }

    /// Allocate a new session with zero counters and pending status, and
    /// enqueue its open record.
    pub fn create_session(
        &self,
        name: impl Into<String>,
        agent_name: impl Into<String>,
    ) -> Result<String> {
        self.ensure_open()?;
        let session = Arc::new(Session::new(
            generate_id("ses"),
            name.into(),
            agent_name.into(),
        ));
        let session_id = session.id().to_string();

        self.enqueue(WireRecord::SessionStart(SessionStartRecord {
            session_id: session_id.clone(),
            name: session.name().to_string(),
            agent_name: session.agent_name().to_string(),
            started_at: session.started_at(),
        }));
        self.sessions.lock().insert(session_id.clone(), session);
        Ok(session_id)
    }

    /// Look up a live session handle by id.
    pub fn session(&self, session_id: &str) -> Option<Arc<Session>> {
        self.sessions.lock().get(session_id).cloned()
    }

    fn session_or_err(&self, session_id: &str) -> Result<Arc<Session>> {
        self.session(session_id)
            .ok_or_else(|| TracelightError::UnknownSession(session_id.to_string()))
    }

    /// Record one observed LLM call against a session by id.
    pub fn record_llm_call(
        &self,
        session_id: &str,
        prompt_tokens: u64,
        completion_tokens: u64,
        cost_estimate: f64,
    ) -> Result<()> {
        self.session_or_err(session_id)?
            .record_llm_call(prompt_tokens, completion_tokens, cost_estimate)
    }

    /// Read a session's aggregated usage counters.
    pub fn usage_summary(&self, session_id: &str) -> Result<UsageSummary> {
        Ok(self.session_or_err(session_id)?.usage_summary())
    }

    /// Transition a session to its terminal status and enqueue its close
    /// record. Fails with `SessionCompleted` if called twice.
    pub fn complete_session(&self, session_id: &str, outcome: SessionOutcome) -> Result<()> {
        self.ensure_open()?;
        let record = self.session_or_err(session_id)?.complete(outcome)?;
        self.enqueue(WireRecord::SessionEnd(record));
        Ok(())
    }

    /// Synchronously drain the local buffer to the collector.
    ///
    /// Records are sent in enqueue order, in batches of at most
    /// `batch_size`. Each batch gets up to `max_delivery_attempts` tries
    /// with doubling backoff and a per-attempt timeout; a batch that
    /// exhausts its attempts is dropped and its record keys reported in
    /// the result. Delivery problems are never returned as `Err`.
    pub async fn flush(&self) -> Result<FlushReport> {
        self.ensure_open()?;
        Ok(self.flush_inner().await)
    }

    /// Flush remaining records, then close the client. Every record
    /// accepted before shutdown gets at least one delivery attempt.
    /// Tracking calls after shutdown fail with `ClientClosed`.
    pub async fn shutdown(&self) -> Result<FlushReport> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(TracelightError::ClientClosed);
        }
        Ok(self.flush_inner().await)
    }

    async fn flush_inner(&self) -> FlushReport {
        let drained: Vec<WireRecord> = {
            let mut buffer = self.buffer.lock();
            buffer.drain(..).collect()
        };

        if drained.is_empty() {
            return FlushReport::default();
        }

        if self.config.debug_logs {
            info!(records = drained.len(), "flushing buffered records");
        } else {
            debug!(records = drained.len(), "flushing buffered records");
        }

        let mut report = FlushReport::default();
        for chunk in drained.chunks(self.config.batch_size) {
            match self.deliver_batch(chunk).await {
                Ok(()) => report.delivered += chunk.len(),
                Err(message) => {
                    error!(
                        records = chunk.len(),
                        attempts = self.config.max_delivery_attempts,
                        %message,
                        "dropping batch after exhausting delivery attempts"
                    );
                    report
                        .failed
                        .extend(chunk.iter().map(WireRecord::idempotency_key));
                }
            }
        }

        if self.config.debug_logs {
            info!(
                delivered = report.delivered,
                failed = report.failed.len(),
                "flush complete"
            );
        }
        report
    }

    /// Deliver one batch with bounded retries. Returns the last failure
    /// message when all attempts are exhausted.
    async fn deliver_batch(&self, batch: &[WireRecord]) -> std::result::Result<(), String> {
        let mut backoff = self.config.retry_backoff;

        for attempt in 1..=self.config.max_delivery_attempts {
            let outcome =
                tokio::time::timeout(self.config.timeout, self.transport.send(batch)).await;

            let message = match outcome {
                Ok(Ok(())) => return Ok(()),
                Ok(Err(e)) => e.to_string(),
                Err(_) => "delivery attempt timed out".to_string(),
            };

            if attempt == self.config.max_delivery_attempts {
                return Err(message);
            }

            warn!(attempt, %message, "delivery attempt failed, retrying");
            tokio::time::sleep(backoff).await;
            backoff *= 2;
        }

        // max_delivery_attempts >= 1 is enforced by config validation.
        Err("no delivery attempts configured".to_string())
    }
}
