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

//! Session aggregation.
//!
//! A [`Session`] accumulates usage metrics (LLM call count, token counts,
//! cost estimate) across the calls observed within one logical agent run.
//! Counters only grow while the session is pending; completion is terminal:
//! `pending -> {succeeded, failed}` with no way back.

use crate::error::{Result, TracelightError};
use crate::pricing;
use crate::types::{Properties, SessionEndRecord, SessionStatus, UsageSummary};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Cost is accumulated in integer micro-dollars so concurrent observers can
/// use a plain atomic add without drift.
const MICROS_PER_DOLLAR: f64 = 1_000_000.0;

/// Outcome passed to `complete_session`.
#[derive(Debug, Clone, Default)]
pub struct SessionOutcome {
    pub success: bool,
    pub failure_reason: Option<String>,
    pub custom_metrics: Properties,
}

impl SessionOutcome {
    /// A successful outcome.
    pub fn success() -> Self {
        Self {
            success: true,
            failure_reason: None,
            custom_metrics: Properties::new(),
        }
    }

    /// A failed outcome with a reason.
    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            failure_reason: Some(reason.into()),
            custom_metrics: Properties::new(),
        }
    }

    /// Attach a custom metric reported with the session close record.
    pub fn with_metric(
        mut self,
        key: impl Into<String>,
        value: impl Into<crate::types::PropertyValue>,
    ) -> Self {
        self.custom_metrics.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, Copy)]
struct Completed {
    status: SessionStatus,
    duration_ms: u64,
}

/// Usage aggregator for one logical agent run.
///
/// Safe to share across concurrent observers of the same run; callers never
/// need to serialize access themselves.
pub struct Session {
    id: String,
    name: String,
    agent_name: String,
    started_at: DateTime<Utc>,
    started: Instant,
    llm_calls: AtomicU64,
    prompt_tokens: AtomicU64,
    completion_tokens: AtomicU64,
    cost_micros: AtomicU64,
    completed: Mutex<Option<Completed>>,
}

impl Session {
    pub(crate) fn new(id: String, name: String, agent_name: String) -> Self {
        Self {
            id,
            name,
            agent_name,
            started_at: Utc::now(),
            started: Instant::now(),
            llm_calls: AtomicU64::new(0),
            prompt_tokens: AtomicU64::new(0),
            completion_tokens: AtomicU64::new(0),
            cost_micros: AtomicU64::new(0),
            completed: Mutex::new(None),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Current status.
    pub fn status(&self) -> SessionStatus {
        match *self.completed.lock() {
            Some(done) => done.status,
            None => SessionStatus::Pending,
        }
    }

    /// Record one observed LLM call with an explicit cost estimate in USD.
    ///
    /// Fails with `SessionCompleted` once the session has been completed.
    pub fn record_llm_call(
        &self,
        prompt_tokens: u64,
        completion_tokens: u64,
        cost_estimate: f64,
    ) -> Result<()> {
        // Counters are frozen after completion; the guard is held across the
        // increments so a concurrent complete cannot interleave.
        let guard = self.completed.lock();
        if guard.is_some() {
            return Err(TracelightError::SessionCompleted(self.id.clone()));
        }

        self.llm_calls.fetch_add(1, Ordering::SeqCst);
        self.prompt_tokens.fetch_add(prompt_tokens, Ordering::SeqCst);
        self.completion_tokens
            .fetch_add(completion_tokens, Ordering::SeqCst);
        let micros = (cost_estimate.max(0.0) * MICROS_PER_DOLLAR).round() as u64;
        self.cost_micros.fetch_add(micros, Ordering::SeqCst);
        Ok(())
    }

    /// Record one observed LLM call, estimating cost from the builtin
    /// per-model pricing table. Unknown models contribute zero cost.
    pub fn record_llm_call_for_model(
        &self,
        model: &str,
        prompt_tokens: u64,
        completion_tokens: u64,
    ) -> Result<()> {
        let cost = pricing::estimate_cost(model, prompt_tokens, completion_tokens);
        self.record_llm_call(prompt_tokens, completion_tokens, cost)
    }

    /// Pure read of the current counters plus elapsed time.
    pub fn usage_summary(&self) -> UsageSummary {
        let prompt = self.prompt_tokens.load(Ordering::SeqCst);
        let completion = self.completion_tokens.load(Ordering::SeqCst);
        let duration_ms = match *self.completed.lock() {
            Some(done) => done.duration_ms,
            None => self.started.elapsed().as_millis() as u64,
        };

        UsageSummary {
            llm_calls: self.llm_calls.load(Ordering::SeqCst),
            total_prompt_tokens: prompt,
            total_completion_tokens: completion,
            total_tokens: prompt + completion,
            total_cost: self.cost_micros.load(Ordering::SeqCst) as f64 / MICROS_PER_DOLLAR,
            duration_ms,
        }
    }

    /// Transition to a terminal status and build the close record.
    ///
    /// Fails with `SessionCompleted` on the second call.
    pub(crate) fn complete(&self, outcome: SessionOutcome) -> Result<SessionEndRecord> {
        let mut guard = self.completed.lock();
        if guard.is_some() {
            return Err(TracelightError::SessionCompleted(self.id.clone()));
        }

        let status = if outcome.success {
            SessionStatus::Succeeded
        } else {
            SessionStatus::Failed
        };
        *guard = Some(Completed {
            status,
            duration_ms: self.started.elapsed().as_millis() as u64,
        });
        drop(guard);

        Ok(SessionEndRecord {
            session_id: self.id.clone(),
            status,
            failure_reason: outcome.failure_reason,
            usage: self.usage_summary(),
            custom_metrics: outcome.custom_metrics,
            completed_at: Utc::now(),
        })
    }
}
