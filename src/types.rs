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

//! Tracelight record types.
//!
//! Core type definitions for the records a [`TrackingClient`] buffers and
//! delivers: events, signals, identify calls, and session boundary records.
//!
//! [`TrackingClient`]: crate::TrackingClient

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A property value attached to events, traits, and custom metrics.
///
/// Kept to a small tagged set (string, number, boolean) so serialization is
/// well-defined without full dynamic typing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    String(String),
    Number(f64),
    Bool(bool),
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Number(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Number(value as f64)
    }
}

impl From<u32> for PropertyValue {
    fn from(value: u32) -> Self {
        PropertyValue::Number(value as f64)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

/// Ordered key-value bag used for event properties, identify traits, and
/// session custom metrics.
pub type Properties = BTreeMap<String, PropertyValue>;

/// One tracked AI interaction. Immutable once enqueued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    /// Stable identifier; generated at enqueue time if empty. Signals
    /// reference events by this id.
    #[serde(default)]
    pub event_id: String,
    pub user_id: String,
    /// Event name/type, e.g. "user_message" or "chatbot_turn".
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub input: String,
    pub output: String,
    /// Optional conversation grouping id for multi-turn chats.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Properties::is_empty")]
    pub properties: Properties,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    pub timestamp: DateTime<Utc>,
}

impl EventRecord {
    /// Create a new event record with an empty (to-be-generated) id.
    pub fn new(user_id: impl Into<String>, event: impl Into<String>) -> Self {
        Self {
            event_id: String::new(),
            user_id: user_id.into(),
            event: event.into(),
            model: None,
            input: String::new(),
            output: String::new(),
            conversation_id: None,
            properties: Properties::new(),
            attachments: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    /// Set a caller-supplied event id.
    pub fn with_event_id(mut self, event_id: impl Into<String>) -> Self {
        self.event_id = event_id.into();
        self
    }

    /// Set the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the input content.
    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = input.into();
        self
    }

    /// Set the output content.
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }

    /// Set the conversation grouping id.
    pub fn with_conversation_id(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    /// Add one property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// Discrete category of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalKind {
    /// A default reaction such as thumbs up/down.
    Default,
    /// Free-text user feedback.
    Feedback,
}

/// Sentiment of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

/// Post-hoc feedback attached to a previously tracked event.
///
/// The referenced event id is not checked against delivered events locally;
/// referential integrity is the collector's job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalRecord {
    /// Id of the event this signal refers to. Required.
    pub event_id: String,
    /// Signal name, e.g. "thumbs_up" or "user_feedback".
    pub name: String,
    pub kind: SignalKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl SignalRecord {
    /// A default reaction signal (thumbs up/down style).
    pub fn reaction(
        event_id: impl Into<String>,
        name: impl Into<String>,
        sentiment: Sentiment,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            name: name.into(),
            kind: SignalKind::Default,
            sentiment: Some(sentiment),
            comment: None,
        }
    }

    /// A free-text feedback signal.
    pub fn feedback(
        event_id: impl Into<String>,
        name: impl Into<String>,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            name: name.into(),
            kind: SignalKind::Feedback,
            sentiment: None,
            comment: Some(comment.into()),
        }
    }

    /// Set the sentiment.
    pub fn with_sentiment(mut self, sentiment: Sentiment) -> Self {
        self.sentiment = Some(sentiment);
        self
    }
}

/// Attachment content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Text,
    Code,
    Other,
}

/// Whether an attachment belongs to the input or the output side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentRole {
    Input,
    Output,
}

/// A named piece of content attached to an event, typically accumulated
/// through an [`Interaction`](crate::Interaction).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(rename = "type")]
    pub kind: AttachmentKind,
    pub name: String,
    pub value: String,
    pub role: AttachmentRole,
    /// Language tag for code attachments, e.g. "python".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl Attachment {
    /// A plain text attachment.
    pub fn text(name: impl Into<String>, value: impl Into<String>, role: AttachmentRole) -> Self {
        Self {
            kind: AttachmentKind::Text,
            name: name.into(),
            value: value.into(),
            role,
            language: None,
        }
    }

    /// A code attachment with a language tag.
    pub fn code(
        name: impl Into<String>,
        value: impl Into<String>,
        role: AttachmentRole,
        language: impl Into<String>,
    ) -> Self {
        Self {
            kind: AttachmentKind::Code,
            name: name.into(),
            value: value.into(),
            role,
            language: Some(language.into()),
        }
    }
}

/// User identification with a trait bag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifyRecord {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Properties::is_empty")]
    pub traits: Properties,
    pub timestamp: DateTime<Utc>,
}

/// Terminal status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Pending,
    Succeeded,
    Failed,
}

/// Snapshot of a session's aggregated usage counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageSummary {
    pub llm_calls: u64,
    pub total_prompt_tokens: u64,
    pub total_completion_tokens: u64,
    pub total_tokens: u64,
    /// Accumulated cost estimate in USD.
    pub total_cost: f64,
    /// Elapsed time since session start (frozen at completion).
    pub duration_ms: u64,
}

/// Session open record sent to the collector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStartRecord {
    pub session_id: String,
    pub name: String,
    pub agent_name: String,
    pub started_at: DateTime<Utc>,
}

/// Session close record with final usage and custom metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEndRecord {
    pub session_id: String,
    pub status: SessionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    pub usage: UsageSummary,
    #[serde(default, skip_serializing_if = "Properties::is_empty")]
    pub custom_metrics: Properties,
    pub completed_at: DateTime<Utc>,
}

/// A buffered record awaiting delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireRecord {
    Event(EventRecord),
    Signal(SignalRecord),
    Identify(IdentifyRecord),
    SessionStart(SessionStartRecord),
    SessionEnd(SessionEndRecord),
}

impl WireRecord {
    /// Idempotency key used for delivery reporting and safe retries.
    pub fn idempotency_key(&self) -> String {
        match self {
            WireRecord::Event(e) => e.event_id.clone(),
            WireRecord::Signal(s) => format!("{}/{}", s.event_id, s.name),
            WireRecord::Identify(i) => format!("identify/{}", i.user_id),
            WireRecord::SessionStart(s) => format!("{}/start", s.session_id),
            WireRecord::SessionEnd(s) => format!("{}/end", s.session_id),
        }
    }
}

/// Generate a collector-unique id: millisecond timestamp shifted left with
/// random low bits, hex encoded.
pub(crate) fn generate_id(prefix: &str) -> String {
    use rand::Rng;
    let timestamp = Utc::now().timestamp_millis();
    let random_bits: u16 = rand::thread_rng().gen();
    let id = ((timestamp as u64) << 16) | (random_bits as u64);
    format!("{}_{:x}", prefix, id)
}
