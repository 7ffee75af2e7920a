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

//! Tracelight SDK errors.
//!
//! Configuration and validation errors are raised synchronously to the caller
//! at the call that caused them. Delivery failures are never raised from
//! tracking calls; they surface as data in the [`FlushReport`] returned by
//! `flush` and `shutdown`.
//!
//! [`FlushReport`]: crate::FlushReport

use thiserror::Error;

/// Tracelight SDK errors.
#[derive(Error, Debug)]
pub enum TracelightError {
    /// Missing or invalid setup value (write key, endpoint).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A record is malformed (e.g. a signal without an event id).
    #[error("invalid record: {0}")]
    Validation(String),

    /// `finish` or `add_attachments` called on an already-finished interaction.
    #[error("interaction {0} is already finished")]
    SealedInteraction(String),

    /// `complete_session` or `record_llm_call` on a completed session.
    #[error("session {0} is already completed")]
    SessionCompleted(String),

    /// The session id is not known to this client.
    #[error("unknown session: {0}")]
    UnknownSession(String),

    /// A tracking call after `shutdown`.
    #[error("client is shut down")]
    ClientClosed,
}

/// Result type for Tracelight operations.
pub type Result<T> = std::result::Result<T, TracelightError>;
