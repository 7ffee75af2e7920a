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

//! # Tracelight SDK for Rust
//!
//! Best-effort event tracking for LLM agents and AI applications: record AI
//! interactions, attach post-hoc feedback signals, accumulate partial
//! interactions, and aggregate per-session usage and cost, with batched
//! delivery to a remote collector.
//!
//! Tracking calls only buffer locally and never block on the network.
//! Delivery happens in `flush`/`shutdown` with bounded retries; failures are
//! reported as data, never raised into the workflow being observed.
//!
//! ## Quick Start
//!
//! ```no_run
//! use tracelight::{ClientConfig, EventRecord, Sentiment, SignalRecord, TrackingClient};
//!
//! #[tokio::main]
//! async fn main() -> tracelight::Result<()> {
//!     let config = ClientConfig::new("wk_live_123")
//!         .with_endpoint("https://collector.example.com");
//!     let client = TrackingClient::new(config)?;
//!
//!     let event_id = client.track_event(
//!         EventRecord::new("user_001", "user_message")
//!             .with_model("gemini-2.5-pro")
//!             .with_input("What is the capital of France?")
//!             .with_output("The capital of France is Paris."),
//!     )?;
//!
//!     client.track_signal(SignalRecord::reaction(&event_id, "thumbs_up", Sentiment::Positive))?;
//!
//!     let report = client.shutdown().await?;
//!     println!("delivered {} records", report.delivered);
//!     Ok(())
//! }
//! ```
//!
//! ## Sessions
//!
//! ```no_run
//! use tracelight::{ClientConfig, SessionOutcome, TrackingClient};
//!
//! # async fn example() -> tracelight::Result<()> {
//! let client = TrackingClient::new(ClientConfig::new("wk_live_123"))?;
//!
//! let session_id = client.create_session("Support run", "support_agent")?;
//! client.record_llm_call(&session_id, 100, 50, 0.01)?;
//!
//! let usage = client.usage_summary(&session_id)?;
//! println!("{} calls, {} tokens, ${:.4}", usage.llm_calls, usage.total_tokens, usage.total_cost);
//!
//! client.complete_session(
//!     &session_id,
//!     SessionOutcome::success().with_metric("first_contact_resolution", 1i64),
//! )?;
//! client.flush().await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
mod interaction;
pub mod pricing;
mod session;
mod transport;
mod types;

pub use client::{FlushReport, TrackingClient};
pub use config::{ClientConfig, DEFAULT_ENDPOINT, ENV_DEBUG, ENV_ENDPOINT, ENV_WRITE_KEY};
pub use error::{Result, TracelightError};
pub use interaction::Interaction;
pub use session::{Session, SessionOutcome};
pub use transport::{HttpTransport, Transport, TransportError};
pub use types::{
    Attachment, AttachmentKind, AttachmentRole, EventRecord, IdentifyRecord, Properties,
    PropertyValue, Sentiment, SessionEndRecord, SessionStartRecord, SessionStatus, SignalKind,
    SignalRecord, UsageSummary, WireRecord,
};
