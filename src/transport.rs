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

//! Record delivery transport.
//!
//! The client talks to the collector through the [`Transport`] trait so tests
//! can inject a fake and never touch the network. [`HttpTransport`] is the
//! production implementation: one JSON POST per batch.

use crate::config::ClientConfig;
use crate::error::TracelightError;
use crate::types::WireRecord;
use async_trait::async_trait;
use serde_json::json;
use thiserror::Error;

/// A single delivery attempt failure. Transient by assumption; the client
/// retries with bounded backoff.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("collector rejected batch ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Capability for delivering a batch of records to the collector.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver one batch. Success means the collector accepted every record
    /// in it; any error causes the whole batch to be retried.
    async fn send(&self, batch: &[WireRecord]) -> std::result::Result<(), TransportError>;
}

/// JSON-over-HTTP transport to the collector's batch ingest endpoint.
pub struct HttpTransport {
    http: reqwest::Client,
    endpoint: String,
    write_key: String,
}

impl HttpTransport {
    /// Build a transport from the client configuration.
    pub fn new(config: &ClientConfig) -> crate::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                TracelightError::Configuration(format!("failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            write_key: config.write_key.clone(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, batch: &[WireRecord]) -> std::result::Result<(), TransportError> {
        let url = format!("{}/api/v1/batch", self.endpoint);

        let response = self
            .http
            .post(&url)
            .header("Content-Type", "application/json")
            .header("X-Write-Key", &self.write_key)
            .json(&json!({ "records": batch }))
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TransportError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}
