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

//! Client configuration.

use crate::error::{Result, TracelightError};
use std::time::Duration;

/// Default collector endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:3001";

/// Environment variable holding the write key.
pub const ENV_WRITE_KEY: &str = "TRACELIGHT_WRITE_KEY";
/// Environment variable overriding the collector endpoint.
pub const ENV_ENDPOINT: &str = "TRACELIGHT_ENDPOINT";
/// Environment variable enabling debug logs ("1" or "true").
pub const ENV_DEBUG: &str = "TRACELIGHT_DEBUG";

/// Tracking client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Write key identifying the collector namespace. Required, non-empty.
    pub write_key: String,
    /// Base URL of the collector.
    pub endpoint: String,
    /// Raise flush-path logging visibility from debug to info.
    pub debug_logs: bool,
    /// Timeout per delivery attempt (default: 30 seconds).
    pub timeout: Duration,
    /// Maximum delivery attempts per batch before its records are dropped
    /// and reported as failed (default: 3).
    pub max_delivery_attempts: u32,
    /// Base backoff between delivery attempts, doubled each retry
    /// (default: 200ms).
    pub retry_backoff: Duration,
    /// Maximum records per delivery batch (default: 100).
    pub batch_size: usize,
}

impl ClientConfig {
    /// Create a configuration with the default collector endpoint.
    pub fn new(write_key: impl Into<String>) -> Self {
        Self {
            write_key: write_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            debug_logs: false,
            timeout: Duration::from_secs(30),
            max_delivery_attempts: 3,
            retry_backoff: Duration::from_millis(200),
            batch_size: 100,
        }
    }

    /// Read configuration from the environment. The write key is required;
    /// its absence is a startup-time configuration error.
    pub fn from_env() -> Result<Self> {
        let write_key = std::env::var(ENV_WRITE_KEY)
            .map_err(|_| TracelightError::Configuration(format!("{} is not set", ENV_WRITE_KEY)))?;

        let mut config = Self::new(write_key);
        if let Ok(endpoint) = std::env::var(ENV_ENDPOINT) {
            config.endpoint = endpoint;
        }
        if let Ok(debug) = std::env::var(ENV_DEBUG) {
            config.debug_logs = matches!(debug.as_str(), "1" | "true");
        }
        config.validate()?;
        Ok(config)
    }

    /// Set the collector endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Enable or disable debug logs.
    pub fn with_debug_logs(mut self, debug_logs: bool) -> Self {
        self.debug_logs = debug_logs;
        self
    }

    /// Set the per-attempt delivery timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the maximum delivery attempts per batch.
    pub fn with_max_delivery_attempts(mut self, attempts: u32) -> Self {
        self.max_delivery_attempts = attempts;
        self
    }

    /// Set the base retry backoff.
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Set the maximum records per batch.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.write_key.trim().is_empty() {
            return Err(TracelightError::Configuration(
                "write key must not be empty".into(),
            ));
        }
        if self.endpoint.trim().is_empty() {
            return Err(TracelightError::Configuration(
                "endpoint must not be empty".into(),
            ));
        }
        if self.max_delivery_attempts == 0 {
            return Err(TracelightError::Configuration(
                "max_delivery_attempts must be at least 1".into(),
            ));
        }
        if self.batch_size == 0 {
            return Err(TracelightError::Configuration(
                "batch_size must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new("wk_test");
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.max_delivery_attempts, 3);
        assert_eq!(config.batch_size, 100);
        assert!(!config.debug_logs);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_write_key_rejected() {
        let err = ClientConfig::new("  ").validate().unwrap_err();
        assert!(matches!(err, TracelightError::Configuration(_)));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let err = ClientConfig::new("wk_test")
            .with_max_delivery_attempts(0)
            .validate()
            .unwrap_err();
        assert!(matches!(err, TracelightError::Configuration(_)));
    }

    #[test]
    fn test_builder_overrides() {
        let config = ClientConfig::new("wk_test")
            .with_endpoint("https://collector.example.com")
            .with_debug_logs(true)
            .with_batch_size(10);
        assert_eq!(config.endpoint, "https://collector.example.com");
        assert!(config.debug_logs);
        assert_eq!(config.batch_size, 10);
    }
}
