//! Client configuration
//!
//! Connection and resilience settings for [`crate::client::ApiClient`]. The
//! binary fills this from CLI flags (with environment fallbacks); library
//! callers usually start from `ClientConfig::default()`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_TTL_MINUTES;
use crate::fetch::{RetryOptions, DEFAULT_MAX_RETRIES};

/// Production API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.vorex.app/v1/";

/// Configuration for the backend API client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL every request path is resolved against
    pub base_url: String,
    /// Retries after the first attempt for transient failures
    pub max_retries: u32,
    /// Base backoff between attempts in milliseconds
    pub retry_delay_ms: u64,
    /// Lifetime of cached GET responses in minutes
    pub cache_ttl_minutes: u64,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay_ms: 1000,
            cache_ttl_minutes: DEFAULT_TTL_MINUTES,
            timeout_secs: 30,
        }
    }
}

impl ClientConfig {
    /// Retry options derived from this configuration
    pub fn retry_options(&self) -> RetryOptions {
        RetryOptions::default()
            .with_max_retries(self.max_retries)
            .with_retry_delay(Duration::from_millis(self.retry_delay_ms))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
