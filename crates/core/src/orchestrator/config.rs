//! Orchestrator configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::ScraperConfig;
use crate::retry::RetryPolicy;

/// Configuration for the scrape orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Run the scheduled loop. When disabled, runs only happen on demand.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Candidates of one source processed concurrently.
    #[serde(default = "default_max_web_request")]
    pub max_web_request: usize,

    /// Timeout of each call to a source or the catalog (milliseconds).
    #[serde(default = "default_timeout")]
    pub request_timeout_ms: u64,

    /// Pause between two runs (milliseconds).
    #[serde(default = "default_interval")]
    pub interval_ms: u64,

    /// Start the first run as soon as the loop starts.
    #[serde(default = "default_true")]
    pub run_on_start: bool,
}

fn default_true() -> bool {
    true
}

fn default_max_web_request() -> usize {
    2
}

fn default_timeout() -> u64 {
    30_000 // 30 seconds
}

fn default_interval() -> u64 {
    3_600_000 // 1 hour
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_web_request: default_max_web_request(),
            request_timeout_ms: default_timeout(),
            interval_ms: default_interval(),
            run_on_start: true,
        }
    }
}

impl OrchestratorConfig {
    /// Per-call retry policy: one retry on transient failure.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::once(Duration::from_millis(self.request_timeout_ms))
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Worker count, never zero.
    pub fn concurrency(&self) -> usize {
        self.max_web_request.max(1)
    }
}

impl From<&ScraperConfig> for OrchestratorConfig {
    fn from(scraper: &ScraperConfig) -> Self {
        Self {
            enabled: scraper.enabled,
            max_web_request: scraper.max_web_request,
            request_timeout_ms: scraper.request_timeout_secs.saturating_mul(1000),
            interval_ms: scraper.interval_secs.saturating_mul(1000),
            run_on_start: scraper.run_on_start,
        }
    }
}
