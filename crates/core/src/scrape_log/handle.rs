use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use super::ScrapeFailure;

/// A failure with the time it was recorded
#[derive(Debug, Clone)]
pub struct ScrapeFailureEnvelope {
    pub timestamp: DateTime<Utc>,
    pub failure: ScrapeFailure,
}

/// Handle for recording scrape failures
///
/// Cheaply cloneable; every worker task holds one.
#[derive(Clone)]
pub struct ScrapeLogHandle {
    tx: mpsc::Sender<ScrapeFailureEnvelope>,
}

impl ScrapeLogHandle {
    pub fn new(tx: mpsc::Sender<ScrapeFailureEnvelope>) -> Self {
        Self { tx }
    }

    /// Record a failure. A full or closed channel is logged, never returned.
    pub async fn record(&self, failure: ScrapeFailure) {
        let envelope = ScrapeFailureEnvelope {
            timestamp: Utc::now(),
            failure,
        };
        if let Err(e) = self.tx.send(envelope).await {
            tracing::error!("Failed to record scrape failure: {}", e);
        }
    }

    /// Record without waiting for channel capacity
    ///
    /// Returns true if the failure was queued.
    pub fn try_record(&self, failure: ScrapeFailure) -> bool {
        let envelope = ScrapeFailureEnvelope {
            timestamp: Utc::now(),
            failure,
        };
        match self.tx.try_send(envelope) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to record scrape failure: {}", e);
                false
            }
        }
    }
}
