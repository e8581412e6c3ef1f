use std::sync::Arc;

use tokio::sync::mpsc;

use super::{ScrapeFailureEnvelope, ScrapeLogEntry, ScrapeLogHandle, ScrapeLogStore};

/// Background task that writes recorded failures to storage
pub struct ScrapeLogWriter {
    rx: mpsc::Receiver<ScrapeFailureEnvelope>,
    store: Arc<dyn ScrapeLogStore>,
}

impl ScrapeLogWriter {
    pub fn new(rx: mpsc::Receiver<ScrapeFailureEnvelope>, store: Arc<dyn ScrapeLogStore>) -> Self {
        Self { rx, store }
    }

    /// Run until every handle is dropped
    ///
    /// This should be spawned as a background task.
    pub async fn run(mut self) {
        tracing::info!("Scrape log writer started");

        while let Some(envelope) = self.rx.recv().await {
            let failure = envelope.failure;
            let entry = ScrapeLogEntry {
                id: 0, // Will be set by database
                timestamp: envelope.timestamp,
                run_id: failure.run_id,
                source: failure.source,
                slug: failure.slug,
                kind: failure.kind,
                message: failure.message,
            };

            if let Err(e) = self.store.insert(&entry) {
                tracing::error!("Failed to write scrape failure: {}", e);
            }
        }

        tracing::info!("Scrape log writer shutting down");
    }
}

/// Create the handle/writer pair
///
/// Spawn the writer with `tokio::spawn(writer.run())` and clone the handle
/// into whatever records failures.
pub fn create_scrape_log(
    store: Arc<dyn ScrapeLogStore>,
    buffer_size: usize,
) -> (ScrapeLogHandle, ScrapeLogWriter) {
    let (tx, rx) = mpsc::channel(buffer_size);
    let handle = ScrapeLogHandle::new(tx);
    let writer = ScrapeLogWriter::new(rx, store);
    (handle, writer)
}
