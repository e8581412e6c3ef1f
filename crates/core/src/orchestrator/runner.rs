//! Scrape orchestrator implementation.
//!
//! Walks the configured sources strictly one after the other; items of one
//! source run through the [`ItemPipeline`] concurrently.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{error, info, warn};

use super::config::OrchestratorConfig;
use super::pipeline::ItemPipeline;
use super::types::{OrchestratorStatus, RunReport, ScrapeContext, ScrapeError, SourceReport};
use crate::config::SourceConfig;
use crate::metrics;
use crate::parser::AliasTable;
use crate::source::{build_source, collect_listings, SourceError, TorrentSource};
use crate::store::{StatusSink, STATUS_IDLE};

/// A source and the slug aliases applied to its listings.
#[derive(Clone)]
pub struct ScrapeSource {
    pub source: Arc<dyn TorrentSource>,
    pub aliases: AliasTable,
}

impl ScrapeSource {
    /// Wrap a source with the built-in aliases.
    pub fn new(source: Arc<dyn TorrentSource>) -> Self {
        Self {
            source,
            aliases: AliasTable::with_defaults(),
        }
    }

    pub fn with_aliases(mut self, aliases: AliasTable) -> Self {
        self.aliases = aliases;
        self
    }

    /// Build the configured backend; configured aliases override the
    /// built-in ones.
    pub fn from_config(config: &SourceConfig, timeout: Duration) -> Result<Self, SourceError> {
        let source = build_source(config, timeout)?;
        let aliases = AliasTable::with_defaults().extend(config.aliases.clone());
        Ok(Self { source, aliases })
    }
}

/// The scrape orchestrator - runs every source through the pipeline.
pub struct ScrapeOrchestrator {
    config: OrchestratorConfig,
    sources: Vec<ScrapeSource>,
    pipeline: Arc<ItemPipeline>,
    status: Arc<dyn StatusSink>,

    // Runtime state
    running: Arc<AtomicBool>,
    cancel: Arc<AtomicBool>,
    run_lock: Mutex<()>,
    scraping: AtomicBool,
    last_run: RwLock<Option<RunReport>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl ScrapeOrchestrator {
    /// Create a new orchestrator.
    pub fn new(
        config: OrchestratorConfig,
        sources: Vec<ScrapeSource>,
        pipeline: Arc<ItemPipeline>,
        status: Arc<dyn StatusSink>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            sources,
            pipeline,
            status,
            running: Arc::new(AtomicBool::new(false)),
            cancel: Arc::new(AtomicBool::new(false)),
            run_lock: Mutex::new(()),
            scraping: AtomicBool::new(false),
            last_run: RwLock::new(None),
            shutdown_tx,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Start the scheduled loop (spawns a background task).
    pub fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Orchestrator already running");
            return;
        }

        info!(
            sources = self.sources.len(),
            interval_ms = self.config.interval_ms,
            "Starting scrape orchestrator"
        );

        let orchestrator = Arc::clone(self);
        let running = Arc::clone(&self.running);
        let interval = self.config.interval();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!("Scrape loop started");
            if orchestrator.config.run_on_start {
                orchestrator.run_once().await;
            }
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Scrape loop received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                        orchestrator.run_once().await;
                    }
                }
            }
            info!("Scrape loop stopped");
        });
    }

    /// Stop the scheduled loop. A run in progress stops at the next source
    /// boundary.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Orchestrator not running");
            return;
        }

        info!("Stopping scrape orchestrator");
        self.cancel();
        let _ = self.shutdown_tx.send(());
    }

    /// Ask the current run to stop before its next source.
    pub fn cancel(&self) {
        if self.scraping.load(Ordering::SeqCst) {
            info!("Cancelling scrape run at next source boundary");
            self.cancel.store(true, Ordering::SeqCst);
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub async fn last_run(&self) -> Option<RunReport> {
        self.last_run.read().await.clone()
    }

    /// Get current orchestrator status.
    pub async fn status(&self) -> OrchestratorStatus {
        OrchestratorStatus {
            running: self.is_running(),
            scraping: self.scraping.load(Ordering::Relaxed),
            sources: self.sources.len(),
            last_run: self.last_run().await,
        }
    }

    /// Run every source once. Runs never overlap: a second caller waits for
    /// the first run to finish.
    pub async fn run_once(&self) -> RunReport {
        let _guard = self.run_lock.lock().await;
        self.scraping.store(true, Ordering::SeqCst);
        self.cancel.store(false, Ordering::SeqCst);

        let run_id = uuid::Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let timer = Instant::now();
        info!(run_id = %run_id, sources = self.sources.len(), "Scrape run started");

        let mut reports = Vec::with_capacity(self.sources.len());
        let mut cancelled = false;
        for entry in &self.sources {
            if self.cancel.load(Ordering::SeqCst) {
                info!(run_id = %run_id, "Scrape run cancelled");
                cancelled = true;
                break;
            }

            let name = entry.source.name().to_string();
            self.status.set_status(&format!("Scraping {}", name));
            let ctx = ScrapeContext {
                run_id: run_id.clone(),
                source: name,
                kind: entry.source.kind(),
                language: entry.source.language().to_string(),
            };
            reports.push(self.scrape_source(&ctx, entry).await);
        }

        let finished_at = Utc::now();
        self.status.set_status(STATUS_IDLE);
        self.status.set_last_updated(finished_at);
        metrics::RUNS_TOTAL.inc();
        metrics::RUN_DURATION.observe(timer.elapsed().as_secs_f64());

        let report = RunReport {
            run_id,
            started_at,
            finished_at,
            sources: reports,
            cancelled,
        };
        info!(
            run_id = %report.run_id,
            persisted = report.sources.iter().map(|s| s.persisted()).sum::<usize>(),
            cancelled = cancelled,
            "Scrape run finished"
        );

        *self.last_run.write().await = Some(report.clone());
        self.scraping.store(false, Ordering::SeqCst);
        report
    }

    async fn scrape_source(&self, ctx: &ScrapeContext, entry: &ScrapeSource) -> SourceReport {
        info!(source = %ctx.source, kind = ctx.kind.as_str(), "Scraping source");
        let retry = self.config.retry_policy();

        let source = entry.source.as_ref();
        let listings = match collect_listings(source, &source.base_query(), &retry).await {
            Ok(listings) => listings,
            Err(e) => {
                error!(source = %ctx.source, error = %e, "First page failed, skipping source");
                metrics::SOURCE_ABORTS
                    .with_label_values(&[ctx.source.as_str()])
                    .inc();
                self.pipeline
                    .report_failure(ctx, None, &ScrapeError::from(e))
                    .await;
                let mut report = SourceReport::new(&ctx.source);
                report.aborted = true;
                return report;
            }
        };

        let report = self
            .pipeline
            .run_source(ctx, &listings, &entry.aliases, self.config.concurrency())
            .await;
        info!(
            source = %ctx.source,
            created = report.created,
            updated = report.updated,
            unchanged = report.unchanged,
            not_found = report.not_found,
            failed = report.failed,
            "Source finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentKind;
    use crate::metadata::{Enricher, ImageResolver};
    use crate::reconcile::Reconciler;
    use crate::store::{SharedStatus, SqliteContentStore};
    use crate::testing::{fixtures, MockMetadata, MockSource};
    use chrono::DateTime;
    use std::sync::Mutex as StdMutex;

    const PLACEHOLDER: &str = "images/posterholder.png";

    /// Status sink that remembers every update.
    #[derive(Default)]
    struct RecordingStatus {
        statuses: StdMutex<Vec<String>>,
        last_updated: StdMutex<Option<DateTime<Utc>>>,
    }

    impl StatusSink for RecordingStatus {
        fn set_status(&self, status: &str) {
            self.statuses.lock().unwrap().push(status.to_string());
        }

        fn set_last_updated(&self, at: DateTime<Utc>) {
            *self.last_updated.lock().unwrap() = Some(at);
        }
    }

    fn config() -> OrchestratorConfig {
        OrchestratorConfig {
            request_timeout_ms: 200,
            interval_ms: 60_000,
            run_on_start: false,
            ..Default::default()
        }
    }

    fn orchestrator(
        sources: Vec<MockSource>,
        metadata: MockMetadata,
        status: Arc<dyn StatusSink>,
    ) -> ScrapeOrchestrator {
        orchestrator_with(config(), sources, metadata, status)
    }

    fn orchestrator_with(
        config: OrchestratorConfig,
        sources: Vec<MockSource>,
        metadata: MockMetadata,
        status: Arc<dyn StatusSink>,
    ) -> ScrapeOrchestrator {
        let retry = config.retry_policy();
        let store = Arc::new(SqliteContentStore::in_memory().unwrap());
        let enricher = Enricher::new(
            Arc::new(metadata),
            ImageResolver::new(vec![], PLACEHOLDER, retry),
            retry,
        );
        let pipeline = ItemPipeline::new(
            Arc::new(enricher),
            Arc::new(Reconciler::new(store, PLACEHOLDER)),
            None,
        );
        let sources = sources
            .into_iter()
            .map(|s| ScrapeSource::new(Arc::new(s)))
            .collect();
        ScrapeOrchestrator::new(config, sources, Arc::new(pipeline), status)
    }

    #[tokio::test]
    async fn test_status_transitions() {
        let status = Arc::new(RecordingStatus::default());
        let orchestrator = orchestrator(
            vec![
                MockSource::new("eztv", ContentKind::Show),
                MockSource::new("nyaa", ContentKind::Anime),
            ],
            MockMetadata::new(),
            status.clone(),
        );

        let report = orchestrator.run_once().await;
        assert_eq!(report.sources.len(), 2);
        assert!(!report.cancelled);
        assert_eq!(
            *status.statuses.lock().unwrap(),
            vec!["Scraping eztv", "Scraping nyaa", "Idle"]
        );
        assert!(status.last_updated.lock().unwrap().is_some());
        assert_eq!(orchestrator.last_run().await, Some(report));
    }

    #[tokio::test]
    async fn test_failing_source_does_not_block_next() {
        let broken = MockSource::new("broken", ContentKind::Show)
            .failing_with(SourceError::ConnectionFailed("refused".into()));
        let healthy = MockSource::new("eztv", ContentKind::Show)
            .with_pages(vec![vec![fixtures::listing("Show.Name.S01E01.720p-GRP", 5)]]);
        let metadata = MockMetadata::new();
        metadata
            .add_show(fixtures::catalog_show("show-name", "tt0000001"))
            .await;
        metadata
            .set_season("show-name", 1, fixtures::catalog_season(1, 1))
            .await;

        let orchestrator = orchestrator(
            vec![broken.clone(), healthy],
            metadata,
            Arc::new(SharedStatus::new()),
        );
        let report = orchestrator.run_once().await;

        assert!(report.source("broken").unwrap().aborted);
        // First page tried twice: once plus one retry.
        assert_eq!(broken.search_count().await, 2);
        assert_eq!(report.source("eztv").unwrap().created, 1);
    }

    #[tokio::test]
    async fn test_cancel_stops_at_source_boundary() {
        let slow = MockSource::new("slow", ContentKind::Show)
            .with_delay(Duration::from_millis(100))
            .with_pages(vec![vec![]]);
        let never = MockSource::new("never", ContentKind::Show);
        let orchestrator = Arc::new(orchestrator(
            vec![slow.clone(), never.clone()],
            MockMetadata::new(),
            Arc::new(SharedStatus::new()),
        ));

        let runner = Arc::clone(&orchestrator);
        let run = tokio::spawn(async move { runner.run_once().await });
        tokio::time::sleep(Duration::from_millis(30)).await;
        orchestrator.cancel();

        let report = run.await.unwrap();
        assert!(report.cancelled);
        assert_eq!(report.sources.len(), 1);
        assert_eq!(slow.search_count().await, 1);
        assert_eq!(never.search_count().await, 0);
    }

    #[tokio::test]
    async fn test_start_stop() {
        let source = MockSource::new("eztv", ContentKind::Show);
        let mut cfg = config();
        cfg.run_on_start = true;
        let orchestrator = Arc::new(orchestrator_with(
            cfg,
            vec![source.clone()],
            MockMetadata::new(),
            Arc::new(SharedStatus::new()),
        ));

        orchestrator.start();
        assert!(orchestrator.is_running());
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(source.search_count().await, 1);

        orchestrator.stop().await;
        assert!(!orchestrator.is_running());
        assert!(orchestrator.status().await.last_run.is_some());
    }
}
