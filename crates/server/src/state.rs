use std::sync::Arc;

use scrapeyard_core::scrape_log::ScrapeLogStore;
use scrapeyard_core::{
    Config, ContentStore, SanitizedConfig, ScrapeOrchestrator, SharedStatus,
};

/// Shared application state
pub struct AppState {
    config: Config,
    config_hash: String,
    status: SharedStatus,
    store: Arc<dyn ContentStore>,
    scrape_log: Arc<dyn ScrapeLogStore>,
    orchestrator: Option<Arc<ScrapeOrchestrator>>,
}

impl AppState {
    pub fn new(
        config: Config,
        config_hash: String,
        status: SharedStatus,
        store: Arc<dyn ContentStore>,
        scrape_log: Arc<dyn ScrapeLogStore>,
        orchestrator: Option<Arc<ScrapeOrchestrator>>,
    ) -> Self {
        Self {
            config,
            config_hash,
            status,
            store,
            scrape_log,
            orchestrator,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn config_hash(&self) -> &str {
        &self.config_hash
    }

    pub fn status(&self) -> &SharedStatus {
        &self.status
    }

    pub fn store(&self) -> &dyn ContentStore {
        self.store.as_ref()
    }

    pub fn scrape_log(&self) -> &dyn ScrapeLogStore {
        self.scrape_log.as_ref()
    }

    pub fn orchestrator(&self) -> Option<&Arc<ScrapeOrchestrator>> {
        self.orchestrator.as_ref()
    }
}
