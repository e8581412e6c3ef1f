pub mod batch;
pub mod config;
pub mod content;
pub mod filler;
pub mod metadata;
pub mod metrics;
pub mod orchestrator;
pub mod parser;
pub mod reconcile;
pub mod retry;
pub mod scrape_log;
pub mod source;
pub mod store;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use content::{Content, ContentKind, Movie, Quality, Show};
pub use orchestrator::{
    OrchestratorConfig, RunReport, ScrapeError, ScrapeOrchestrator, ScrapeSource, SourceReport,
};
pub use store::{ContentStore, SharedStatus, SqliteContentStore, StatusSink};
