//! Scrape orchestrator.
//!
//! A run walks the configured sources one after the other:
//! - **Sources**: sequential, a failing source never blocks the next one
//! - **Items**: up to `max_web_request` candidates of one source are
//!   enriched, filled and reconciled concurrently
//! - **Cancellation**: honored at source boundaries; in-flight items finish

mod config;
mod pipeline;
mod runner;
mod types;

pub use config::OrchestratorConfig;
pub use pipeline::{extract_candidates, ItemPipeline};
pub use runner::{ScrapeOrchestrator, ScrapeSource};
pub use types::{OrchestratorStatus, RunReport, ScrapeContext, ScrapeError, SourceReport};
