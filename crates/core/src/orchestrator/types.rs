//! Types for the scrape orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::content::ContentKind;
use crate::metadata::MetadataError;
use crate::reconcile::{ReconcileError, ReconcileOutcome};
use crate::retry::Transient;
use crate::source::SourceError;

/// Why an item or a source was abandoned.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScrapeError {
    /// The catalog has no record for the slug.
    #[error("not found: {0}")]
    NotFound(String),

    /// Timeout or connection failure, after the retry.
    #[error("network failure: {0}")]
    TransientNetwork(String),

    /// A collaborator answered with a well-formed error.
    #[error("collaborator error: {0}")]
    Collaborator(String),

    /// The merged record could not be written; the stored one is unchanged.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// The first page of a source could not be fetched.
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),
}

impl ScrapeError {
    /// Stable name used in the error log and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ScrapeError::NotFound(_) => "not_found",
            ScrapeError::TransientNetwork(_) => "transient_network",
            ScrapeError::Collaborator(_) => "collaborator",
            ScrapeError::Persistence(_) => "persistence",
            ScrapeError::SourceUnavailable(_) => "source_unavailable",
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, ScrapeError::TransientNetwork(_))
    }
}

impl From<MetadataError> for ScrapeError {
    fn from(e: MetadataError) -> Self {
        match e {
            MetadataError::NotFound(what) => ScrapeError::NotFound(what),
            e if e.is_transient() => ScrapeError::TransientNetwork(e.to_string()),
            e => ScrapeError::Collaborator(e.to_string()),
        }
    }
}

impl From<ReconcileError> for ScrapeError {
    fn from(e: ReconcileError) -> Self {
        ScrapeError::Persistence(e.to_string())
    }
}

impl From<SourceError> for ScrapeError {
    fn from(e: SourceError) -> Self {
        ScrapeError::SourceUnavailable(e.to_string())
    }
}

/// Per-source values threaded through every item task of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeContext {
    pub run_id: String,
    pub source: String,
    pub kind: ContentKind,
    /// Language recorded on movie torrents.
    pub language: String,
}

/// What one source contributed to a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceReport {
    pub source: String,
    /// Listings fetched across all pages.
    pub listings: usize,
    /// Listings no title pattern matched.
    pub parse_misses: usize,
    /// Candidates after deduplication.
    pub items: usize,
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub not_found: usize,
    pub failed: usize,
    /// The source was abandoned before any item was processed.
    pub aborted: bool,
}

impl SourceReport {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            ..Default::default()
        }
    }

    /// Count one item result.
    pub fn record(&mut self, result: &Result<ReconcileOutcome, ScrapeError>) {
        match result {
            Ok(ReconcileOutcome::Created) => self.created += 1,
            Ok(ReconcileOutcome::Updated) => self.updated += 1,
            Ok(ReconcileOutcome::Unchanged) => self.unchanged += 1,
            Err(ScrapeError::NotFound(_)) => self.not_found += 1,
            Err(_) => self.failed += 1,
        }
    }

    /// Items whose record is now stored (created, updated or already current).
    pub fn persisted(&self) -> usize {
        self.created + self.updated + self.unchanged
    }
}

/// Summary of one run over all sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub sources: Vec<SourceReport>,
    /// The run stopped early at a source boundary.
    pub cancelled: bool,
}

impl RunReport {
    pub fn source(&self, name: &str) -> Option<&SourceReport> {
        self.sources.iter().find(|s| s.source == name)
    }
}

/// Current status of the orchestrator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrchestratorStatus {
    /// Whether the scheduled loop is running.
    pub running: bool,
    /// Whether a run is in progress right now.
    pub scraping: bool,
    pub sources: usize,
    pub last_run: Option<RunReport>,
}
