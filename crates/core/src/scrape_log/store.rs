use thiserror::Error;

use super::ScrapeLogEntry;

#[derive(Debug, Error)]
pub enum ScrapeLogError {
    #[error("Database error: {0}")]
    Database(String),
}

/// Filter for querying the log
#[derive(Debug, Clone, Default)]
pub struct ScrapeLogFilter {
    pub run_id: Option<String>,
    pub source: Option<String>,
    pub kind: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

impl ScrapeLogFilter {
    pub fn new() -> Self {
        Self {
            limit: 100,
            offset: 0,
            ..Default::default()
        }
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }
}

/// Storage of logged failures. Entries are only ever appended.
pub trait ScrapeLogStore: Send + Sync {
    /// Append an entry, returns the assigned ID
    fn insert(&self, entry: &ScrapeLogEntry) -> Result<i64, ScrapeLogError>;

    /// Newest first.
    fn query(&self, filter: &ScrapeLogFilter) -> Result<Vec<ScrapeLogEntry>, ScrapeLogError>;

    fn count(&self, filter: &ScrapeLogFilter) -> Result<i64, ScrapeLogError>;
}
