//! Persistence of canonical content.
//!
//! The store is the single shared mutable resource of a scrape. Writers go
//! through [`KeyedLocks`] so one content id has one writer at a time.

mod locks;
mod sqlite;
mod status;

pub use locks::KeyedLocks;
pub use sqlite::SqliteContentStore;
pub use status::{SharedStatus, StatusSink, StatusSnapshot, STATUS_IDLE};

use thiserror::Error;

use crate::content::Content;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Failed to encode or decode content: {0}")]
    Serialization(String),

    #[error("Content id mismatch: stored under {expected}, record says {actual}")]
    IdMismatch { expected: String, actual: String },
}

/// Storage of canonical content keyed by catalog id.
pub trait ContentStore: Send + Sync {
    /// Get a record by id.
    fn find_by_id(&self, id: &str) -> Result<Option<Content>, StoreError>;

    /// Insert or replace a record. Either the whole record is written or
    /// nothing is.
    fn upsert(&self, id: &str, content: &Content) -> Result<Content, StoreError>;

    /// Distinct season numbers stored for a show, ascending.
    fn distinct_seasons(&self, id: &str) -> Result<Vec<u32>, StoreError>;

    /// Number of stored records.
    fn count(&self) -> Result<u64, StoreError>;
}
