//! The read-merge-write critical section for one content id.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use super::{reconcile_movie, reconcile_show, ReconcileOutcome};
use crate::content::Content;
use crate::store::{ContentStore, KeyedLocks, StoreError};

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Content {id} is stored as a {stored} but was scraped as a {scraped}")]
    KindMismatch {
        id: String,
        stored: &'static str,
        scraped: &'static str,
    },
}

/// Commits merged records, one writer per content id.
pub struct Reconciler {
    store: Arc<dyn ContentStore>,
    locks: KeyedLocks,
    placeholder: String,
}

impl Reconciler {
    pub fn new(store: Arc<dyn ContentStore>, placeholder: &str) -> Self {
        Self {
            store,
            locks: KeyedLocks::new(),
            placeholder: placeholder.to_string(),
        }
    }

    pub fn store(&self) -> &Arc<dyn ContentStore> {
        &self.store
    }

    /// Merge `candidate` into whatever is stored under its id and write the
    /// result. Nothing is written when the merge changes nothing, and a
    /// failed write leaves the stored record as it was.
    pub async fn commit(&self, candidate: Content) -> Result<ReconcileOutcome, ReconcileError> {
        let id = candidate.id().to_string();
        let _guard = self.locks.lock(&id).await;

        let existing = self.store.find_by_id(&id)?;
        let (merged, outcome) = match (existing, candidate) {
            (None, Content::Show(show)) => {
                let (show, outcome) = reconcile_show(None, show, &self.placeholder);
                (Content::Show(show), outcome)
            }
            (None, Content::Movie(movie)) => {
                let (movie, outcome) = reconcile_movie(None, movie, &self.placeholder);
                (Content::Movie(movie), outcome)
            }
            (Some(Content::Show(stored)), Content::Show(show)) => {
                let (show, outcome) = reconcile_show(Some(&stored), show, &self.placeholder);
                (Content::Show(show), outcome)
            }
            (Some(Content::Movie(stored)), Content::Movie(movie)) => {
                let (movie, outcome) = reconcile_movie(Some(&stored), movie, &self.placeholder);
                (Content::Movie(movie), outcome)
            }
            (Some(stored), scraped) => {
                return Err(ReconcileError::KindMismatch {
                    id,
                    stored: stored.kind().as_str(),
                    scraped: scraped.kind().as_str(),
                });
            }
        };

        if outcome != ReconcileOutcome::Unchanged {
            self.store.upsert(&id, &merged)?;
        }
        debug!(id = %id, outcome = outcome.as_str(), "Reconciled");
        Ok(outcome)
    }
}
