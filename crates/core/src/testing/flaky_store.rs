//! Content store wrapper that can be told to fail writes.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::content::Content;
use crate::store::{ContentStore, StoreError};

/// Wraps a real store and fails `upsert` on demand.
///
/// Reads always go through, so a test can check what a failed write left
/// behind.
pub struct FlakyStore<S> {
    inner: S,
    fail_upserts: AtomicBool,
    upserts: AtomicUsize,
}

impl<S: ContentStore> FlakyStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            fail_upserts: AtomicBool::new(false),
            upserts: AtomicUsize::new(0),
        }
    }

    pub fn fail_upserts(&self, fail: bool) {
        self.fail_upserts.store(fail, Ordering::SeqCst);
    }

    /// Upserts attempted, failed ones included.
    pub fn upsert_count(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }
}

impl<S: ContentStore> ContentStore for FlakyStore<S> {
    fn find_by_id(&self, id: &str) -> Result<Option<Content>, StoreError> {
        self.inner.find_by_id(id)
    }

    fn upsert(&self, id: &str, content: &Content) -> Result<Content, StoreError> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        if self.fail_upserts.load(Ordering::SeqCst) {
            return Err(StoreError::Database("injected write failure".to_string()));
        }
        self.inner.upsert(id, content)
    }

    fn distinct_seasons(&self, id: &str) -> Result<Vec<u32>, StoreError> {
        self.inner.distinct_seasons(id)
    }

    fn count(&self) -> Result<u64, StoreError> {
        self.inner.count()
    }
}
