//! Mock torrent source for testing.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::content::ContentKind;
use crate::source::{Listing, SourceError, SourcePage, SourceQuery, TorrentSource};

/// How the mock misbehaves.
#[derive(Debug, Clone)]
enum Failure {
    /// Every request fails.
    Always(SourceError),
    /// The next `n` requests fail.
    Times(u32, SourceError),
    /// Requests for this page fail.
    OnPage(u32, SourceError),
}

/// Mock implementation of the TorrentSource trait.
///
/// Serves a fixed list of pages, records which pages were requested, and can
/// be told to fail or stall.
///
/// # Example
///
/// ```rust,ignore
/// use scrapeyard_core::testing::{fixtures, MockSource};
///
/// let source = MockSource::new("eztv", ContentKind::Show)
///     .with_pages(vec![vec![fixtures::listing("Show.Name.S01E02.720p-GRP", 10)]]);
///
/// let listings = collect_listings(&source, &source.base_query(), &retry).await?;
/// assert_eq!(source.recorded_pages().await, vec![1]);
/// ```
#[derive(Debug, Clone)]
pub struct MockSource {
    name: String,
    kind: ContentKind,
    language: String,
    pages: Arc<RwLock<Vec<Vec<Listing>>>>,
    failure: Arc<RwLock<Option<Failure>>>,
    delay: Option<Duration>,
    requested: Arc<RwLock<Vec<u32>>>,
}

impl MockSource {
    /// Create a mock source with no listings.
    pub fn new(name: &str, kind: ContentKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            language: "en".to_string(),
            pages: Arc::new(RwLock::new(Vec::new())),
            failure: Arc::new(RwLock::new(None)),
            delay: None,
            requested: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn with_language(mut self, language: &str) -> Self {
        self.language = language.to_string();
        self
    }

    /// Serve these pages, first entry being page 1.
    pub fn with_pages(mut self, pages: Vec<Vec<Listing>>) -> Self {
        self.pages = Arc::new(RwLock::new(pages));
        self
    }

    /// Fail every request.
    pub fn failing_with(mut self, error: SourceError) -> Self {
        self.failure = Arc::new(RwLock::new(Some(Failure::Always(error))));
        self
    }

    /// Fail the next `times` requests, then serve normally.
    pub fn failing_times(mut self, times: u32, error: SourceError) -> Self {
        self.failure = Arc::new(RwLock::new(Some(Failure::Times(times, error))));
        self
    }

    /// Fail every request for `page`.
    pub fn failing_on_page(mut self, page: u32, error: SourceError) -> Self {
        self.failure = Arc::new(RwLock::new(Some(Failure::OnPage(page, error))));
        self
    }

    /// Sleep before answering, to trip request timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Replace the served pages.
    pub async fn set_pages(&self, pages: Vec<Vec<Listing>>) {
        *self.pages.write().await = pages;
    }

    /// Stop failing.
    pub async fn clear_failure(&self) {
        *self.failure.write().await = None;
    }

    /// Page numbers requested so far, in request order.
    pub async fn recorded_pages(&self) -> Vec<u32> {
        self.requested.read().await.clone()
    }

    pub async fn search_count(&self) -> usize {
        self.requested.read().await.len()
    }

    async fn take_error(&self, page: u32) -> Option<SourceError> {
        let mut failure = self.failure.write().await;
        match failure.as_mut() {
            Some(Failure::Always(e)) => Some(e.clone()),
            Some(Failure::OnPage(p, e)) if *p == page => Some(e.clone()),
            Some(Failure::Times(n, e)) if *n > 0 => {
                *n -= 1;
                Some(e.clone())
            }
            _ => None,
        }
    }
}

#[async_trait]
impl TorrentSource for MockSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ContentKind {
        self.kind
    }

    fn language(&self) -> &str {
        &self.language
    }

    async fn search(&self, query: &SourceQuery) -> Result<SourcePage, SourceError> {
        self.requested.write().await.push(query.page);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(err) = self.take_error(query.page).await {
            return Err(err);
        }

        let pages = self.pages.read().await;
        let index = query.page.max(1) as usize - 1;
        Ok(SourcePage {
            results: pages.get(index).cloned().unwrap_or_default(),
            total_pages: pages.len().max(1) as u32,
        })
    }
}
