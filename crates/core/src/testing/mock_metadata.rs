//! Mock catalog and artwork providers for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::content::{CatalogIds, ContentKind, Images};
use crate::metadata::{
    CatalogEpisode, CatalogMovie, CatalogShow, ImageProvider, MetadataError, MetadataProvider,
};

/// A recorded catalog call for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedMetadataCall {
    Show(String),
    Movie(String),
    Season(String, u32),
    AllEpisodes(String),
    Watchers(ContentKind, String),
}

/// Mock implementation of the MetadataProvider trait.
///
/// Unknown slugs and seasons answer `NotFound`, as the real catalog does.
/// Clones share state, so a test can keep one to configure or inspect the
/// mock after handing another to the code under test.
///
/// # Example
///
/// ```rust,ignore
/// use scrapeyard_core::testing::{fixtures, MockMetadata};
///
/// let metadata = MockMetadata::new();
/// metadata.add_show(fixtures::catalog_show("show-name", "tt0000001")).await;
/// metadata.set_season("show-name", 1, fixtures::catalog_season(1, 10)).await;
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockMetadata {
    shows: Arc<RwLock<HashMap<String, CatalogShow>>>,
    movies: Arc<RwLock<HashMap<String, CatalogMovie>>>,
    seasons: Arc<RwLock<HashMap<(String, u32), Result<Vec<CatalogEpisode>, MetadataError>>>>,
    all_episodes: Arc<RwLock<HashMap<String, Vec<CatalogEpisode>>>>,
    watchers: Arc<RwLock<HashMap<String, u64>>>,
    /// Summary lookups for these slugs fail with the given error.
    failing: Arc<RwLock<HashMap<String, MetadataError>>>,
    delay: Option<Duration>,
    calls: Arc<RwLock<Vec<RecordedMetadataCall>>>,
}

impl MockMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep before answering summary lookups, to trip request timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub async fn add_show(&self, show: CatalogShow) {
        self.shows.write().await.insert(show.ids.slug.clone(), show);
    }

    pub async fn add_movie(&self, movie: CatalogMovie) {
        self.movies.write().await.insert(movie.ids.slug.clone(), movie);
    }

    pub async fn set_season(&self, slug: &str, season: u32, episodes: Vec<CatalogEpisode>) {
        self.seasons
            .write()
            .await
            .insert((slug.to_string(), season), Ok(episodes));
    }

    pub async fn fail_season(&self, slug: &str, season: u32, error: MetadataError) {
        self.seasons
            .write()
            .await
            .insert((slug.to_string(), season), Err(error));
    }

    pub async fn set_all_episodes(&self, slug: &str, episodes: Vec<CatalogEpisode>) {
        self.all_episodes
            .write()
            .await
            .insert(slug.to_string(), episodes);
    }

    pub async fn set_watchers(&self, slug: &str, count: u64) {
        self.watchers.write().await.insert(slug.to_string(), count);
    }

    /// Make show and movie lookups for `slug` fail.
    pub async fn fail_lookup(&self, slug: &str, error: MetadataError) {
        self.failing.write().await.insert(slug.to_string(), error);
    }

    pub async fn clear_failures(&self) {
        self.failing.write().await.clear();
    }

    /// All calls made so far, in order.
    pub async fn recorded_calls(&self) -> Vec<RecordedMetadataCall> {
        self.calls.read().await.clone()
    }

    async fn record(&self, call: RecordedMetadataCall) {
        self.calls.write().await.push(call);
    }

    async fn summary_failure(&self, slug: &str) -> Option<MetadataError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.failing.read().await.get(slug).cloned()
    }
}

#[async_trait]
impl MetadataProvider for MockMetadata {
    async fn show(&self, slug: &str) -> Result<CatalogShow, MetadataError> {
        self.record(RecordedMetadataCall::Show(slug.to_string())).await;
        if let Some(err) = self.summary_failure(slug).await {
            return Err(err);
        }
        self.shows
            .read()
            .await
            .get(slug)
            .cloned()
            .ok_or_else(|| MetadataError::NotFound(slug.to_string()))
    }

    async fn movie(&self, slug: &str) -> Result<CatalogMovie, MetadataError> {
        self.record(RecordedMetadataCall::Movie(slug.to_string())).await;
        if let Some(err) = self.summary_failure(slug).await {
            return Err(err);
        }
        self.movies
            .read()
            .await
            .get(slug)
            .cloned()
            .ok_or_else(|| MetadataError::NotFound(slug.to_string()))
    }

    async fn season(&self, slug: &str, season: u32) -> Result<Vec<CatalogEpisode>, MetadataError> {
        self.record(RecordedMetadataCall::Season(slug.to_string(), season))
            .await;
        self.seasons
            .read()
            .await
            .get(&(slug.to_string(), season))
            .cloned()
            .unwrap_or_else(|| Err(MetadataError::NotFound(format!("{} season {}", slug, season))))
    }

    async fn all_episodes(&self, slug: &str) -> Result<Vec<CatalogEpisode>, MetadataError> {
        self.record(RecordedMetadataCall::AllEpisodes(slug.to_string()))
            .await;
        self.all_episodes
            .read()
            .await
            .get(slug)
            .cloned()
            .ok_or_else(|| MetadataError::NotFound(slug.to_string()))
    }

    async fn watcher_count(&self, kind: ContentKind, slug: &str) -> Result<u64, MetadataError> {
        self.record(RecordedMetadataCall::Watchers(kind, slug.to_string()))
            .await;
        self.watchers
            .read()
            .await
            .get(slug)
            .copied()
            .ok_or_else(|| MetadataError::NotFound(slug.to_string()))
    }
}

/// Mock implementation of the ImageProvider trait.
///
/// Answers every lookup with the same images (all empty by default).
#[derive(Debug, Clone)]
pub struct MockImages {
    name: String,
    images: Images,
    failure: Option<MetadataError>,
    calls: Arc<RwLock<usize>>,
}

impl MockImages {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            images: Images {
                banner: String::new(),
                fanart: String::new(),
                poster: String::new(),
            },
            failure: None,
            calls: Arc::new(RwLock::new(0)),
        }
    }

    pub fn with_images(mut self, images: Images) -> Self {
        self.images = images;
        self
    }

    pub fn failing_with(mut self, error: MetadataError) -> Self {
        self.failure = Some(error);
        self
    }

    pub async fn call_count(&self) -> usize {
        *self.calls.read().await
    }
}

#[async_trait]
impl ImageProvider for MockImages {
    fn name(&self) -> &str {
        &self.name
    }

    async fn images(&self, _kind: ContentKind, _ids: &CatalogIds) -> Result<Images, MetadataError> {
        *self.calls.write().await += 1;
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(self.images.clone()),
        }
    }
}
