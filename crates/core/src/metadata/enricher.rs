//! Turning candidates into canonical records.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use super::{rating_percentage, ImageResolver, MetadataError, MetadataProvider};
use crate::batch::{MovieCandidate, ShowCandidate};
use crate::content::{CatalogIds, ContentInfo, ContentKind, Movie, Rating, Show};
use crate::retry::RetryPolicy;

/// Resolves candidate slugs against the catalog and attaches ratings and
/// artwork.
pub struct Enricher {
    catalog: Arc<dyn MetadataProvider>,
    images: ImageResolver,
    retry: RetryPolicy,
}

impl Enricher {
    pub fn new(catalog: Arc<dyn MetadataProvider>, images: ImageResolver, retry: RetryPolicy) -> Self {
        Self {
            catalog,
            images,
            retry,
        }
    }

    pub fn catalog(&self) -> &dyn MetadataProvider {
        self.catalog.as_ref()
    }

    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Image path used when no provider has artwork.
    pub fn placeholder(&self) -> &str {
        self.images.placeholder()
    }

    /// Resolve a show candidate. The returned show has no episodes yet.
    pub async fn enrich_show(
        &self,
        candidate: &ShowCandidate,
        kind: ContentKind,
    ) -> Result<Show, MetadataError> {
        let slug = candidate.slug.as_str();
        let summary = self
            .retry
            .run("show summary", || self.catalog.show(slug))
            .await?;
        let id = primary_id(&summary.ids, slug)?;

        let watching = self.watchers(kind, slug).await;
        let images = self.images.resolve(kind, &summary.ids).await;

        Ok(Show {
            info: ContentInfo {
                id,
                slug: catalog_slug(&summary.ids, slug),
                ids: summary.ids,
                title: non_empty_or(summary.title, &candidate.title),
                year: summary.year,
                synopsis: summary.overview,
                runtime: summary.runtime,
                rating: Rating {
                    votes: summary.votes,
                    watching,
                    percentage: rating_percentage(summary.rating),
                },
                images,
                genres: summary.genres,
                kind,
                last_updated: Utc::now(),
            },
            air_day: summary.air_day,
            network: summary.network,
            status: summary.status,
            num_seasons: 0,
            latest_episode_air_time: None,
            episodes: Vec::new(),
        })
    }

    /// Resolve a movie candidate, carrying its torrents over.
    pub async fn enrich_movie(&self, candidate: &MovieCandidate) -> Result<Movie, MetadataError> {
        let slug = candidate.slug.as_str();
        let summary = self
            .retry
            .run("movie summary", || self.catalog.movie(slug))
            .await?;
        let id = primary_id(&summary.ids, slug)?;

        let watching = self.watchers(ContentKind::Movie, slug).await;
        let images = self.images.resolve(ContentKind::Movie, &summary.ids).await;

        Ok(Movie {
            info: ContentInfo {
                id,
                slug: catalog_slug(&summary.ids, slug),
                ids: summary.ids,
                title: non_empty_or(summary.title, &candidate.title),
                year: summary.year.or(candidate.year),
                synopsis: summary.overview,
                runtime: summary.runtime,
                rating: Rating {
                    votes: summary.votes,
                    watching,
                    percentage: rating_percentage(summary.rating),
                },
                images,
                genres: summary.genres,
                kind: ContentKind::Movie,
                last_updated: Utc::now(),
            },
            released: summary.released,
            certification: summary.certification,
            trailer: summary.trailer,
            torrents: candidate.torrents.clone(),
        })
    }

    /// Watcher counts are cosmetic; a failed lookup counts as zero.
    async fn watchers(&self, kind: ContentKind, slug: &str) -> u64 {
        match self
            .retry
            .run("watcher count", || self.catalog.watcher_count(kind, slug))
            .await
        {
            Ok(count) => count,
            Err(e) => {
                debug!(slug = slug, error = %e, "Watcher count unavailable");
                0
            }
        }
    }
}

/// Content without a resolvable primary id is never persisted.
fn primary_id(ids: &CatalogIds, slug: &str) -> Result<String, MetadataError> {
    ids.primary()
        .ok_or_else(|| MetadataError::NotFound(format!("{}: no catalog id", slug)))
}

fn catalog_slug(ids: &CatalogIds, fallback: &str) -> String {
    if ids.slug.is_empty() {
        fallback.to_string()
    } else {
        ids.slug.clone()
    }
}

fn non_empty_or(value: String, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::CandidateEpisodes;
    use crate::content::{Images, Quality, TorrentRef};
    use crate::testing::{fixtures, MockImages, MockMetadata};
    use std::collections::BTreeMap;
    use std::time::Duration;

    const PLACEHOLDER: &str = "images/posterholder.png";

    fn enricher(metadata: MockMetadata, images: MockImages) -> Enricher {
        let retry = RetryPolicy::once(Duration::from_millis(200));
        Enricher::new(
            Arc::new(metadata),
            ImageResolver::new(vec![Arc::new(images)], PLACEHOLDER, retry),
            retry,
        )
    }

    fn show_candidate(slug: &str) -> ShowCandidate {
        ShowCandidate {
            title: "Show Name".to_string(),
            slug: slug.to_string(),
            episodes: CandidateEpisodes::Seasonal {
                seasons: BTreeMap::new(),
            },
        }
    }

    #[tokio::test]
    async fn test_enrich_show() {
        let metadata = MockMetadata::new();
        metadata
            .add_show(fixtures::catalog_show("show-name", "tt0000001"))
            .await;
        metadata.set_watchers("show-name", 12).await;
        let images = MockImages::new("tmdb").with_images(Images {
            banner: "b".into(),
            fanart: "f".into(),
            poster: "p".into(),
        });

        let show = enricher(metadata, images)
            .enrich_show(&show_candidate("show-name"), ContentKind::Show)
            .await
            .unwrap();

        assert_eq!(show.info.id, "tt0000001");
        assert_eq!(show.info.slug, "show-name");
        assert_eq!(show.info.rating.watching, 12);
        assert_eq!(show.info.rating.percentage, 84);
        assert_eq!(show.info.images.poster, "p");
        assert!(show.episodes.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_slug_is_not_found() {
        let result = enricher(MockMetadata::new(), MockImages::new("tmdb"))
            .enrich_show(&show_candidate("nope"), ContentKind::Show)
            .await;
        assert!(matches!(result, Err(MetadataError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_missing_catalog_id_is_not_found() {
        let metadata = MockMetadata::new();
        let mut show = fixtures::catalog_show("no-ids", "");
        show.ids.tvdb = None;
        metadata.add_show(show).await;

        let result = enricher(metadata, MockImages::new("tmdb"))
            .enrich_show(&show_candidate("no-ids"), ContentKind::Show)
            .await;
        assert!(matches!(result, Err(MetadataError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_watcher_failure_degrades_to_zero() {
        let metadata = MockMetadata::new();
        metadata
            .add_show(fixtures::catalog_show("show-name", "tt0000001"))
            .await;
        let show = enricher(metadata, MockImages::new("tmdb"))
            .enrich_show(&show_candidate("show-name"), ContentKind::Anime)
            .await
            .unwrap();
        assert_eq!(show.info.rating.watching, 0);
        assert_eq!(show.info.kind, ContentKind::Anime);
        assert_eq!(show.info.images, Images::placeholder(PLACEHOLDER));
    }

    #[tokio::test]
    async fn test_enrich_movie_keeps_torrents() {
        let metadata = MockMetadata::new();
        metadata
            .add_movie(fixtures::catalog_movie("inception-2010", "tt1375666"))
            .await;

        let mut slots = BTreeMap::new();
        slots.insert(
            Quality::P1080,
            TorrentRef::new("magnet:a", 10, 1, "yts", "Inception (2010) [1080p]"),
        );
        let candidate = MovieCandidate {
            title: "Inception".to_string(),
            slug: "inception-2010".to_string(),
            year: Some(2010),
            torrents: [("en".to_string(), slots)].into_iter().collect(),
        };

        let movie = enricher(metadata, MockImages::new("tmdb"))
            .enrich_movie(&candidate)
            .await
            .unwrap();
        assert_eq!(movie.info.id, "tt1375666");
        assert_eq!(movie.info.kind, ContentKind::Movie);
        assert_eq!(movie.torrents["en"][&Quality::P1080].locator, "magnet:a");
    }
}
