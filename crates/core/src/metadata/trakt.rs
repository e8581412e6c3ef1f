//! Trakt catalog client.
//!
//! Every request carries the `trakt-api-key` (client id) and
//! `trakt-api-version` headers. Slugs are Trakt slugs.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::{CatalogEpisode, CatalogMovie, CatalogShow, MetadataError, MetadataProvider};
use crate::config::TraktConfig;
use crate::content::{CatalogIds, ContentKind};

/// Trakt API client.
pub struct TraktClient {
    client: Client,
    base_url: String,
}

impl TraktClient {
    pub fn new(config: &TraktConfig, timeout: Duration) -> Result<Self, MetadataError> {
        if config.client_id.is_empty() {
            return Err(MetadataError::NotConfigured(
                "Trakt client id is required".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("trakt-api-version", HeaderValue::from_static("2"));
        headers.insert(
            "trakt-api-key",
            HeaderValue::from_str(&config.client_id)
                .map_err(|e| MetadataError::NotConfigured(e.to_string()))?,
        );

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| MetadataError::NotConfigured(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, MetadataError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "Trakt request");

        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(MetadataError::NotFound(path.to_string()));
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(MetadataError::RateLimitExceeded);
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(MetadataError::NotConfigured(
                "Invalid Trakt client id".to_string(),
            ));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MetadataError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| MetadataError::Parse(format!("{}: {}", path, e)))
    }
}

#[async_trait]
impl MetadataProvider for TraktClient {
    async fn show(&self, slug: &str) -> Result<CatalogShow, MetadataError> {
        let show: TraktShow = self
            .get_json(&format!("/shows/{}?extended=full", urlencoding::encode(slug)))
            .await?;
        Ok(show.into())
    }

    async fn movie(&self, slug: &str) -> Result<CatalogMovie, MetadataError> {
        let movie: TraktMovie = self
            .get_json(&format!("/movies/{}?extended=full", urlencoding::encode(slug)))
            .await?;
        Ok(movie.into())
    }

    async fn season(&self, slug: &str, season: u32) -> Result<Vec<CatalogEpisode>, MetadataError> {
        let episodes: Vec<TraktEpisode> = self
            .get_json(&format!(
                "/shows/{}/seasons/{}?extended=full",
                urlencoding::encode(slug),
                season
            ))
            .await?;
        Ok(episodes.into_iter().map(Into::into).collect())
    }

    async fn all_episodes(&self, slug: &str) -> Result<Vec<CatalogEpisode>, MetadataError> {
        let seasons: Vec<TraktSeason> = self
            .get_json(&format!(
                "/shows/{}/seasons?extended=episodes,full",
                urlencoding::encode(slug)
            ))
            .await?;
        Ok(flatten_seasons(seasons))
    }

    async fn watcher_count(&self, kind: ContentKind, slug: &str) -> Result<u64, MetadataError> {
        let collection = if kind.is_episodic() { "shows" } else { "movies" };
        let watchers: Vec<serde_json::Value> = self
            .get_json(&format!(
                "/{}/{}/watching",
                collection,
                urlencoding::encode(slug)
            ))
            .await?;
        Ok(watchers.len() as u64)
    }
}

fn flatten_seasons(seasons: Vec<TraktSeason>) -> Vec<CatalogEpisode> {
    seasons
        .into_iter()
        .flat_map(|s| s.episodes.unwrap_or_default())
        .map(Into::into)
        .collect()
}

// Trakt API response types

#[derive(Debug, Deserialize)]
struct TraktIds {
    #[serde(default)]
    trakt: Option<u64>,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    imdb: Option<String>,
    #[serde(default)]
    tmdb: Option<u64>,
    #[serde(default)]
    tvdb: Option<u64>,
}

impl From<TraktIds> for CatalogIds {
    fn from(ids: TraktIds) -> Self {
        CatalogIds {
            imdb: ids.imdb.filter(|i| !i.is_empty()),
            tmdb: ids.tmdb,
            tvdb: ids.tvdb,
            trakt: ids.trakt,
            slug: ids.slug.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TraktAirs {
    #[serde(default)]
    day: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TraktShow {
    title: Option<String>,
    year: Option<u32>,
    ids: TraktIds,
    #[serde(default)]
    overview: Option<String>,
    #[serde(default)]
    runtime: Option<u32>,
    #[serde(default)]
    rating: Option<f32>,
    #[serde(default)]
    votes: Option<u64>,
    #[serde(default)]
    genres: Vec<String>,
    #[serde(default)]
    airs: Option<TraktAirs>,
    #[serde(default)]
    network: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

impl From<TraktShow> for CatalogShow {
    fn from(show: TraktShow) -> Self {
        CatalogShow {
            ids: show.ids.into(),
            title: show.title.unwrap_or_default(),
            year: show.year,
            overview: show.overview.unwrap_or_default(),
            runtime: show.runtime,
            rating: show.rating.unwrap_or(0.0),
            votes: show.votes.unwrap_or(0),
            genres: show.genres,
            air_day: show.airs.and_then(|a| a.day),
            network: show.network,
            status: show.status,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TraktMovie {
    title: Option<String>,
    year: Option<u32>,
    ids: TraktIds,
    #[serde(default)]
    overview: Option<String>,
    #[serde(default)]
    runtime: Option<u32>,
    #[serde(default)]
    rating: Option<f32>,
    #[serde(default)]
    votes: Option<u64>,
    #[serde(default)]
    genres: Vec<String>,
    #[serde(default)]
    released: Option<String>,
    #[serde(default)]
    certification: Option<String>,
    #[serde(default)]
    trailer: Option<String>,
}

impl From<TraktMovie> for CatalogMovie {
    fn from(movie: TraktMovie) -> Self {
        CatalogMovie {
            ids: movie.ids.into(),
            title: movie.title.unwrap_or_default(),
            year: movie.year,
            overview: movie.overview.unwrap_or_default(),
            runtime: movie.runtime,
            rating: movie.rating.unwrap_or(0.0),
            votes: movie.votes.unwrap_or(0),
            genres: movie.genres,
            released: movie.released,
            certification: movie.certification,
            trailer: movie.trailer,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TraktEpisodeIds {
    #[serde(default)]
    tvdb: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TraktEpisode {
    season: u32,
    number: u32,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    overview: Option<String>,
    #[serde(default)]
    first_aired: Option<DateTime<Utc>>,
    #[serde(default)]
    ids: Option<TraktEpisodeIds>,
}

impl From<TraktEpisode> for CatalogEpisode {
    fn from(episode: TraktEpisode) -> Self {
        CatalogEpisode {
            season: episode.season,
            number: episode.number,
            title: episode
                .title
                .unwrap_or_else(|| format!("Episode {}", episode.number)),
            overview: episode.overview.unwrap_or_default(),
            first_aired: episode.first_aired,
            tvdb_id: episode.ids.and_then(|i| i.tvdb),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TraktSeason {
    #[allow(dead_code)]
    number: u32,
    #[serde(default)]
    episodes: Option<Vec<TraktEpisode>>,
}
