//! Artwork lookup across providers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::MetadataError;
use crate::config::{FanartConfig, TmdbConfig};
use crate::content::{CatalogIds, ContentKind, Images};
use crate::retry::RetryPolicy;

/// A service that knows artwork for catalog ids.
///
/// Missing images are returned as empty strings.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn images(&self, kind: ContentKind, ids: &CatalogIds) -> Result<Images, MetadataError>;
}

/// Tries providers in order, filling whichever images are still missing,
/// and substitutes the placeholder for what nobody has.
pub struct ImageResolver {
    providers: Vec<Arc<dyn ImageProvider>>,
    placeholder: String,
    retry: RetryPolicy,
}

impl ImageResolver {
    pub fn new(providers: Vec<Arc<dyn ImageProvider>>, placeholder: &str, retry: RetryPolicy) -> Self {
        Self {
            providers,
            placeholder: placeholder.to_string(),
            retry,
        }
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Never fails; worst case every image is the placeholder.
    pub async fn resolve(&self, kind: ContentKind, ids: &CatalogIds) -> Images {
        let mut found = Images {
            banner: String::new(),
            fanart: String::new(),
            poster: String::new(),
        };

        for provider in &self.providers {
            if is_complete(&found) {
                break;
            }
            match self
                .retry
                .run(provider.name(), || provider.images(kind, ids))
                .await
            {
                Ok(images) => fill_missing(&mut found, images),
                Err(e) => {
                    debug!(provider = provider.name(), slug = %ids.slug, error = %e, "Image lookup failed");
                }
            }
        }

        for image in [&mut found.banner, &mut found.fanart, &mut found.poster] {
            if image.is_empty() {
                *image = self.placeholder.clone();
            }
        }
        found
    }
}

fn is_complete(images: &Images) -> bool {
    !images.banner.is_empty() && !images.fanart.is_empty() && !images.poster.is_empty()
}

fn fill_missing(found: &mut Images, images: Images) {
    if found.banner.is_empty() {
        found.banner = images.banner;
    }
    if found.fanart.is_empty() {
        found.fanart = images.fanart;
    }
    if found.poster.is_empty() {
        found.poster = images.poster;
    }
}

async fn get_json<T: DeserializeOwned>(client: &Client, url: &str) -> Result<T, MetadataError> {
    let response = client.get(url).send().await?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(MetadataError::NotFound(url.to_string()));
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(MetadataError::RateLimitExceeded);
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
        .map_err(|e| MetadataError::Parse(e.to_string()))
}

fn build_client(timeout: Duration) -> Result<Client, MetadataError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| MetadataError::NotConfigured(e.to_string()))
}

/// TMDB images. TMDB has no banners; backdrops serve as both banner and
/// fanart.
pub struct TmdbImages {
    client: Client,
    config: TmdbConfig,
}

impl TmdbImages {
    pub fn new(config: TmdbConfig, timeout: Duration) -> Result<Self, MetadataError> {
        if config.api_key.is_empty() {
            return Err(MetadataError::NotConfigured(
                "TMDB API key is required".to_string(),
            ));
        }
        Ok(Self {
            client: build_client(timeout)?,
            config,
        })
    }

    fn full_path(&self, path: &str) -> String {
        format!("{}{}", self.config.image_base.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl ImageProvider for TmdbImages {
    fn name(&self) -> &str {
        "tmdb"
    }

    async fn images(&self, kind: ContentKind, ids: &CatalogIds) -> Result<Images, MetadataError> {
        let tmdb = ids
            .tmdb
            .ok_or_else(|| MetadataError::NotFound(format!("{}: no tmdb id", ids.slug)))?;
        let collection = if kind.is_episodic() { "tv" } else { "movie" };
        let url = format!(
            "{}/{}/{}/images?api_key={}",
            self.config.url.trim_end_matches('/'),
            collection,
            tmdb,
            urlencoding::encode(&self.config.api_key)
        );

        let body: TmdbImagesResponse = get_json(&self.client, &url).await?;
        Ok(body.into_images(|p| self.full_path(p)))
    }
}

#[derive(Debug, Deserialize)]
struct TmdbImage {
    file_path: String,
}

#[derive(Debug, Deserialize)]
struct TmdbImagesResponse {
    #[serde(default)]
    backdrops: Vec<TmdbImage>,
    #[serde(default)]
    posters: Vec<TmdbImage>,
}

impl TmdbImagesResponse {
    fn into_images(self, full_path: impl Fn(&str) -> String) -> Images {
        let backdrop = self
            .backdrops
            .first()
            .map(|i| full_path(&i.file_path))
            .unwrap_or_default();
        Images {
            banner: backdrop.clone(),
            fanart: backdrop,
            poster: self
                .posters
                .first()
                .map(|i| full_path(&i.file_path))
                .unwrap_or_default(),
        }
    }
}

/// fanart.tv images. Shows are looked up by TVDB id, movies by TMDB (or
/// IMDB) id.
pub struct FanartImages {
    client: Client,
    config: FanartConfig,
}

impl FanartImages {
    pub fn new(config: FanartConfig, timeout: Duration) -> Result<Self, MetadataError> {
        if config.api_key.is_empty() {
            return Err(MetadataError::NotConfigured(
                "fanart.tv API key is required".to_string(),
            ));
        }
        Ok(Self {
            client: build_client(timeout)?,
            config,
        })
    }
}

#[async_trait]
impl ImageProvider for FanartImages {
    fn name(&self) -> &str {
        "fanart"
    }

    async fn images(&self, kind: ContentKind, ids: &CatalogIds) -> Result<Images, MetadataError> {
        let base = self.config.url.trim_end_matches('/');
        let key = urlencoding::encode(&self.config.api_key);

        if kind.is_episodic() {
            let tvdb = ids
                .tvdb
                .ok_or_else(|| MetadataError::NotFound(format!("{}: no tvdb id", ids.slug)))?;
            let url = format!("{}/tv/{}?api_key={}", base, tvdb, key);
            let body: FanartShow = get_json(&self.client, &url).await?;
            Ok(Images {
                banner: first_url(&body.tvbanner),
                fanart: first_url(&body.showbackground),
                poster: first_url(&body.tvposter),
            })
        } else {
            let id = ids
                .tmdb
                .map(|t| t.to_string())
                .or_else(|| ids.imdb.clone())
                .ok_or_else(|| MetadataError::NotFound(format!("{}: no movie id", ids.slug)))?;
            let url = format!("{}/movies/{}?api_key={}", base, id, key);
            let body: FanartMovie = get_json(&self.client, &url).await?;
            Ok(Images {
                banner: first_url(&body.moviebanner),
                fanart: first_url(&body.moviebackground),
                poster: first_url(&body.movieposter),
            })
        }
    }
}

#[derive(Debug, Deserialize)]
struct FanartImage {
    url: String,
}

fn first_url(images: &[FanartImage]) -> String {
    images.first().map(|i| i.url.clone()).unwrap_or_default()
}

#[derive(Debug, Deserialize)]
struct FanartShow {
    #[serde(default)]
    tvbanner: Vec<FanartImage>,
    #[serde(default)]
    showbackground: Vec<FanartImage>,
    #[serde(default)]
    tvposter: Vec<FanartImage>,
}

#[derive(Debug, Deserialize)]
struct FanartMovie {
    #[serde(default)]
    moviebanner: Vec<FanartImage>,
    #[serde(default)]
    moviebackground: Vec<FanartImage>,
    #[serde(default)]
    movieposter: Vec<FanartImage>,
}
