//! Catalog metadata and artwork.
//!
//! The core only talks to the [`MetadataProvider`] and [`ImageProvider`]
//! traits. [`TraktClient`], [`TmdbImages`] and [`FanartImages`] are the
//! HTTP implementations wired by the server.

mod enricher;
mod images;
mod trakt;
mod types;

pub use enricher::Enricher;
pub use images::{FanartImages, ImageProvider, ImageResolver, TmdbImages};
pub use trakt::TraktClient;
pub use types::*;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::content::ContentKind;
use crate::retry::Transient;

/// Errors from catalog and artwork services.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MetadataError {
    /// The catalog has no entry for this slug or id.
    #[error("Not found in catalog: {0}")]
    NotFound(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection-level failure.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Client not configured (missing API key, etc.).
    #[error("Client not configured: {0}")]
    NotConfigured(String),
}

impl MetadataError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, MetadataError::NotFound(_))
    }
}

impl Transient for MetadataError {
    fn is_transient(&self) -> bool {
        matches!(self, MetadataError::Timeout(_) | MetadataError::Transport(_))
    }

    fn timed_out(after: Duration) -> Self {
        MetadataError::Timeout(after)
    }
}

impl From<reqwest::Error> for MetadataError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            MetadataError::Timeout(Duration::ZERO)
        } else if e.is_connect() || e.is_request() {
            MetadataError::Transport(e.to_string())
        } else if e.is_decode() {
            MetadataError::Parse(e.to_string())
        } else {
            MetadataError::Api {
                status: e.status().map(|s| s.as_u16()).unwrap_or(0),
                message: e.to_string(),
            }
        }
    }
}

/// Show and movie catalog.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Summary of a show by slug.
    async fn show(&self, slug: &str) -> Result<CatalogShow, MetadataError>;

    /// Summary of a movie by slug.
    async fn movie(&self, slug: &str) -> Result<CatalogMovie, MetadataError>;

    /// Episodes of one season.
    async fn season(&self, slug: &str, season: u32) -> Result<Vec<CatalogEpisode>, MetadataError>;

    /// Every episode of every season, specials included.
    async fn all_episodes(&self, slug: &str) -> Result<Vec<CatalogEpisode>, MetadataError>;

    /// People watching the title right now.
    async fn watcher_count(&self, kind: ContentKind, slug: &str) -> Result<u64, MetadataError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transport_failures_are_transient() {
        assert!(MetadataError::Timeout(Duration::from_secs(1)).is_transient());
        assert!(MetadataError::Transport("reset".into()).is_transient());
        assert!(!MetadataError::NotFound("x".into()).is_transient());
        assert!(!MetadataError::RateLimitExceeded.is_transient());
        assert!(!MetadataError::Api {
            status: 500,
            message: "boom".into()
        }
        .is_transient());
    }

    #[test]
    fn test_is_not_found() {
        assert!(MetadataError::NotFound("slug".into()).is_not_found());
        assert!(!MetadataError::Parse("x".into()).is_not_found());
    }
}
