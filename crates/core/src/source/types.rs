//! Types shared by torrent source backends.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::content::ContentKind;
use crate::retry::Transient;

/// One page request against a source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploader: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// 1-based page number.
    pub page: u32,
}

impl SourceQuery {
    /// The same query on another page.
    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page,
            ..self.clone()
        }
    }
}

/// A raw listing as published by a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub title: String,
    /// Magnet URI, or .torrent URL when the source has no magnet.
    pub locator: String,
    pub seeds: u32,
    pub peers: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

/// One page of results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePage {
    pub results: Vec<Listing>,
    pub total_pages: u32,
}

/// Errors from a source backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Source API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse source response: {0}")]
    Parse(String),

    #[error("Source misconfigured: {0}")]
    NotConfigured(String),
}

impl Transient for SourceError {
    fn is_transient(&self) -> bool {
        matches!(
            self,
            SourceError::Timeout(_) | SourceError::ConnectionFailed(_)
        )
    }

    fn timed_out(after: Duration) -> Self {
        SourceError::Timeout(after)
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SourceError::Timeout(Duration::ZERO)
        } else if e.is_connect() || e.is_request() {
            SourceError::ConnectionFailed(e.to_string())
        } else if e.is_decode() {
            SourceError::Parse(e.to_string())
        } else {
            SourceError::Api {
                status: e.status().map(|s| s.as_u16()).unwrap_or(0),
                message: e.to_string(),
            }
        }
    }
}

/// A paginated torrent listing service.
#[async_trait]
pub trait TorrentSource: Send + Sync {
    /// Name used in logs, status and on stored torrents.
    fn name(&self) -> &str;

    /// What this source lists.
    fn kind(&self) -> ContentKind;

    /// Language recorded on movie torrents.
    fn language(&self) -> &str {
        "en"
    }

    /// Filters applied to every page request.
    fn base_query(&self) -> SourceQuery {
        SourceQuery {
            page: 1,
            ..Default::default()
        }
    }

    /// Fetch one page.
    async fn search(&self, query: &SourceQuery) -> Result<SourcePage, SourceError>;
}
