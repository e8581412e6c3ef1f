//! EZTV-style paginated JSON API backend.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{Listing, SourceError, SourcePage, SourceQuery, TorrentSource};
use crate::config::SourceConfig;
use crate::content::ContentKind;

const PAGE_SIZE: u32 = 100;

pub struct EztvSource {
    client: Client,
    config: SourceConfig,
}

impl EztvSource {
    pub fn new(config: SourceConfig, timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::NotConfigured(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn build_page_url(&self, query: &SourceQuery) -> String {
        let mut url = format!(
            "{}/api/get-torrents?limit={}&page={}",
            self.config.url.trim_end_matches('/'),
            PAGE_SIZE,
            query.page.max(1)
        );
        // The API only filters by show, which is what a keyword means here.
        if let Some(imdb) = &query.keyword {
            url.push_str(&format!(
                "&imdb_id={}",
                urlencoding::encode(imdb.trim_start_matches("tt"))
            ));
        }
        url
    }
}

#[async_trait]
impl TorrentSource for EztvSource {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn kind(&self) -> ContentKind {
        self.config.kind
    }

    fn language(&self) -> &str {
        &self.config.language
    }

    fn base_query(&self) -> SourceQuery {
        SourceQuery {
            keyword: self.config.query.keyword.clone(),
            uploader: self.config.query.uploader.clone(),
            category: self.config.query.category.clone(),
            page: 1,
        }
    }

    async fn search(&self, query: &SourceQuery) -> Result<SourcePage, SourceError> {
        let url = self.build_page_url(query);
        debug!(source = %self.config.name, page = query.page, "Fetching page");

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let body: EztvResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))?;

        Ok(convert_page(body))
    }
}

fn convert_page(body: EztvResponse) -> SourcePage {
    let limit = body.limit.filter(|l| *l > 0).unwrap_or(PAGE_SIZE);
    let total_pages = body.torrents_count.div_ceil(u64::from(limit)).max(1) as u32;

    let results = body
        .torrents
        .into_iter()
        .filter_map(|t| {
            let locator = t
                .magnet_url
                .filter(|m| !m.is_empty())
                .or(t.torrent_url.filter(|u| !u.is_empty()))?;
            Some(Listing {
                title: t.title,
                locator,
                seeds: t.seeds,
                peers: t.peers,
                size_bytes: t.size_bytes.as_ref().and_then(parse_size),
                published_at: t
                    .date_released_unix
                    .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
            })
        })
        .collect();

    SourcePage {
        results,
        total_pages,
    }
}

/// EZTV reports sizes as either numbers or numeric strings.
fn parse_size(value: &serde_json::Value) -> Option<u64> {
    match value {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct EztvResponse {
    #[serde(default)]
    torrents_count: u64,
    #[serde(default)]
    limit: Option<u32>,
    #[serde(default)]
    torrents: Vec<EztvTorrent>,
}

#[derive(Debug, Deserialize)]
struct EztvTorrent {
    title: String,
    #[serde(default)]
    magnet_url: Option<String>,
    #[serde(default)]
    torrent_url: Option<String>,
    #[serde(default)]
    seeds: u32,
    #[serde(default)]
    peers: u32,
    #[serde(default)]
    size_bytes: Option<serde_json::Value>,
    #[serde(default)]
    date_released_unix: Option<i64>,
}
