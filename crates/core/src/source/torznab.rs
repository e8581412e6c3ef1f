//! Jackett-style indexer backend.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{Listing, SourceError, SourcePage, SourceQuery, TorrentSource};
use crate::config::SourceConfig;
use crate::content::ContentKind;

/// Queries one indexer through a Jackett-compatible results endpoint.
///
/// The endpoint returns every match in one response, so a query is always a
/// single page.
pub struct TorznabSource {
    client: Client,
    config: SourceConfig,
    indexer: String,
}

impl TorznabSource {
    pub fn new(config: SourceConfig, timeout: Duration) -> Result<Self, SourceError> {
        let indexer = config
            .indexer
            .clone()
            .filter(|i| !i.is_empty())
            .ok_or_else(|| SourceError::NotConfigured(format!("{}: no indexer", config.name)))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::NotConfigured(e.to_string()))?;

        Ok(Self {
            client,
            config,
            indexer,
        })
    }

    /// Build the Jackett API URL for a search.
    fn build_search_url(&self, query: &SourceQuery) -> String {
        let mut url = format!(
            "{}/api/v2.0/indexers/{}/results?apikey={}&Query={}",
            self.config.url.trim_end_matches('/'),
            urlencoding::encode(&self.indexer),
            urlencoding::encode(self.config.api_key.as_deref().unwrap_or_default()),
            urlencoding::encode(query.keyword.as_deref().unwrap_or_default())
        );

        if let Some(categories) = &query.category {
            for cat in categories.split(',').map(str::trim).filter(|c| !c.is_empty()) {
                url.push_str(&format!("&Category[]={}", urlencoding::encode(cat)));
            }
        }

        url
    }
}

#[async_trait]
impl TorrentSource for TorznabSource {
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
        let url = self.build_search_url(query);
        debug!(source = %self.config.name, indexer = %self.indexer, "Searching indexer");

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let body: JackettResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))?;

        Ok(SourcePage {
            results: convert_results(body.Results, query.uploader.as_deref()),
            total_pages: 1,
        })
    }
}

fn convert_results(results: Vec<JackettResult>, uploader: Option<&str>) -> Vec<Listing> {
    results
        .into_iter()
        .filter(|r| match uploader {
            Some(wanted) => r
                .Tracker
                .as_deref()
                .is_some_and(|t| t.eq_ignore_ascii_case(wanted)),
            None => true,
        })
        .filter_map(|r| {
            let locator = r.MagnetUri.or(r.Link)?;
            let seeds = r.Seeders.unwrap_or(0).max(0);
            Some(Listing {
                title: r.Title,
                locator,
                seeds: seeds as u32,
                peers: r.Peers.unwrap_or(0).saturating_sub(seeds).max(0) as u32,
                size_bytes: r.Size.and_then(|s| u64::try_from(s).ok()),
                published_at: r.PublishDate.and_then(|d| parse_jackett_date(&d)),
            })
        })
        .collect()
}

/// Parse Jackett's date format.
fn parse_jackett_date(date_str: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(date_str)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|| {
            chrono::NaiveDateTime::parse_from_str(date_str, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|ndt| ndt.and_utc())
        })
}

// Jackett API response types
#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct JackettResponse {
    Results: Vec<JackettResult>,
}

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct JackettResult {
    Title: String,
    MagnetUri: Option<String>,
    Link: Option<String>,
    Tracker: Option<String>,
    Size: Option<i64>,
    Seeders: Option<i32>,
    Peers: Option<i32>,
    PublishDate: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{QueryConfig, SourceBackend};
    use chrono::Datelike;
    use std::collections::BTreeMap;

    fn config() -> SourceConfig {
        SourceConfig {
            name: "jackett-eztv".to_string(),
            kind: ContentKind::Show,
            backend: SourceBackend::Torznab,
            url: "http://localhost:9117/".to_string(),
            api_key: Some("key".to_string()),
            indexer: Some("eztv".to_string()),
            query: QueryConfig {
                keyword: Some("S01".to_string()),
                uploader: None,
                category: Some("5000, 5040".to_string()),
            },
            language: "en".to_string(),
            aliases: BTreeMap::new(),
            enabled: true,
        }
    }

    #[test]
    fn test_requires_indexer() {
        let mut cfg = config();
        cfg.indexer = None;
        assert!(matches!(
            TorznabSource::new(cfg, Duration::from_secs(5)),
            Err(SourceError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_build_search_url() {
        let source = TorznabSource::new(config(), Duration::from_secs(5)).unwrap();
        let url = source.build_search_url(&source.base_query());
        assert_eq!(
            url,
            "http://localhost:9117/api/v2.0/indexers/eztv/results?apikey=key&Query=S01&Category[]=5000&Category[]=5040"
        );
    }

    #[test]
    fn test_parse_response() {
        let json = r#"{"Results": [
            {"Title": "Show.Name.S01E02.720p", "MagnetUri": "magnet:?xt=a", "Link": null,
             "Tracker": "EZTV", "Size": 1000, "Seeders": 10, "Peers": 15,
             "PublishDate": "2024-06-15T10:30:00Z"},
            {"Title": "Show.Name.S01E03.720p", "MagnetUri": null, "Link": "http://x/t.torrent",
             "Tracker": "other", "Size": null, "Seeders": null, "Peers": null, "PublishDate": null},
            {"Title": "No locator", "MagnetUri": null, "Link": null,
             "Tracker": null, "Size": 1, "Seeders": 1, "Peers": 1, "PublishDate": null}
        ]}"#;
        let response: JackettResponse = serde_json::from_str(json).unwrap();
        let listings = convert_results(response.Results, None);

        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].locator, "magnet:?xt=a");
        assert_eq!(listings[0].seeds, 10);
        assert_eq!(listings[0].peers, 5);
        assert_eq!(listings[0].published_at.unwrap().year(), 2024);
        assert_eq!(listings[1].locator, "http://x/t.torrent");
        assert_eq!(listings[1].seeds, 0);
    }

    #[test]
    fn test_uploader_filter() {
        let json = r#"{"Results": [
            {"Title": "A", "MagnetUri": "magnet:a", "Link": null, "Tracker": "EZTV",
             "Size": null, "Seeders": 1, "Peers": 1, "PublishDate": null},
            {"Title": "B", "MagnetUri": "magnet:b", "Link": null, "Tracker": "other",
             "Size": null, "Seeders": 1, "Peers": 1, "PublishDate": null}
        ]}"#;
        let response: JackettResponse = serde_json::from_str(json).unwrap();
        let listings = convert_results(response.Results, Some("eztv"));
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].title, "A");
    }

    #[test]
    fn test_parse_jackett_date_without_timezone() {
        let date = parse_jackett_date("2024-06-15T10:30:00").unwrap();
        assert_eq!(date.month(), 6);
        assert!(parse_jackett_date("yesterday").is_none());
    }
}
