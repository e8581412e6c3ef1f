use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use crate::content::ContentKind;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub metadata: MetadataConfig,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("scrapeyard.db")
}

/// Scrape scheduling and concurrency.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScraperConfig {
    /// Run the scheduled loop at all (default: true).
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Items of one source processed concurrently (default: 2).
    #[serde(default = "default_max_web_request")]
    pub max_web_request: usize,
    /// Timeout of each outgoing request in seconds (default: 30).
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    /// Seconds between two runs (default: 3600).
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
    /// Start a run immediately instead of waiting one interval (default: true).
    #[serde(default = "default_true")]
    pub run_on_start: bool,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_web_request: default_max_web_request(),
            request_timeout_secs: default_timeout(),
            interval_secs: default_interval(),
            run_on_start: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_web_request() -> usize {
    2
}

fn default_timeout() -> u64 {
    30
}

fn default_interval() -> u64 {
    3600
}

/// Catalog and artwork services.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetadataConfig {
    #[serde(default)]
    pub trakt: Option<TraktConfig>,
    #[serde(default)]
    pub tmdb: Option<TmdbConfig>,
    #[serde(default)]
    pub fanart: Option<FanartConfig>,
    /// Image path stored when no provider has artwork.
    #[serde(default = "default_placeholder")]
    pub placeholder_image: String,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            trakt: None,
            tmdb: None,
            fanart: None,
            placeholder_image: default_placeholder(),
        }
    }
}

fn default_placeholder() -> String {
    "images/posterholder.png".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TraktConfig {
    #[serde(default = "default_trakt_url")]
    pub url: String,
    pub client_id: String,
}

fn default_trakt_url() -> String {
    "https://api.trakt.tv".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TmdbConfig {
    #[serde(default = "default_tmdb_url")]
    pub url: String,
    #[serde(default = "default_tmdb_image_base")]
    pub image_base: String,
    pub api_key: String,
}

fn default_tmdb_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_tmdb_image_base() -> String {
    "https://image.tmdb.org/t/p/w500".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FanartConfig {
    #[serde(default = "default_fanart_url")]
    pub url: String,
    pub api_key: String,
}

fn default_fanart_url() -> String {
    "https://webservice.fanart.tv/v3".to_string()
}

/// How a source is queried.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceBackend {
    /// Jackett-style JSON indexer endpoint.
    Torznab,
    /// EZTV-style paginated JSON API.
    Eztv,
}

impl SourceBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceBackend::Torznab => "torznab",
            SourceBackend::Eztv => "eztv",
        }
    }
}

/// Filters sent with every query of a source.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct QueryConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploader: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// One torrent source.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    pub name: String,
    pub kind: ContentKind,
    pub backend: SourceBackend,
    pub url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Indexer id (torznab only).
    #[serde(default)]
    pub indexer: Option<String>,
    #[serde(default)]
    pub query: QueryConfig,
    /// Language recorded on movie torrents (default: "en").
    #[serde(default = "default_language")]
    pub language: String,
    /// Listing slug -> catalog slug.
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_language() -> String {
    "en".to_string()
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub scraper: ScraperConfig,
    pub metadata: SanitizedMetadataConfig,
    pub sources: Vec<SanitizedSourceConfig>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedMetadataConfig {
    pub trakt_configured: bool,
    pub tmdb_configured: bool,
    pub fanart_configured: bool,
    pub placeholder_image: String,
}

/// Sanitized source config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedSourceConfig {
    pub name: String,
    pub kind: ContentKind,
    pub backend: String,
    pub url: String,
    pub api_key_configured: bool,
    pub language: String,
    pub aliases: usize,
    pub enabled: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let metadata = &config.metadata;
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            scraper: config.scraper.clone(),
            metadata: SanitizedMetadataConfig {
                trakt_configured: metadata
                    .trakt
                    .as_ref()
                    .is_some_and(|t| !t.client_id.is_empty()),
                tmdb_configured: metadata.tmdb.as_ref().is_some_and(|t| !t.api_key.is_empty()),
                fanart_configured: metadata
                    .fanart
                    .as_ref()
                    .is_some_and(|f| !f.api_key.is_empty()),
                placeholder_image: metadata.placeholder_image.clone(),
            },
            sources: config
                .sources
                .iter()
                .map(|s| SanitizedSourceConfig {
                    name: s.name.clone(),
                    kind: s.kind,
                    backend: s.backend.as_str().to_string(),
                    url: s.url.clone(),
                    api_key_configured: s.api_key.as_ref().is_some_and(|k| !k.is_empty()),
                    language: s.language.clone(),
                    aliases: s.aliases.len(),
                    enabled: s.enabled,
                })
                .collect(),
        }
    }
}
