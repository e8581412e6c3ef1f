//! Canonical content records as persisted by the store.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::quality::{QualityMap, Slots};

/// Reference to one torrent release seen on a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorrentRef {
    /// Magnet URI or .torrent URL.
    pub locator: String,
    /// Seeders reported by the source.
    pub seeds: u32,
    /// Peers reported by the source.
    pub peers: u32,
    /// Name of the source the listing came from.
    pub source: String,
    /// Listing title as published.
    pub title: String,
    /// Whether the listing is marked as a repack/proper re-release.
    #[serde(default)]
    pub repack: bool,
}

impl TorrentRef {
    pub fn new(locator: &str, seeds: u32, peers: u32, source: &str, title: &str) -> Self {
        Self {
            locator: locator.to_string(),
            seeds,
            peers,
            source: source.to_string(),
            title: title.to_string(),
            repack: crate::parser::is_repack(title),
        }
    }
}

/// What a source lists and how the catalog should be asked about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Show,
    Anime,
    Movie,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Show => "show",
            ContentKind::Anime => "anime",
            ContentKind::Movie => "movie",
        }
    }

    pub fn is_episodic(&self) -> bool {
        !matches!(self, ContentKind::Movie)
    }
}

/// Identifiers of a title across catalog services.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogIds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmdb: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tvdb: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trakt: Option<u64>,
    /// Catalog slug.
    pub slug: String,
}

impl CatalogIds {
    /// Primary persistence key: the IMDB id, or the TVDB id for shows the
    /// catalog has no IMDB entry for.
    pub fn primary(&self) -> Option<String> {
        match &self.imdb {
            Some(imdb) if !imdb.is_empty() => Some(imdb.clone()),
            _ => self.tvdb.map(|tvdb| tvdb.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    pub votes: u64,
    /// People watching right now, as reported by the catalog.
    pub watching: u64,
    /// Rating scaled to 0-100.
    pub percentage: u8,
}

/// Artwork paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Images {
    pub banner: String,
    pub fanart: String,
    pub poster: String,
}

impl Images {
    pub fn placeholder(path: &str) -> Self {
        Self {
            banner: path.to_string(),
            fanart: path.to_string(),
            poster: path.to_string(),
        }
    }

    /// Take every image from `fresh` unless it is the placeholder and a real
    /// one is already known.
    pub fn prefer_real(&self, fresh: &Images, placeholder: &str) -> Images {
        let pick = |known: &String, new: &String| {
            if new == placeholder && known != placeholder {
                known.clone()
            } else {
                new.clone()
            }
        };
        Images {
            banner: pick(&self.banner, &fresh.banner),
            fanart: pick(&self.fanart, &fresh.fanart),
            poster: pick(&self.poster, &fresh.poster),
        }
    }

    pub fn has_placeholder(&self, placeholder: &str) -> bool {
        self.banner == placeholder || self.fanart == placeholder || self.poster == placeholder
    }
}

/// Catalog-derived fields shared by shows and movies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentInfo {
    /// Persistence key (external catalog primary id).
    pub id: String,
    pub ids: CatalogIds,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    pub slug: String,
    #[serde(default)]
    pub synopsis: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<u32>,
    pub rating: Rating,
    pub images: Images,
    #[serde(default)]
    pub genres: Vec<String>,
    pub kind: ContentKind,
    pub last_updated: DateTime<Utc>,
}

/// One episode with its torrents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub season: u32,
    pub episode: u32,
    pub title: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub date_based: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tvdb_id: Option<u64>,
    pub torrents: QualityMap,
}

impl Episode {
    pub fn key(&self) -> (u32, u32) {
        (self.season, self.episode)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Show {
    #[serde(flatten)]
    pub info: ContentInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air_day: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Count of distinct season numbers among `episodes`.
    pub num_seasons: u32,
    /// Air time of the most recent known episode; never moves backwards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_episode_air_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub episodes: Vec<Episode>,
}

impl Show {
    /// Recompute `num_seasons` from the episode list.
    pub fn recount_seasons(&mut self) {
        self.num_seasons = distinct_seasons(&self.episodes).len() as u32;
    }

    /// Raise the air-time watermark.
    pub fn observe_air_time(&mut self, air_time: Option<DateTime<Utc>>) {
        if let Some(at) = air_time {
            if self.latest_episode_air_time.map_or(true, |known| at > known) {
                self.latest_episode_air_time = Some(at);
            }
        }
    }
}

/// Distinct season numbers, ascending.
pub fn distinct_seasons(episodes: &[Episode]) -> Vec<u32> {
    episodes
        .iter()
        .map(|e| e.season)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Torrents of a movie, by language then quality.
pub type LanguageSlots = BTreeMap<String, Slots>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    #[serde(flatten)]
    pub info: ContentInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub released: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certification: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailer: Option<String>,
    #[serde(default)]
    pub torrents: LanguageSlots,
}

/// A persisted content record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Content {
    Show(Show),
    Movie(Movie),
}

impl Content {
    pub fn info(&self) -> &ContentInfo {
        match self {
            Content::Show(show) => &show.info,
            Content::Movie(movie) => &movie.info,
        }
    }

    pub fn info_mut(&mut self) -> &mut ContentInfo {
        match self {
            Content::Show(show) => &mut show.info,
            Content::Movie(movie) => &mut movie.info,
        }
    }

    pub fn id(&self) -> &str {
        &self.info().id
    }

    pub fn kind(&self) -> ContentKind {
        self.info().kind
    }

    pub fn as_show(&self) -> Option<&Show> {
        match self {
            Content::Show(show) => Some(show),
            Content::Movie(_) => None,
        }
    }

    pub fn as_movie(&self) -> Option<&Movie> {
        match self {
            Content::Movie(movie) => Some(movie),
            Content::Show(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Quality;
    use chrono::TimeZone;

    fn info(id: &str) -> ContentInfo {
        ContentInfo {
            id: id.to_string(),
            ids: CatalogIds {
                imdb: Some(id.to_string()),
                slug: "show-name".to_string(),
                ..Default::default()
            },
            title: "Show Name".to_string(),
            year: Some(2014),
            slug: "show-name".to_string(),
            synopsis: String::new(),
            runtime: Some(42),
            rating: Rating::default(),
            images: Images::placeholder("images/placeholder.png"),
            genres: vec!["drama".to_string()],
            kind: ContentKind::Show,
            last_updated: Utc::now(),
        }
    }

    fn episode(season: u32, number: u32) -> Episode {
        Episode {
            season,
            episode: number,
            title: format!("Episode {}", number),
            overview: String::new(),
            date_based: false,
            air_time: None,
            tvdb_id: None,
            torrents: QualityMap::default(),
        }
    }

    #[test]
    fn test_primary_id_prefers_imdb() {
        let ids = CatalogIds {
            imdb: Some("tt0944947".to_string()),
            tvdb: Some(121361),
            slug: "game-of-thrones".to_string(),
            ..Default::default()
        };
        assert_eq!(ids.primary().as_deref(), Some("tt0944947"));
    }

    #[test]
    fn test_primary_id_falls_back_to_tvdb() {
        let ids = CatalogIds {
            imdb: Some(String::new()),
            tvdb: Some(121361),
            slug: "x".to_string(),
            ..Default::default()
        };
        assert_eq!(ids.primary().as_deref(), Some("121361"));
        assert!(CatalogIds::default().primary().is_none());
    }

    #[test]
    fn test_prefer_real_keeps_known_image_over_placeholder() {
        let placeholder = "images/placeholder.png";
        let known = Images {
            banner: "b.jpg".to_string(),
            fanart: placeholder.to_string(),
            poster: "p.jpg".to_string(),
        };
        let fresh = Images {
            banner: placeholder.to_string(),
            fanart: "f.jpg".to_string(),
            poster: "p2.jpg".to_string(),
        };
        let merged = known.prefer_real(&fresh, placeholder);
        assert_eq!(merged.banner, "b.jpg");
        assert_eq!(merged.fanart, "f.jpg");
        assert_eq!(merged.poster, "p2.jpg");
        assert!(!merged.has_placeholder(placeholder));
    }

    #[test]
    fn test_recount_seasons() {
        let mut show = Show {
            info: info("tt1"),
            air_day: None,
            network: None,
            status: None,
            num_seasons: 0,
            latest_episode_air_time: None,
            episodes: vec![episode(1, 1), episode(1, 2), episode(3, 1)],
        };
        show.recount_seasons();
        assert_eq!(show.num_seasons, 2);
    }

    #[test]
    fn test_air_time_watermark_never_decreases() {
        let mut show = Show {
            info: info("tt1"),
            air_day: None,
            network: None,
            status: None,
            num_seasons: 0,
            latest_episode_air_time: None,
            episodes: vec![],
        };
        let later = Utc.with_ymd_and_hms(2020, 5, 1, 0, 0, 0).unwrap();
        let earlier = Utc.with_ymd_and_hms(2019, 5, 1, 0, 0, 0).unwrap();
        show.observe_air_time(Some(later));
        show.observe_air_time(Some(earlier));
        show.observe_air_time(None);
        assert_eq!(show.latest_episode_air_time, Some(later));
    }

    #[test]
    fn test_content_serialization_is_tagged() {
        let mut torrents = LanguageSlots::new();
        torrents.entry("en".to_string()).or_default().insert(
            Quality::P720,
            TorrentRef::new("magnet:?xt=urn:btih:abc", 10, 2, "yts", "Movie (2010) 720p"),
        );
        let mut movie_info = info("tt2");
        movie_info.kind = ContentKind::Movie;
        let content = Content::Movie(Movie {
            info: movie_info,
            released: None,
            certification: None,
            trailer: None,
            torrents,
        });

        let json = serde_json::to_string(&content).unwrap();
        assert!(json.contains("\"type\":\"movie\""));
        let parsed: Content = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, content);
    }
}
