//! Testing utilities and mock implementations.
//!
//! Every collaborator of a scrape (sources, the catalog, artwork providers,
//! the content store) has a mock here, so a full run can be exercised
//! without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use scrapeyard_core::testing::{fixtures, MockMetadata, MockSource};
//!
//! let source = MockSource::new("eztv", ContentKind::Show)
//!     .with_pages(vec![vec![fixtures::listing("Show.Name.S01E01.720p-GRP", 10)]]);
//! let metadata = MockMetadata::new();
//! metadata.add_show(fixtures::catalog_show("show-name", "tt0000001")).await;
//! metadata.set_season("show-name", 1, fixtures::catalog_season(1, 10)).await;
//! ```

mod flaky_store;
mod mock_metadata;
mod mock_source;

pub use flaky_store::FlakyStore;
pub use mock_metadata::{MockImages, MockMetadata, RecordedMetadataCall};
pub use mock_source::MockSource;

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use crate::content::{
        CatalogIds, ContentInfo, ContentKind, Episode, Images, Movie, Quality, QualityMap, Rating,
        Show, TorrentRef,
    };
    use crate::metadata::{CatalogEpisode, CatalogMovie, CatalogShow};
    use crate::source::Listing;

    /// Fixed reference time so fixtures compare equal across calls.
    pub fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 1, 20, 0, 0).unwrap()
    }

    /// Deterministic air time: seasons a year apart, episodes weekly.
    pub fn air_time(season: u32, episode: u32) -> DateTime<Utc> {
        epoch() + Duration::days(365 * season as i64 + 7 * episode as i64)
    }

    /// A raw listing with a magnet derived from its title.
    pub fn listing(title: &str, seeds: u32) -> Listing {
        Listing {
            title: title.to_string(),
            locator: format!("magnet:?xt=urn:btih:{}", title.to_lowercase()),
            seeds,
            peers: seeds / 2,
            size_bytes: Some(1024 * 1024 * 350),
            published_at: None,
        }
    }

    /// Catalog summary for a show. An empty `imdb` leaves the id unset.
    pub fn catalog_show(slug: &str, imdb: &str) -> CatalogShow {
        CatalogShow {
            ids: CatalogIds {
                imdb: (!imdb.is_empty()).then(|| imdb.to_string()),
                tmdb: Some(1399),
                tvdb: Some(121361),
                trakt: Some(1390),
                slug: slug.to_string(),
            },
            title: title_of(slug),
            year: Some(2011),
            overview: format!("Overview of {}.", slug),
            runtime: Some(55),
            rating: 8.4,
            votes: 1200,
            genres: vec!["drama".to_string()],
            air_day: Some("Sunday".to_string()),
            network: Some("HBO".to_string()),
            status: Some("returning series".to_string()),
        }
    }

    pub fn catalog_movie(slug: &str, imdb: &str) -> CatalogMovie {
        CatalogMovie {
            ids: CatalogIds {
                imdb: (!imdb.is_empty()).then(|| imdb.to_string()),
                tmdb: Some(27205),
                tvdb: None,
                trakt: Some(16662),
                slug: slug.to_string(),
            },
            title: title_of(slug),
            year: Some(2010),
            overview: format!("Overview of {}.", slug),
            runtime: Some(148),
            rating: 8.8,
            votes: 3000,
            genres: vec!["science-fiction".to_string()],
            released: Some("2010-07-16".to_string()),
            certification: Some("PG-13".to_string()),
            trailer: None,
        }
    }

    pub fn catalog_episode(
        season: u32,
        number: u32,
        first_aired: Option<DateTime<Utc>>,
    ) -> CatalogEpisode {
        CatalogEpisode {
            season,
            number,
            title: format!("Episode {}", number),
            overview: String::new(),
            first_aired,
            tvdb_id: Some(season as u64 * 1000 + number as u64),
        }
    }

    /// Episodes 1..=count of a season, airing weekly.
    pub fn catalog_season(season: u32, count: u32) -> Vec<CatalogEpisode> {
        (1..=count)
            .map(|number| catalog_episode(season, number, Some(air_time(season, number))))
            .collect()
    }

    fn info(id: &str, slug: &str, kind: ContentKind) -> ContentInfo {
        ContentInfo {
            id: id.to_string(),
            ids: CatalogIds {
                imdb: Some(id.to_string()),
                slug: slug.to_string(),
                ..Default::default()
            },
            title: title_of(slug),
            year: Some(2011),
            slug: slug.to_string(),
            synopsis: String::new(),
            runtime: Some(50),
            rating: Rating {
                votes: 10,
                watching: 0,
                percentage: 80,
            },
            images: Images {
                banner: format!("images/{}/banner.jpg", slug),
                fanart: format!("images/{}/fanart.jpg", slug),
                poster: format!("images/{}/poster.jpg", slug),
            },
            genres: vec!["drama".to_string()],
            kind,
            last_updated: epoch(),
        }
    }

    /// A stored-shape show holding the given (season, episode) pairs, each
    /// with one 720p torrent.
    pub fn show(id: &str, slug: &str, episodes: &[(u32, u32)]) -> Show {
        let episodes: Vec<Episode> = episodes
            .iter()
            .map(|&(season, episode)| {
                let locator = format!("magnet:{}-s{:02}e{:02}", slug, season, episode);
                let torrent = TorrentRef::new(&locator, 20, 5, "eztv", &locator);
                Episode {
                    season,
                    episode,
                    title: format!("Episode {}", episode),
                    overview: String::new(),
                    date_based: false,
                    air_time: Some(air_time(season, episode)),
                    tvdb_id: None,
                    torrents: QualityMap::from_slots(
                        [(Quality::P720, torrent)].into_iter().collect(),
                    ),
                }
            })
            .collect();

        let mut show = Show {
            info: info(id, slug, ContentKind::Show),
            air_day: None,
            network: None,
            status: None,
            num_seasons: 0,
            latest_episode_air_time: None,
            episodes,
        };
        show.recount_seasons();
        let latest = show.episodes.iter().filter_map(|e| e.air_time).max();
        show.observe_air_time(latest);
        show
    }

    /// A movie with no torrents.
    pub fn movie(id: &str, slug: &str) -> Movie {
        Movie {
            info: info(id, slug, ContentKind::Movie),
            released: Some("2010-07-16".to_string()),
            certification: None,
            trailer: None,
            torrents: Default::default(),
        }
    }

    fn title_of(slug: &str) -> String {
        slug.split('-')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            })
            .collect::<Vec<String>>()
            .join(" ")
    }
}
