//! Folding one source's extractions into candidates.

use std::collections::BTreeMap;

use tracing::debug;

use super::slot::merge_slot;
use super::types::{CandidateEpisodes, MovieCandidate, ShowCandidate};
use crate::content::{Quality, Slots, TorrentRef};
use crate::parser::{EpisodeMarker, ExtractedIdentity, ExtractedMovie};

fn put(slots: &mut Slots, quality: Quality, torrent: &TorrentRef) {
    let (merged, changed) = merge_slot(slots.get(&quality), torrent);
    if changed {
        slots.insert(quality, merged);
    }
}

/// Group key for show listings. Date-based and seasonal listings of the
/// same title end up in separate candidates.
type ShowKey = (String, String, bool);

/// Accumulates show/anime extractions of one source.
#[derive(Debug, Default)]
pub struct ShowBatch {
    groups: BTreeMap<ShowKey, ShowCandidate>,
}

impl ShowBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, identity: &ExtractedIdentity) {
        let key = (
            identity.normalized_title.clone(),
            identity.slug.clone(),
            identity.is_date_based(),
        );
        let candidate = self.groups.entry(key).or_insert_with(|| ShowCandidate {
            title: identity.normalized_title.clone(),
            slug: identity.slug.clone(),
            episodes: match identity.marker {
                EpisodeMarker::Seasonal { .. } => CandidateEpisodes::Seasonal {
                    seasons: BTreeMap::new(),
                },
                EpisodeMarker::Dated { .. } => CandidateEpisodes::DateBased {
                    dates: BTreeMap::new(),
                },
            },
        });

        let slots = match (&mut candidate.episodes, identity.marker) {
            (CandidateEpisodes::Seasonal { seasons }, EpisodeMarker::Seasonal { season, episode }) => {
                seasons.entry(season).or_default().entry(episode).or_default()
            }
            (CandidateEpisodes::DateBased { dates }, EpisodeMarker::Dated { air_date }) => {
                dates.entry(air_date).or_default()
            }
            _ => {
                // The key includes the marker shape.
                debug!(slug = %identity.slug, "Listing shape does not match its group");
                return;
            }
        };
        put(slots, identity.quality, &identity.torrent);
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn into_candidates(self) -> Vec<ShowCandidate> {
        self.groups.into_values().collect()
    }
}

/// Accumulates movie extractions of one source.
#[derive(Debug, Default)]
pub struct MovieBatch {
    groups: BTreeMap<(String, String), MovieCandidate>,
}

impl MovieBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, movie: &ExtractedMovie) {
        let key = (movie.normalized_title.clone(), movie.slug.clone());
        let candidate = self.groups.entry(key).or_insert_with(|| MovieCandidate {
            title: movie.normalized_title.clone(),
            slug: movie.slug.clone(),
            year: movie.year,
            torrents: BTreeMap::new(),
        });

        candidate.year = match (candidate.year, movie.year) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };

        let slots = candidate.torrents.entry(movie.language.clone()).or_default();
        put(slots, movie.quality, &movie.torrent);
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn into_candidates(self) -> Vec<MovieCandidate> {
        self.groups.into_values().collect()
    }
}

/// Deduplicate show/anime extractions into one candidate per title and slug.
pub fn dedup_shows<'a, I>(identities: I) -> Vec<ShowCandidate>
where
    I: IntoIterator<Item = &'a ExtractedIdentity>,
{
    let mut batch = ShowBatch::new();
    for identity in identities {
        batch.add(identity);
    }
    batch.into_candidates()
}

/// Deduplicate movie extractions into one candidate per title and slug.
pub fn dedup_movies<'a, I>(movies: I) -> Vec<MovieCandidate>
where
    I: IntoIterator<Item = &'a ExtractedMovie>,
{
    let mut batch = MovieBatch::new();
    for movie in movies {
        batch.add(movie);
    }
    batch.into_candidates()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Quality;
    use crate::parser::{parse_movie_listing, parse_show_listing, AliasTable};
    use crate::source::Listing;
    use chrono::NaiveDate;

    fn listing(title: &str, locator: &str, seeds: u32) -> Listing {
        Listing {
            title: title.to_string(),
            locator: locator.to_string(),
            seeds,
            peers: 0,
            size_bytes: None,
            published_at: None,
        }
    }

    fn shows(listings: &[Listing]) -> Vec<ExtractedIdentity> {
        let aliases = AliasTable::new();
        listings
            .iter()
            .filter_map(|l| parse_show_listing(l, "eztv", &aliases))
            .collect()
    }

    fn seasonal(candidate: &ShowCandidate) -> &BTreeMap<u32, BTreeMap<u32, Slots>> {
        match &candidate.episodes {
            CandidateEpisodes::Seasonal { seasons } => seasons,
            other => panic!("expected seasonal episodes, got {:?}", other),
        }
    }

    #[test]
    fn test_keeps_higher_seeded_torrent() {
        let identities = shows(&[
            listing("Show.Name.S01E02.480p-GRP", "magnet:a", 5),
            listing("Show.Name.S01E02.480p-OTHER", "magnet:b", 20),
        ]);
        let candidates = dedup_shows(&identities);

        assert_eq!(candidates.len(), 1);
        let slot = &seasonal(&candidates[0])[&1][&2][&Quality::P480];
        assert_eq!(slot.seeds, 20);
        assert_eq!(slot.locator, "magnet:b");
    }

    #[test]
    fn test_order_does_not_matter() {
        let listings = vec![
            listing("Show.Name.S01E02.480p-GRP", "magnet:a", 5),
            listing("Show.Name.S01E02.480p-OTHER", "magnet:b", 20),
            listing("Show.Name.S01E03.720p-GRP", "magnet:c", 7),
            listing("Show.Name.S02E01.1080p-GRP", "magnet:d", 1),
            listing("Show.Name.S01E04.720p-GRP", "magnet:e", 500),
            listing("Show.Name.S01E04.REPACK.720p-GRP", "magnet:r", 1),
        ];
        let mut reversed = listings.clone();
        reversed.reverse();

        let forward = dedup_shows(&shows(&listings));
        let backward = dedup_shows(&shows(&reversed));
        assert_eq!(forward, backward);
        assert_eq!(seasonal(&forward[0])[&1][&4][&Quality::P720].locator, "magnet:r");
    }

    #[test]
    fn test_separate_qualities_and_episodes() {
        let identities = shows(&[
            listing("Show.Name.S01E02.480p-GRP", "magnet:a", 5),
            listing("Show.Name.S01E02.720p-GRP", "magnet:b", 5),
            listing("Show.Name.S01E03.720p-GRP", "magnet:c", 5),
            listing("Show.Name.S02E01.720p-GRP", "magnet:d", 5),
        ]);
        let candidates = dedup_shows(&identities);
        let seasons = seasonal(&candidates[0]);

        assert_eq!(seasons.len(), 2);
        assert_eq!(seasons[&1][&2].len(), 2);
        assert_eq!(candidates[0].episodes.episode_count(), 3);
        assert_eq!(candidates[0].episodes.torrent_count(), 4);
    }

    #[test]
    fn test_repack_takes_slot() {
        let identities = shows(&[
            listing("Show.Name.S01E02.720p-GRP", "magnet:a", 500),
            listing("Show.Name.S01E02.REPACK.720p-GRP", "magnet:r", 2),
        ]);
        let candidates = dedup_shows(&identities);
        let slot = &seasonal(&candidates[0])[&1][&2][&Quality::P720];
        assert_eq!(slot.locator, "magnet:r");
        assert!(slot.repack);
    }

    #[test]
    fn test_distinct_titles_make_distinct_candidates() {
        let identities = shows(&[
            listing("Show.Name.S01E02.720p-GRP", "magnet:a", 5),
            listing("Other.Show.S01E02.720p-GRP", "magnet:b", 5),
        ]);
        let candidates = dedup_shows(&identities);
        let slugs: Vec<_> = candidates.iter().map(|c| c.slug.as_str()).collect();
        assert_eq!(slugs, vec!["other-show", "show-name"]);
    }

    #[test]
    fn test_date_based_listings_group_by_air_date() {
        let identities = shows(&[
            listing("The.Daily.Show.2019.05.01.720p.WEB", "magnet:a", 3),
            listing("The.Daily.Show.2019.05.01.720p.WEB-X", "magnet:b", 9),
            listing("The.Daily.Show.2019.05.02.480p.WEB", "magnet:c", 1),
        ]);
        let candidates = dedup_shows(&identities);

        assert_eq!(candidates.len(), 1);
        assert!(candidates[0].episodes.is_date_based());
        match &candidates[0].episodes {
            CandidateEpisodes::DateBased { dates } => {
                let first = NaiveDate::from_ymd_opt(2019, 5, 1).unwrap();
                assert_eq!(dates.len(), 2);
                assert_eq!(dates[&first][&Quality::P720].seeds, 9);
            }
            other => panic!("expected date-based episodes, got {:?}", other),
        }
    }

    #[test]
    fn test_movies_keyed_by_language_and_quality() {
        let aliases = AliasTable::new();
        let english: Vec<_> = [
            listing("Inception (2010) [1080p]", "magnet:a", 10),
            listing("Inception (2010) [1080p] [x265]", "magnet:b", 40),
            listing("Inception (2010) [720p]", "magnet:c", 3),
        ]
        .iter()
        .filter_map(|l| parse_movie_listing(l, "yts", "en", &aliases))
        .collect();
        let french: Vec<_> = [listing("Inception (2010) [1080p]", "magnet:f", 1)]
            .iter()
            .filter_map(|l| parse_movie_listing(l, "yts", "fr", &aliases))
            .collect();

        let candidates = dedup_movies(english.iter().chain(french.iter()));
        assert_eq!(candidates.len(), 1);

        let movie = &candidates[0];
        assert_eq!(movie.slug, "inception-2010");
        assert_eq!(movie.year, Some(2010));
        assert_eq!(movie.torrents["en"][&Quality::P1080].locator, "magnet:b");
        assert_eq!(movie.torrents["en"][&Quality::P720].locator, "magnet:c");
        assert_eq!(movie.torrents["fr"][&Quality::P1080].locator, "magnet:f");
    }
}
