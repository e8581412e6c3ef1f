//! Title patterns for show, anime and movie listings.
//!
//! Patterns are tried in priority order and the first match wins:
//! - `Show.Name.S01E02.720p-GRP`
//! - `Show Name 1x02 HDTV`
//! - `[Group] Anime Title S2 - 05 [1080p]`
//! - `Daily.Show.2019.05.01.720p`

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex_lite::{Captures, Regex};
use tracing::debug;

use crate::content::{Quality, TorrentRef};
use crate::source::Listing;

use super::slug::{normalize_title, slugify, AliasTable};
use super::types::{EpisodeMarker, ExtractedIdentity, ExtractedMovie, TitlePattern};

static SEASON_EPISODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(.+?)[\s._-]+S(\d{1,2})[\s._]?E(\d{1,3})").unwrap()
});

static CROSS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(.+?)[\s._-]+(\d{1,2})x(\d{2,3})(?:[\s._\-\[(]|$)").unwrap());

static RELEASE_GROUP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\[([^\]]+)\][\s._]*(.+?)(?:[\s._]+(?:S(\d{1,2})|(\d{1,2})(?:st|nd|rd|th)[\s._]+Season))?[\s._]+-[\s._]+(\d{1,4})(?:v\d)?(?:[\s._\[(]|$)",
    )
    .unwrap()
});

static AIR_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.+?)[\s._-]+(\d{4})[\s._-](\d{2})[\s._-](\d{2})(?:[\s._\-\[(]|$)").unwrap()
});

static YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s._\-(\[]((?:19|20)\d{2})").unwrap());

static REPACK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(repack|proper)\b").unwrap());

/// Whether the listing title marks a re-release.
pub fn is_repack(title: &str) -> bool {
    REPACK_RE.is_match(title)
}

fn capture_u32(caps: &Captures<'_>, index: usize) -> Option<u32> {
    caps.get(index).and_then(|m| m.as_str().parse().ok())
}

/// Title text plus the episode marker a pattern extracted.
fn match_episode(title: &str) -> Option<(String, EpisodeMarker, TitlePattern)> {
    if let Some(caps) = SEASON_EPISODE_RE.captures(title) {
        return Some((
            caps[1].to_string(),
            EpisodeMarker::Seasonal {
                season: capture_u32(&caps, 2)?,
                episode: capture_u32(&caps, 3)?,
            },
            TitlePattern::SeasonEpisode,
        ));
    }

    if let Some(caps) = CROSS_RE.captures(title) {
        return Some((
            caps[1].to_string(),
            EpisodeMarker::Seasonal {
                season: capture_u32(&caps, 2)?,
                episode: capture_u32(&caps, 3)?,
            },
            TitlePattern::Cross,
        ));
    }

    if let Some(caps) = RELEASE_GROUP_RE.captures(title) {
        let season = capture_u32(&caps, 3)
            .or_else(|| capture_u32(&caps, 4))
            .unwrap_or(1);
        return Some((
            caps[2].to_string(),
            EpisodeMarker::Seasonal {
                season,
                episode: capture_u32(&caps, 5)?,
            },
            TitlePattern::ReleaseGroup,
        ));
    }

    if let Some(caps) = AIR_DATE_RE.captures(title) {
        let air_date = NaiveDate::from_ymd_opt(
            caps[2].parse().ok()?,
            caps[3].parse().ok()?,
            caps[4].parse().ok()?,
        )?;
        return Some((
            caps[1].to_string(),
            EpisodeMarker::Dated { air_date },
            TitlePattern::AirDate,
        ));
    }

    None
}

/// Extract an episode identity from a show or anime listing.
///
/// Returns `None` when no pattern matches or the title text yields an empty
/// slug. That is a routine miss, not an error.
pub fn parse_show_listing(
    listing: &Listing,
    source: &str,
    aliases: &AliasTable,
) -> Option<ExtractedIdentity> {
    let Some((title_text, marker, pattern)) = match_episode(&listing.title) else {
        debug!(source = source, title = %listing.title, "No title pattern matched");
        return None;
    };

    let normalized_title = normalize_title(&title_text);
    let slug = slugify(&normalized_title);
    if slug.is_empty() {
        debug!(source = source, title = %listing.title, "Title text produced an empty slug");
        return None;
    }
    let slug = aliases.resolve(&slug);

    Some(ExtractedIdentity {
        raw_title: listing.title.clone(),
        normalized_title,
        slug,
        marker,
        pattern,
        quality: Quality::from_title(&listing.title),
        torrent: TorrentRef::new(
            &listing.locator,
            listing.seeds,
            listing.peers,
            source,
            &listing.title,
        ),
    })
}

fn is_title_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '.' | '_' | '-' | '(' | ')' | '[' | ']')
}

/// Split a movie title at its release year.
///
/// Titles may themselves contain year-like tokens ("Blade Runner 2049"),
/// so the last year token that is not in the future wins.
fn split_movie_year(title: &str) -> Option<(&str, u32)> {
    let latest = chrono::Utc::now().year() as u32 + 1;
    YEAR_RE
        .captures_iter(title)
        .filter_map(|caps| {
            let token = caps.get(1)?;
            let closed = title[token.end()..]
                .chars()
                .next()
                .map_or(true, is_title_separator);
            let year: u32 = token.as_str().parse().ok()?;
            let prefix = title[..token.start()].trim_end_matches(is_title_separator);
            (closed && year <= latest && !prefix.is_empty()).then_some((prefix, year))
        })
        .last()
}

/// Extract a movie identity (`Title (Year)` / `Title.Year.`) from a listing.
pub fn parse_movie_listing(
    listing: &Listing,
    source: &str,
    language: &str,
    aliases: &AliasTable,
) -> Option<ExtractedMovie> {
    let Some((title, year)) = split_movie_year(&listing.title) else {
        debug!(source = source, title = %listing.title, "No movie pattern matched");
        return None;
    };

    let normalized_title = normalize_title(title);

    let base = slugify(&normalized_title);
    if base.is_empty() {
        return None;
    }
    let slug = aliases.resolve(&format!("{}-{}", base, year));

    Some(ExtractedMovie {
        raw_title: listing.title.clone(),
        normalized_title,
        slug,
        year: Some(year),
        language: language.to_string(),
        quality: Quality::from_title(&listing.title),
        torrent: TorrentRef::new(
            &listing.locator,
            listing.seeds,
            listing.peers,
            source,
            &listing.title,
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::slug::is_valid_slug;

    fn listing(title: &str, seeds: u32) -> Listing {
        Listing {
            title: title.to_string(),
            locator: format!("magnet:?xt=urn:btih:{}", slugify(title)),
            seeds,
            peers: 1,
            size_bytes: None,
            published_at: None,
        }
    }

    fn parse(title: &str) -> Option<ExtractedIdentity> {
        parse_show_listing(&listing(title, 10), "eztv", &AliasTable::new())
    }

    #[test]
    fn test_season_episode_marker() {
        let id = parse("Show.Name.S01E02.720p-GRP").unwrap();
        assert_eq!(id.slug, "show-name");
        assert_eq!(id.normalized_title, "Show Name");
        assert_eq!(id.season(), Some(1));
        assert_eq!(id.episode(), Some(2));
        assert_eq!(id.quality, Quality::P720);
        assert_eq!(id.pattern, TitlePattern::SeasonEpisode);
        assert_eq!(id.torrent.seeds, 10);
        assert_eq!(id.torrent.source, "eztv");
        assert!(!id.is_date_based());
    }

    #[test]
    fn test_season_episode_with_spaces() {
        let id = parse("The Walking Dead S10E15 1080p WEB H264-GGEZ").unwrap();
        assert_eq!(id.slug, "the-walking-dead");
        assert_eq!(id.season(), Some(10));
        assert_eq!(id.episode(), Some(15));
        assert_eq!(id.quality, Quality::P1080);
    }

    #[test]
    fn test_cross_marker() {
        let id = parse("Show Name 3x07 HDTV x264").unwrap();
        assert_eq!(id.slug, "show-name");
        assert_eq!(id.season(), Some(3));
        assert_eq!(id.episode(), Some(7));
        assert_eq!(id.quality, Quality::P480);
        assert_eq!(id.pattern, TitlePattern::Cross);
    }

    #[test]
    fn test_release_group_single_season() {
        let id = parse("[HorribleSubs] One Punch Man - 05 [720p].mkv").unwrap();
        assert_eq!(id.slug, "one-punch-man");
        assert_eq!(id.season(), Some(1));
        assert_eq!(id.episode(), Some(5));
        assert_eq!(id.quality, Quality::P720);
        assert_eq!(id.pattern, TitlePattern::ReleaseGroup);
    }

    #[test]
    fn test_release_group_second_season() {
        let id = parse("[HorribleSubs] One Punch Man S2 - 11 [1080p].mkv").unwrap();
        assert_eq!(id.slug, "one-punch-man");
        assert_eq!(id.season(), Some(2));
        assert_eq!(id.episode(), Some(11));

        let id = parse("[Erai-raws] Attack on Titan 2nd Season - 03 [480p]").unwrap();
        assert_eq!(id.slug, "attack-on-titan");
        assert_eq!(id.season(), Some(2));
        assert_eq!(id.episode(), Some(3));
    }

    #[test]
    fn test_air_date_marker() {
        let id = parse("The.Daily.Show.2019.05.01.Guest.Name.720p.WEB").unwrap();
        assert_eq!(id.slug, "the-daily-show");
        assert!(id.is_date_based());
        assert_eq!(id.air_date(), NaiveDate::from_ymd_opt(2019, 5, 1));
        assert_eq!(id.season(), None);
        assert_eq!(id.pattern, TitlePattern::AirDate);
    }

    #[test]
    fn test_invalid_air_date_is_a_miss() {
        assert!(parse("The.Daily.Show.2019.13.45.720p").is_none());
    }

    #[test]
    fn test_season_episode_beats_air_date() {
        let id = parse("Show.2019.05.01.S02E03.720p").unwrap();
        assert_eq!(id.season(), Some(2));
        assert_eq!(id.episode(), Some(3));
    }

    #[test]
    fn test_unmatched_title_is_none() {
        assert!(parse("Some Random Documentary HDTV").is_none());
        assert!(parse("S01E02").is_none());
    }

    #[test]
    fn test_aliases_applied_last() {
        let aliases = AliasTable::with_defaults();
        let id = parse_show_listing(&listing("The.Office.US.S09E23.720p", 3), "eztv", &aliases)
            .unwrap();
        assert_eq!(id.slug, "the-office");
        assert_eq!(id.normalized_title, "The Office US");
    }

    #[test]
    fn test_repack_detection() {
        let id = parse("Show.Name.S01E02.REPACK.720p-GRP").unwrap();
        assert!(id.torrent.repack);
        assert!(is_repack("Show.Name.S01E02.PROPER.1080p"));
        assert!(!is_repack("Repackaged.Goods.S01E01.720p"));
    }

    #[test]
    fn test_matched_slugs_are_well_formed() {
        let titles = [
            "Show.Name.S01E02.720p-GRP",
            "Marvel's.Agents.of.S.H.I.E.L.D.S05E01.720p",
            "Mr. Robot - 2x04 - eps2.2",
            "[SubsPlease] Jujutsu Kaisen (2nd Season) - 01 (1080p)",
            "Last.Week.Tonight.2021.03.14.1080p",
            "_Show_Name_ S1E1",
        ];
        for title in titles {
            if let Some(id) = parse(title) {
                assert!(is_valid_slug(&id.slug), "bad slug {:?} for {:?}", id.slug, title);
            }
        }
    }

    #[test]
    fn test_movie_listing() {
        let movie = parse_movie_listing(
            &listing("Inception (2010) [1080p] [BluRay]", 120),
            "yts",
            "en",
            &AliasTable::new(),
        )
        .unwrap();
        assert_eq!(movie.normalized_title, "Inception");
        assert_eq!(movie.slug, "inception-2010");
        assert_eq!(movie.year, Some(2010));
        assert_eq!(movie.quality, Quality::P1080);
        assert_eq!(movie.language, "en");
    }

    #[test]
    fn test_movie_listing_dotted() {
        let movie = parse_movie_listing(
            &listing("The.Matrix.1999.720p.BrRip.x264", 40),
            "yts",
            "en",
            &AliasTable::new(),
        )
        .unwrap();
        assert_eq!(movie.slug, "the-matrix-1999");
        assert_eq!(movie.quality, Quality::P720);
    }

    #[test]
    fn test_movie_title_containing_a_year() {
        let movie = parse_movie_listing(
            &listing("Blade Runner 2049 (2017) [1080p]", 90),
            "yts",
            "en",
            &AliasTable::new(),
        )
        .unwrap();
        assert_eq!(movie.normalized_title, "Blade Runner 2049");
        assert_eq!(movie.slug, "blade-runner-2049-2017");
        assert_eq!(movie.year, Some(2017));

        let movie = parse_movie_listing(
            &listing("1917.2019.1080p.BluRay", 30),
            "yts",
            "en",
            &AliasTable::new(),
        )
        .unwrap();
        assert_eq!(movie.slug, "1917-2019");
    }

    #[test]
    fn test_movie_future_year_token_is_skipped() {
        let movie = parse_movie_listing(
            &listing("Space.Odyssey.2099.1968.720p", 3),
            "yts",
            "en",
            &AliasTable::new(),
        )
        .unwrap();
        assert_eq!(movie.normalized_title, "Space Odyssey 2099");
        assert_eq!(movie.year, Some(1968));

        assert!(parse_movie_listing(
            &listing("Far.Future.2099.720p", 3),
            "yts",
            "en",
            &AliasTable::new()
        )
        .is_none());
    }

    #[test]
    fn test_movie_without_year_is_none() {
        assert!(parse_movie_listing(
            &listing("Some Movie 1080p", 1),
            "yts",
            "en",
            &AliasTable::new()
        )
        .is_none());
    }
}
