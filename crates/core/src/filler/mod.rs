//! Building typed episodes from a candidate's torrents and catalog data.
//!
//! Seasonal shows fetch each season the candidate mentions. Date-based shows
//! fetch the whole series once and match episodes by first-aired date.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, warn};

use crate::batch::CandidateEpisodes;
use crate::content::{Episode, QualityMap, Slots};
use crate::metadata::{CatalogEpisode, MetadataError, MetadataProvider};
use crate::retry::RetryPolicy;

/// Episodes built for one show.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FillOutcome {
    pub episodes: Vec<Episode>,
    /// Latest air time among `episodes`.
    pub latest_air_time: Option<DateTime<Utc>>,
    /// Seasons whose metadata could not be fetched. For date-based shows a
    /// failed series lookup is reported as season 0.
    pub failed_seasons: Vec<(u32, MetadataError)>,
}

impl FillOutcome {
    fn push(&mut self, episode: Episode) {
        if let Some(at) = episode.air_time {
            if self.latest_air_time.map_or(true, |known| at > known) {
                self.latest_air_time = Some(at);
            }
        }
        self.episodes.push(episode);
    }
}

/// Build the episodes of `slug` that have torrents in `candidate`.
///
/// A season whose lookup fails is skipped; the others are still filled.
pub async fn fill_episodes(
    catalog: &dyn MetadataProvider,
    retry: &RetryPolicy,
    slug: &str,
    candidate: &CandidateEpisodes,
) -> FillOutcome {
    match candidate {
        CandidateEpisodes::Seasonal { seasons } => fill_seasonal(catalog, retry, slug, seasons).await,
        CandidateEpisodes::DateBased { dates } => fill_date_based(catalog, retry, slug, dates).await,
    }
}

async fn fill_seasonal(
    catalog: &dyn MetadataProvider,
    retry: &RetryPolicy,
    slug: &str,
    seasons: &BTreeMap<u32, BTreeMap<u32, Slots>>,
) -> FillOutcome {
    let mut outcome = FillOutcome::default();

    for (&season, torrents) in seasons {
        let listing = match retry
            .run("season episodes", || catalog.season(slug, season))
            .await
        {
            Ok(listing) => listing,
            Err(e) => {
                warn!(slug = slug, season = season, error = %e, "Season lookup failed, skipping season");
                outcome.failed_seasons.push((season, e));
                continue;
            }
        };

        let mut seen = BTreeSet::new();
        for catalog_episode in listing {
            let Some(slots) = torrents.get(&catalog_episode.number) else {
                continue;
            };
            if !seen.insert(catalog_episode.number) {
                continue;
            }
            outcome.push(build_episode(&catalog_episode, season, slots, false));
        }

        let unmatched = torrents.keys().filter(|n| !seen.contains(*n)).count();
        if unmatched > 0 {
            debug!(slug = slug, season = season, unmatched = unmatched, "Episodes unknown to the catalog");
        }
    }

    outcome
}

async fn fill_date_based(
    catalog: &dyn MetadataProvider,
    retry: &RetryPolicy,
    slug: &str,
    dates: &BTreeMap<NaiveDate, Slots>,
) -> FillOutcome {
    let mut outcome = FillOutcome::default();

    let listing = match retry
        .run("series episodes", || catalog.all_episodes(slug))
        .await
    {
        Ok(listing) => listing,
        Err(e) => {
            warn!(slug = slug, error = %e, "Series lookup failed");
            outcome.failed_seasons.push((0, e));
            return outcome;
        }
    };

    let mut seen = BTreeSet::new();
    for catalog_episode in listing {
        if catalog_episode.season == 0 {
            continue;
        }
        let Some(aired) = catalog_episode.first_aired else {
            continue;
        };
        let day = aired.date_naive();
        let Some(slots) = dates.get(&day) else {
            continue;
        };
        // Two catalog episodes on the same day share the torrents; the first wins.
        if !seen.insert(day) {
            continue;
        }
        outcome.push(build_episode(&catalog_episode, catalog_episode.season, slots, true));
    }

    outcome
}

fn build_episode(catalog: &CatalogEpisode, season: u32, slots: &Slots, date_based: bool) -> Episode {
    Episode {
        season,
        episode: catalog.number,
        title: catalog.title.clone(),
        overview: catalog.overview.clone(),
        date_based,
        air_time: catalog.first_aired,
        tvdb_id: catalog.tvdb_id,
        torrents: QualityMap::from_slots(slots.clone()),
    }
}
