//! Candidate records produced by deduplicating one source's batch.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::content::{LanguageSlots, Slots};

/// Deduplicated torrents of one show, in the shape its listings used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CandidateEpisodes {
    /// season -> episode -> quality slots.
    Seasonal {
        seasons: BTreeMap<u32, BTreeMap<u32, Slots>>,
    },
    /// air date -> quality slots.
    DateBased { dates: BTreeMap<NaiveDate, Slots> },
}

impl CandidateEpisodes {
    pub fn is_date_based(&self) -> bool {
        matches!(self, CandidateEpisodes::DateBased { .. })
    }

    /// Number of distinct episodes carrying at least one torrent.
    pub fn episode_count(&self) -> usize {
        match self {
            CandidateEpisodes::Seasonal { seasons } => seasons.values().map(|e| e.len()).sum(),
            CandidateEpisodes::DateBased { dates } => dates.len(),
        }
    }

    /// Number of torrents across all slots.
    pub fn torrent_count(&self) -> usize {
        match self {
            CandidateEpisodes::Seasonal { seasons } => seasons
                .values()
                .flat_map(|episodes| episodes.values())
                .map(|slots| slots.len())
                .sum(),
            CandidateEpisodes::DateBased { dates } => dates.values().map(|s| s.len()).sum(),
        }
    }
}

/// A show as seen by one source, before catalog enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowCandidate {
    pub title: String,
    pub slug: String,
    pub episodes: CandidateEpisodes,
}

/// A movie as seen by one source, before catalog enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieCandidate {
    pub title: String,
    pub slug: String,
    pub year: Option<u32>,
    pub torrents: LanguageSlots,
}

/// What a source batch boils down to.
#[derive(Debug, Clone, PartialEq)]
pub enum Candidate {
    Show(ShowCandidate),
    Movie(MovieCandidate),
}

impl Candidate {
    pub fn slug(&self) -> &str {
        match self {
            Candidate::Show(show) => &show.slug,
            Candidate::Movie(movie) => &movie.slug,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Candidate::Show(show) => &show.title,
            Candidate::Movie(movie) => &movie.title,
        }
    }
}
