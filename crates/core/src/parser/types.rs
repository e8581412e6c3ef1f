//! Identities extracted from listing titles.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::content::{Quality, TorrentRef};

/// How an episodic listing identifies its episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EpisodeMarker {
    Seasonal { season: u32, episode: u32 },
    Dated { air_date: NaiveDate },
}

/// Which title pattern produced an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TitlePattern {
    SeasonEpisode,
    Cross,
    ReleaseGroup,
    AirDate,
}

/// Episode identity extracted from one show/anime listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedIdentity {
    pub raw_title: String,
    pub normalized_title: String,
    pub slug: String,
    pub marker: EpisodeMarker,
    pub pattern: TitlePattern,
    pub quality: Quality,
    pub torrent: TorrentRef,
}

impl ExtractedIdentity {
    pub fn is_date_based(&self) -> bool {
        matches!(self.marker, EpisodeMarker::Dated { .. })
    }

    pub fn season(&self) -> Option<u32> {
        match self.marker {
            EpisodeMarker::Seasonal { season, .. } => Some(season),
            EpisodeMarker::Dated { .. } => None,
        }
    }

    pub fn episode(&self) -> Option<u32> {
        match self.marker {
            EpisodeMarker::Seasonal { episode, .. } => Some(episode),
            EpisodeMarker::Dated { .. } => None,
        }
    }

    pub fn air_date(&self) -> Option<NaiveDate> {
        match self.marker {
            EpisodeMarker::Dated { air_date } => Some(air_date),
            EpisodeMarker::Seasonal { .. } => None,
        }
    }
}

/// Movie identity extracted from one movie listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedMovie {
    pub raw_title: String,
    pub normalized_title: String,
    pub slug: String,
    pub year: Option<u32>,
    pub language: String,
    pub quality: Quality,
    pub torrent: TorrentRef,
}
