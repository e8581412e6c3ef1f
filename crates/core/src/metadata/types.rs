//! Catalog records as returned by metadata providers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::content::CatalogIds;

/// Show summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogShow {
    pub ids: CatalogIds,
    pub title: String,
    pub year: Option<u32>,
    pub overview: String,
    pub runtime: Option<u32>,
    /// Average rating on a 0-10 scale.
    pub rating: f32,
    pub votes: u64,
    pub genres: Vec<String>,
    pub air_day: Option<String>,
    pub network: Option<String>,
    pub status: Option<String>,
}

/// Movie summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogMovie {
    pub ids: CatalogIds,
    pub title: String,
    pub year: Option<u32>,
    pub overview: String,
    pub runtime: Option<u32>,
    /// Average rating on a 0-10 scale.
    pub rating: f32,
    pub votes: u64,
    pub genres: Vec<String>,
    pub released: Option<String>,
    pub certification: Option<String>,
    pub trailer: Option<String>,
}

/// One episode as the catalog knows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEpisode {
    pub season: u32,
    pub number: u32,
    pub title: String,
    pub overview: String,
    pub first_aired: Option<DateTime<Utc>>,
    pub tvdb_id: Option<u64>,
}

/// Scale a 0-10 rating to a 0-100 percentage.
pub fn rating_percentage(rating: f32) -> u8 {
    if !rating.is_finite() {
        return 0;
    }
    (rating * 10.0).round().clamp(0.0, 100.0) as u8
}
