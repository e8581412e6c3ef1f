//! Resolution tiers and the per-episode quality slot map.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use super::TorrentRef;

static QUALITY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(\d{3,4})p\b").unwrap());

/// Resolution tier of a torrent.
///
/// The set is closed: anything unrecognised collapses to [`Quality::P480`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Quality {
    #[serde(rename = "480p")]
    P480,
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "2160p")]
    P2160,
}

impl Quality {
    pub const ALL: [Quality; 4] = [Quality::P480, Quality::P720, Quality::P1080, Quality::P2160];

    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::P480 => "480p",
            Quality::P720 => "720p",
            Quality::P1080 => "1080p",
            Quality::P2160 => "2160p",
        }
    }

    /// Extract the first `NNNp` marker from a listing title.
    pub fn from_title(title: &str) -> Quality {
        QUALITY_RE
            .captures_iter(title)
            .filter_map(|caps| caps.get(1))
            .find_map(|m| format!("{}p", m.as_str()).parse().ok())
            .unwrap_or_default()
    }
}

impl Default for Quality {
    fn default() -> Self {
        Quality::P480
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "480p" => Ok(Quality::P480),
            "720p" => Ok(Quality::P720),
            "1080p" => Ok(Quality::P1080),
            "2160p" => Ok(Quality::P2160),
            other => Err(format!("unknown quality: {}", other)),
        }
    }
}

/// Best torrent per resolution tier.
pub type Slots = BTreeMap<Quality, TorrentRef>;

/// Quality slots of one episode plus the synthetic fallback slot.
///
/// The fallback is what a client plays when it does not care about
/// resolution; it tracks the 480p torrent, or the 720p one when no 480p
/// release is known.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityMap {
    #[serde(default)]
    pub slots: Slots,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<TorrentRef>,
}

impl QualityMap {
    /// Build from deduplicated slots, deriving the fallback.
    pub fn from_slots(slots: Slots) -> Self {
        let fallback = slots
            .get(&Quality::P480)
            .or_else(|| slots.get(&Quality::P720))
            .cloned();
        Self { slots, fallback }
    }

    pub fn get(&self, quality: Quality) -> Option<&TorrentRef> {
        self.slots.get(&quality)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn torrent(locator: &str, seeds: u32) -> TorrentRef {
        TorrentRef::new(locator, seeds, 0, "test", locator)
    }

    #[test]
    fn test_quality_from_title() {
        assert_eq!(Quality::from_title("Show.Name.S01E02.720p-GRP"), Quality::P720);
        assert_eq!(Quality::from_title("Movie 2010 1080p BluRay"), Quality::P1080);
        assert_eq!(Quality::from_title("Show 2160P WEB"), Quality::P2160);
    }

    #[test]
    fn test_quality_defaults_to_480p() {
        assert_eq!(Quality::from_title("Show.Name.S01E02.HDTV.x264"), Quality::P480);
        // 576p is outside the closed set
        assert_eq!(Quality::from_title("Show.Name.S01E02.576p"), Quality::P480);
    }

    #[test]
    fn test_quality_serialization() {
        assert_eq!(serde_json::to_string(&Quality::P1080).unwrap(), "\"1080p\"");
        let parsed: Quality = serde_json::from_str("\"720p\"").unwrap();
        assert_eq!(parsed, Quality::P720);
    }

    #[test]
    fn test_fallback_prefers_480p() {
        let mut slots = Slots::new();
        slots.insert(Quality::P720, torrent("b", 5));
        slots.insert(Quality::P480, torrent("a", 1));
        let map = QualityMap::from_slots(slots);
        assert_eq!(map.fallback.unwrap().locator, "a");
    }

    #[test]
    fn test_fallback_uses_720p_without_480p() {
        let mut slots = Slots::new();
        slots.insert(Quality::P720, torrent("b", 5));
        slots.insert(Quality::P1080, torrent("c", 50));
        let map = QualityMap::from_slots(slots);
        assert_eq!(map.fallback.unwrap().locator, "b");
    }

    #[test]
    fn test_no_fallback_for_high_quality_only() {
        let mut slots = Slots::new();
        slots.insert(Quality::P1080, torrent("c", 50));
        let map = QualityMap::from_slots(slots);
        assert!(map.fallback.is_none());
    }
}
