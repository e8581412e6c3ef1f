use std::collections::HashMap;

use chrono::Utc;

use super::{refresh_info, ReconcileOutcome};
use crate::batch::merge_slot;
use crate::content::{Episode, Quality, QualityMap, Show};

/// Merge `incoming` slots into `found`, slot by slot. Returns whether
/// anything changed.
///
/// An update of the 480p slot is mirrored into the fallback slot.
pub fn merge_quality_map(found: &mut QualityMap, incoming: &QualityMap) -> bool {
    let mut changed = false;

    for (quality, torrent) in &incoming.slots {
        let (merged, slot_changed) = merge_slot(found.slots.get(quality), torrent);
        if !slot_changed {
            continue;
        }
        if *quality == Quality::P480 {
            found.fallback = Some(merged.clone());
        }
        found.slots.insert(*quality, merged);
        changed = true;
    }

    if found.fallback.is_none() {
        let derived = found
            .slots
            .get(&Quality::P480)
            .or_else(|| found.slots.get(&Quality::P720))
            .cloned();
        if derived.is_some() {
            found.fallback = derived;
            changed = true;
        }
    }

    changed
}

fn merge_episode(found: &mut Episode, incoming: &Episode) {
    if !incoming.title.is_empty() {
        found.title = incoming.title.clone();
    }
    if !incoming.overview.is_empty() {
        found.overview = incoming.overview.clone();
    }
    found.air_time = match (found.air_time, incoming.air_time) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    };
    found.tvdb_id = incoming.tvdb_id.or(found.tvdb_id);
    merge_quality_map(&mut found.torrents, &incoming.torrents);
}

/// Merge a freshly enriched and filled show into the stored one.
///
/// Stored episodes the candidate lacks are carried forward; candidate
/// episodes the store lacks are appended.
pub fn reconcile_show(
    existing: Option<&Show>,
    candidate: Show,
    placeholder: &str,
) -> (Show, ReconcileOutcome) {
    let Some(existing) = existing else {
        let mut created = candidate;
        let air_times: Vec<_> = created.episodes.iter().map(|e| e.air_time).collect();
        for at in air_times {
            created.observe_air_time(at);
        }
        created.recount_seasons();
        return (created, ReconcileOutcome::Created);
    };

    let mut merged = existing.clone();
    merged.info = refresh_info(&existing.info, &candidate.info, placeholder);
    merged.air_day = candidate.air_day.clone().or(merged.air_day);
    merged.network = candidate.network.clone().or(merged.network);
    merged.status = candidate.status.clone().or(merged.status);

    let mut incoming: HashMap<(u32, u32), &Episode> =
        candidate.episodes.iter().map(|e| (e.key(), e)).collect();

    for episode in merged.episodes.iter_mut() {
        if let Some(fresh) = incoming.remove(&episode.key()) {
            merge_episode(episode, fresh);
        }
    }

    // Appended in candidate order.
    for episode in &candidate.episodes {
        if incoming.remove(&episode.key()).is_some() {
            merged.episodes.push(episode.clone());
        }
    }

    let air_times: Vec<_> = merged.episodes.iter().map(|e| e.air_time).collect();
    for at in air_times {
        merged.observe_air_time(at);
    }
    merged.observe_air_time(candidate.latest_episode_air_time);
    merged.recount_seasons();

    if &merged == existing {
        return (merged, ReconcileOutcome::Unchanged);
    }
    merged.info.last_updated = Utc::now();
    (merged, ReconcileOutcome::Updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Images, TorrentRef};
    use crate::testing::fixtures;
    use chrono::{Duration, TimeZone};

    const PLACEHOLDER: &str = "images/posterholder.png";

    fn torrent(locator: &str, seeds: u32) -> TorrentRef {
        TorrentRef::new(locator, seeds, 1, "eztv", locator)
    }

    fn with_slot(mut show: Show, key: (u32, u32), quality: Quality, t: TorrentRef) -> Show {
        let episode = show
            .episodes
            .iter_mut()
            .find(|e| e.key() == key)
            .unwrap();
        episode.torrents = QualityMap::from_slots([(quality, t)].into_iter().collect());
        show
    }

    #[test]
    fn test_new_record_is_candidate_with_recount() {
        let mut candidate = fixtures::show("tt1", "show-name", &[(1, 1), (2, 1), (2, 2)]);
        candidate.num_seasons = 0;
        let (created, outcome) = reconcile_show(None, candidate, PLACEHOLDER);
        assert_eq!(outcome, ReconcileOutcome::Created);
        assert_eq!(created.num_seasons, 2);
        assert_eq!(created.episodes.len(), 3);
        assert!(created.latest_episode_air_time.is_some());
    }

    #[test]
    fn test_keeps_higher_seeded_stored_torrent() {
        let existing = with_slot(
            fixtures::show("tt1", "show-name", &[(1, 1)]),
            (1, 1),
            Quality::P1080,
            torrent("magnet:old", 50),
        );
        let candidate = with_slot(
            fixtures::show("tt1", "show-name", &[(1, 1)]),
            (1, 1),
            Quality::P1080,
            torrent("magnet:new", 10),
        );

        let (merged, _) = reconcile_show(Some(&existing), candidate, PLACEHOLDER);
        let slot = merged.episodes[0].torrents.get(Quality::P1080).unwrap();
        assert_eq!(slot.locator, "magnet:old");
        assert_eq!(slot.seeds, 50);
    }

    #[test]
    fn test_never_drops_episodes() {
        let existing = fixtures::show("tt1", "show-name", &[(1, 1), (1, 2), (2, 1)]);
        let candidate = fixtures::show("tt1", "show-name", &[(1, 2), (3, 1)]);

        let (merged, outcome) = reconcile_show(Some(&existing), candidate, PLACEHOLDER);
        assert_eq!(outcome, ReconcileOutcome::Updated);
        let keys: Vec<_> = merged.episodes.iter().map(|e| e.key()).collect();
        assert_eq!(keys, vec![(1, 1), (1, 2), (2, 1), (3, 1)]);
        assert_eq!(merged.num_seasons, 3);
        assert!(merged.episodes.len() >= existing.episodes.len());
    }

    #[test]
    fn test_merge_is_idempotent() {
        let existing = fixtures::show("tt1", "show-name", &[(1, 1)]);
        let candidate = with_slot(
            fixtures::show("tt1", "show-name", &[(1, 1), (1, 2)]),
            (1, 1),
            Quality::P720,
            torrent("magnet:better", 900),
        );

        let (once, first) = reconcile_show(Some(&existing), candidate.clone(), PLACEHOLDER);
        assert_eq!(first, ReconcileOutcome::Updated);
        let (twice, second) = reconcile_show(Some(&once), candidate, PLACEHOLDER);
        assert_eq!(second, ReconcileOutcome::Unchanged);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_480p_update_mirrors_into_fallback() {
        let existing = with_slot(
            fixtures::show("tt1", "show-name", &[(1, 1)]),
            (1, 1),
            Quality::P480,
            torrent("magnet:sd-old", 1),
        );
        let candidate = with_slot(
            fixtures::show("tt1", "show-name", &[(1, 1)]),
            (1, 1),
            Quality::P480,
            torrent("magnet:sd-new", 30),
        );

        let (merged, _) = reconcile_show(Some(&existing), candidate, PLACEHOLDER);
        let torrents = &merged.episodes[0].torrents;
        assert_eq!(torrents.get(Quality::P480).unwrap().locator, "magnet:sd-new");
        assert_eq!(torrents.fallback.as_ref().unwrap().locator, "magnet:sd-new");
    }

    #[test]
    fn test_merge_quality_map_fills_missing_fallback() {
        let mut found = QualityMap::default();
        let incoming = QualityMap::from_slots(
            [(Quality::P720, torrent("magnet:hd", 3))].into_iter().collect(),
        );
        assert!(merge_quality_map(&mut found, &incoming));
        assert_eq!(found.fallback.unwrap().locator, "magnet:hd");
    }

    #[test]
    fn test_watermark_never_moves_backwards() {
        let mut existing = fixtures::show("tt1", "show-name", &[(1, 1)]);
        let late = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        existing.latest_episode_air_time = Some(late);

        let mut candidate = fixtures::show("tt1", "show-name", &[(1, 2)]);
        candidate.episodes[0].air_time = Some(late - Duration::days(30));
        candidate.latest_episode_air_time = candidate.episodes[0].air_time;

        let (merged, _) = reconcile_show(Some(&existing), candidate, PLACEHOLDER);
        assert_eq!(merged.latest_episode_air_time, Some(late));

        let mut newer = fixtures::show("tt1", "show-name", &[(1, 3)]);
        let later = late + Duration::days(7);
        newer.episodes[0].air_time = Some(later);
        let (merged, _) = reconcile_show(Some(&merged), newer, PLACEHOLDER);
        assert_eq!(merged.latest_episode_air_time, Some(later));
    }

    #[test]
    fn test_placeholder_never_replaces_real_image() {
        let mut existing = fixtures::show("tt1", "show-name", &[(1, 1)]);
        existing.info.images = Images {
            banner: "real/banner.jpg".into(),
            fanart: PLACEHOLDER.into(),
            poster: "real/poster.jpg".into(),
        };
        let mut candidate = fixtures::show("tt1", "show-name", &[(1, 1)]);
        candidate.info.images = Images {
            banner: PLACEHOLDER.into(),
            fanart: "real/fanart.jpg".into(),
            poster: PLACEHOLDER.into(),
        };

        let (merged, _) = reconcile_show(Some(&existing), candidate, PLACEHOLDER);
        assert_eq!(merged.info.images.banner, "real/banner.jpg");
        assert_eq!(merged.info.images.fanart, "real/fanart.jpg");
        assert_eq!(merged.info.images.poster, "real/poster.jpg");
    }

    #[test]
    fn test_seed_counts_never_regress_without_repack() {
        let existing = with_slot(
            fixtures::show("tt1", "show-name", &[(1, 1)]),
            (1, 1),
            Quality::P720,
            torrent("magnet:a", 40),
        );
        for (locator, seeds) in [("magnet:a", 2), ("magnet:b", 39), ("magnet:c", 0)] {
            let candidate = with_slot(
                fixtures::show("tt1", "show-name", &[(1, 1)]),
                (1, 1),
                Quality::P720,
                torrent(locator, seeds),
            );
            let (merged, _) = reconcile_show(Some(&existing), candidate, PLACEHOLDER);
            assert!(merged.episodes[0].torrents.get(Quality::P720).unwrap().seeds >= 40);
        }
    }
}
