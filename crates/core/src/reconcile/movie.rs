use chrono::Utc;

use super::{refresh_info, ReconcileOutcome};
use crate::batch::merge_slot;
use crate::content::Movie;

/// Merge a freshly enriched movie into the stored one, independently per
/// language and quality.
pub fn reconcile_movie(
    existing: Option<&Movie>,
    candidate: Movie,
    placeholder: &str,
) -> (Movie, ReconcileOutcome) {
    let Some(existing) = existing else {
        return (candidate, ReconcileOutcome::Created);
    };

    let mut merged = existing.clone();
    merged.info = refresh_info(&existing.info, &candidate.info, placeholder);
    merged.released = candidate.released.clone().or(merged.released);
    merged.certification = candidate.certification.clone().or(merged.certification);
    merged.trailer = candidate.trailer.clone().or(merged.trailer);

    for (language, slots) in &candidate.torrents {
        let stored = merged.torrents.entry(language.clone()).or_default();
        for (quality, torrent) in slots {
            let (winner, changed) = merge_slot(stored.get(quality), torrent);
            if changed {
                stored.insert(*quality, winner);
            }
        }
    }

    if &merged == existing {
        return (merged, ReconcileOutcome::Unchanged);
    }
    merged.info.last_updated = Utc::now();
    (merged, ReconcileOutcome::Updated)
}
