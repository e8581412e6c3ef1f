//! The quality-slot tie-break rule.
//!
//! Used both when folding one source's listings and when merging a fresh
//! candidate into a stored record. `found` is the torrent already in the
//! slot, `matching` the one competing for it.

use crate::content::TorrentRef;

/// Whether `matching` takes the slot currently held by `found`.
///
/// It does when the slot is empty or when it is the same release (a
/// refresh). Otherwise torrents rank by `(repack, seeds)`: a repack beats
/// any non-repack, a non-repack never takes a slot from a repack, and
/// within the same class more seeds win. Ties keep the slot.
pub fn should_replace(found: Option<&TorrentRef>, matching: &TorrentRef) -> bool {
    match found {
        None => true,
        Some(found) => matching.locator == found.locator || rank(matching) > rank(found),
    }
}

fn rank(torrent: &TorrentRef) -> (bool, u32) {
    (torrent.repack, torrent.seeds)
}

/// Resolve one slot and report whether its content changed.
///
/// A refresh of the same release keeps the higher of the two seed counts,
/// so a slot's seed count only ever drops when a repack takes over.
pub fn merge_slot(found: Option<&TorrentRef>, matching: &TorrentRef) -> (TorrentRef, bool) {
    let Some(existing) = found else {
        return (matching.clone(), true);
    };

    if !should_replace(found, matching) {
        return (existing.clone(), false);
    }

    let mut winner = matching.clone();
    if winner.locator == existing.locator {
        winner.seeds = winner.seeds.max(existing.seeds);
    }
    let changed = &winner != existing;
    (winner, changed)
}
