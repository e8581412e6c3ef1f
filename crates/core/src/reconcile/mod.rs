//! Merging fresh candidates into stored records.
//!
//! Merging never drops an episode, season or language, and a quality slot
//! only changes hands under the slot rule shared with batch deduplication.
//! Re-running a merge with the same candidate changes nothing.

mod commit;
mod movie;
mod show;

pub use commit::{ReconcileError, Reconciler};
pub use movie::reconcile_movie;
pub use show::{merge_quality_map, reconcile_show};

use serde::Serialize;

use crate::content::ContentInfo;

/// What a merge did to the stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileOutcome {
    /// No record existed; the candidate was stored as is.
    Created,
    /// The stored record changed.
    Updated,
    /// Merging produced the stored record again.
    Unchanged,
}

impl ReconcileOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconcileOutcome::Created => "created",
            ReconcileOutcome::Updated => "updated",
            ReconcileOutcome::Unchanged => "unchanged",
        }
    }
}

/// Catalog fields of a stored record refreshed from a new enrichment.
///
/// The id and the last-updated stamp stay; a placeholder image never
/// replaces a real one.
fn refresh_info(existing: &ContentInfo, fresh: &ContentInfo, placeholder: &str) -> ContentInfo {
    ContentInfo {
        id: existing.id.clone(),
        ids: fresh.ids.clone(),
        title: fresh.title.clone(),
        year: fresh.year.or(existing.year),
        slug: fresh.slug.clone(),
        synopsis: if fresh.synopsis.is_empty() {
            existing.synopsis.clone()
        } else {
            fresh.synopsis.clone()
        },
        runtime: fresh.runtime.or(existing.runtime),
        rating: fresh.rating.clone(),
        images: existing.images.prefer_real(&fresh.images, placeholder),
        genres: if fresh.genres.is_empty() {
            existing.genres.clone()
        } else {
            fresh.genres.clone()
        },
        kind: existing.kind,
        last_updated: existing.last_updated,
    }
}
