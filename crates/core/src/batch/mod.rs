//! Per-source batch deduplication.
//!
//! Extractions from one source are folded into one candidate per
//! `(normalized title, slug)`. Within a candidate every episode (or movie
//! language) keeps a single torrent per quality, chosen by the slot rule in
//! [`slot`], which the reconciliation engine reuses against stored records.

mod dedup;
pub mod slot;
mod types;

pub use dedup::{dedup_movies, dedup_shows, MovieBatch, ShowBatch};
pub use slot::{merge_slot, should_replace};
pub use types::{Candidate, CandidateEpisodes, MovieCandidate, ShowCandidate};
