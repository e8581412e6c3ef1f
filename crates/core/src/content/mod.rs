//! Content data model: canonical shows and movies with their torrents.

mod quality;
mod types;

pub use quality::{Quality, QualityMap, Slots};
pub use types::*;
