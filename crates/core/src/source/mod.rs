//! Torrent listing sources.
//!
//! A [`TorrentSource`] answers one page of a query at a time;
//! [`collect_listings`] drives it through every page.

mod eztv;
mod paginate;
mod torznab;
mod types;

use std::sync::Arc;
use std::time::Duration;

pub use eztv::EztvSource;
pub use paginate::{collect_listings, MAX_PAGES};
pub use torznab::TorznabSource;
pub use types::*;

use crate::config::{SourceBackend, SourceConfig};

/// Build the backend a source configuration asks for.
pub fn build_source(
    config: &SourceConfig,
    timeout: Duration,
) -> Result<Arc<dyn TorrentSource>, SourceError> {
    Ok(match config.backend {
        SourceBackend::Torznab => Arc::new(TorznabSource::new(config.clone(), timeout)?),
        SourceBackend::Eztv => Arc::new(EztvSource::new(config.clone(), timeout)?),
    })
}
