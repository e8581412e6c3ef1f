//! Driving a source through all of its pages.

use tracing::{debug, warn};

use super::{Listing, SourceError, SourceQuery, TorrentSource};
use crate::retry::RetryPolicy;

/// Upper bound on pages fetched from one source in a run.
pub const MAX_PAGES: u32 = 500;

/// Fetch pages `1..=total_pages` one after the other and concatenate them.
///
/// Each page request goes through `retry`. Failing the first page fails the
/// whole source; failing a later page ends pagination with what was
/// collected so far.
pub async fn collect_listings(
    source: &dyn TorrentSource,
    base: &SourceQuery,
    retry: &RetryPolicy,
) -> Result<Vec<Listing>, SourceError> {
    let first_query = base.with_page(1);
    let first = retry
        .run(source.name(), || source.search(&first_query))
        .await?;

    let total_pages = first.total_pages.clamp(1, MAX_PAGES);
    let mut listings = first.results;
    debug!(source = %source.name(), total_pages = total_pages, "Fetched first page");

    for page in 2..=total_pages {
        let query = base.with_page(page);
        match retry.run(source.name(), || source.search(&query)).await {
            Ok(mut next) => listings.append(&mut next.results),
            Err(e) => {
                warn!(
                    source = %source.name(),
                    page = page,
                    error = %e,
                    "Page failed, keeping earlier pages"
                );
                break;
            }
        }
    }

    Ok(listings)
}
