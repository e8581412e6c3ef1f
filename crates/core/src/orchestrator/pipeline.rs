//! Listing batch to stored records, for one source.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, error, info, warn};

use super::types::{ScrapeContext, ScrapeError, SourceReport};
use crate::batch::{dedup_movies, dedup_shows, Candidate, MovieCandidate, ShowCandidate};
use crate::content::{Content, ContentKind};
use crate::filler::{fill_episodes, FillOutcome};
use crate::metadata::Enricher;
use crate::metrics;
use crate::parser::{parse_movie_listing, parse_show_listing, AliasTable};
use crate::reconcile::{ReconcileOutcome, Reconciler};
use crate::scrape_log::{ScrapeFailure, ScrapeLogHandle};
use crate::source::Listing;

/// Parse a source's listings and deduplicate them into candidates.
///
/// Returns the candidates and the number of listings no pattern matched.
pub fn extract_candidates(
    ctx: &ScrapeContext,
    listings: &[Listing],
    aliases: &AliasTable,
) -> (Vec<Candidate>, usize) {
    if ctx.kind == ContentKind::Movie {
        let movies: Vec<_> = listings
            .iter()
            .filter_map(|l| parse_movie_listing(l, &ctx.source, &ctx.language, aliases))
            .collect();
        let misses = listings.len() - movies.len();
        let candidates = dedup_movies(&movies).into_iter().map(Candidate::Movie).collect();
        (candidates, misses)
    } else {
        let identities: Vec<_> = listings
            .iter()
            .filter_map(|l| parse_show_listing(l, &ctx.source, aliases))
            .collect();
        let misses = listings.len() - identities.len();
        let candidates = dedup_shows(&identities)
            .into_iter()
            .map(Candidate::Show)
            .collect();
        (candidates, misses)
    }
}

/// Enrich, fill and reconcile candidates.
pub struct ItemPipeline {
    enricher: Arc<Enricher>,
    reconciler: Arc<Reconciler>,
    scrape_log: Option<ScrapeLogHandle>,
}

impl ItemPipeline {
    pub fn new(
        enricher: Arc<Enricher>,
        reconciler: Arc<Reconciler>,
        scrape_log: Option<ScrapeLogHandle>,
    ) -> Self {
        Self {
            enricher,
            reconciler,
            scrape_log,
        }
    }

    /// Parse, deduplicate and process one source's listings, running up to
    /// `concurrency` items at a time.
    pub async fn run_source(
        &self,
        ctx: &ScrapeContext,
        listings: &[Listing],
        aliases: &AliasTable,
        concurrency: usize,
    ) -> SourceReport {
        let mut report = SourceReport::new(&ctx.source);
        report.listings = listings.len();

        let (candidates, misses) = extract_candidates(ctx, listings, aliases);
        report.parse_misses = misses;
        report.items = candidates.len();
        metrics::LISTINGS_PARSED
            .with_label_values(&[ctx.source.as_str()])
            .inc_by((listings.len() - misses) as u64);
        metrics::PARSE_MISSES
            .with_label_values(&[ctx.source.as_str()])
            .inc_by(misses as u64);
        info!(
            source = %ctx.source,
            listings = listings.len(),
            parse_misses = misses,
            items = candidates.len(),
            "Deduplicated source batch"
        );

        let results: Vec<_> = stream::iter(candidates)
            .map(|candidate| self.process(ctx, candidate))
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;

        for result in &results {
            report.record(result);
        }
        report
    }

    /// One candidate, start to finish. Failures are logged and recorded
    /// here; the caller only counts them.
    pub async fn process(
        &self,
        ctx: &ScrapeContext,
        candidate: Candidate,
    ) -> Result<ReconcileOutcome, ScrapeError> {
        let slug = candidate.slug().to_string();
        let result = match candidate {
            Candidate::Show(show) => self.process_show(ctx, &show).await,
            Candidate::Movie(movie) => self.process_movie(&movie).await,
        };

        let outcome = match &result {
            Ok(outcome) => {
                debug!(source = %ctx.source, slug = %slug, outcome = outcome.as_str(), "Item reconciled");
                outcome.as_str()
            }
            Err(e) => {
                self.report_failure(ctx, Some(&slug), e).await;
                if matches!(e, ScrapeError::NotFound(_)) {
                    "not_found"
                } else {
                    "failed"
                }
            }
        };
        metrics::ITEMS_PROCESSED
            .with_label_values(&[ctx.source.as_str(), outcome])
            .inc();
        result
    }

    async fn process_show(
        &self,
        ctx: &ScrapeContext,
        candidate: &ShowCandidate,
    ) -> Result<ReconcileOutcome, ScrapeError> {
        let mut show = self.enricher.enrich_show(candidate, ctx.kind).await?;

        let FillOutcome {
            episodes,
            latest_air_time,
            failed_seasons,
        } = fill_episodes(
            self.enricher.catalog(),
            self.enricher.retry(),
            &candidate.slug,
            &candidate.episodes,
        )
        .await;

        let mut failed_seasons = failed_seasons.into_iter();
        // With nothing filled, the first season failure is the item's error
        // and `process` records it.
        let item_error = if episodes.is_empty() {
            Some(match failed_seasons.next() {
                Some((_, e)) => ScrapeError::from(e),
                None => ScrapeError::NotFound(format!(
                    "{}: no catalog episode matches a listing",
                    candidate.slug
                )),
            })
        } else {
            None
        };
        for (season, e) in failed_seasons {
            let slug = format!("{} (season {})", candidate.slug, season);
            self.report_failure(ctx, Some(&slug), &ScrapeError::from(e)).await;
        }
        if let Some(e) = item_error {
            return Err(e);
        }

        show.episodes = episodes;
        show.observe_air_time(latest_air_time);
        show.recount_seasons();

        Ok(self.reconciler.commit(Content::Show(show)).await?)
    }

    async fn process_movie(&self, candidate: &MovieCandidate) -> Result<ReconcileOutcome, ScrapeError> {
        let movie = self.enricher.enrich_movie(candidate).await?;
        Ok(self.reconciler.commit(Content::Movie(movie)).await?)
    }

    /// Log a failure at the level its class calls for and append it to the
    /// error log.
    pub async fn report_failure(&self, ctx: &ScrapeContext, slug: Option<&str>, err: &ScrapeError) {
        let slug_field = slug.unwrap_or("-");
        match err {
            ScrapeError::NotFound(_) => {
                info!(source = %ctx.source, slug = %slug_field, error = %err, "Dropping item")
            }
            ScrapeError::Persistence(_) | ScrapeError::SourceUnavailable(_) => {
                error!(source = %ctx.source, slug = %slug_field, error = %err, "Scrape failure")
            }
            _ => warn!(source = %ctx.source, slug = %slug_field, error = %err, "Abandoning item"),
        }

        if let Some(ref scrape_log) = self.scrape_log {
            scrape_log
                .record(ScrapeFailure {
                    run_id: ctx.run_id.clone(),
                    source: ctx.source.clone(),
                    slug: slug.map(str::to_string),
                    kind: err.kind().to_string(),
                    message: err.to_string(),
                })
                .await;
        }
    }
}
