//! Read access to the scrape error log.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use scrapeyard_core::scrape_log::{ScrapeLogEntry, ScrapeLogFilter};

use crate::state::AppState;

/// Maximum allowed limit for error log queries
const MAX_LIMIT: i64 = 1000;

/// Default limit for error log queries
const DEFAULT_LIMIT: i64 = 100;

/// Query parameters for the errors endpoint
#[derive(Debug, Deserialize)]
pub struct ErrorQueryParams {
    pub run_id: Option<String>,
    pub source: Option<String>,
    /// Error class, e.g. `not_found`
    pub kind: Option<String>,
    /// Maximum number of entries to return (default 100, max 1000)
    pub limit: Option<i64>,
    /// Pagination offset (default 0)
    pub offset: Option<i64>,
}

/// Response for the errors endpoint
#[derive(Debug, Serialize)]
pub struct ErrorQueryResponse {
    pub entries: Vec<ScrapeLogEntry>,
    /// Total number of matching entries
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Serialize)]
pub struct ErrorLogErrorResponse {
    pub error: String,
}

/// Query logged scrape failures, newest first
pub async fn query_errors(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ErrorQueryParams>,
) -> Result<Json<ErrorQueryResponse>, (StatusCode, Json<ErrorLogErrorResponse>)> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    let mut base_filter = ScrapeLogFilter::new();
    if let Some(ref run_id) = params.run_id {
        base_filter = base_filter.with_run_id(run_id);
    }
    if let Some(ref source) = params.source {
        base_filter = base_filter.with_source(source);
    }
    if let Some(ref kind) = params.kind {
        base_filter = base_filter.with_kind(kind);
    }

    let query_filter = base_filter
        .clone()
        .with_limit(limit)
        .with_offset(offset);

    let entries = state
        .scrape_log()
        .query(&query_filter)
        .map_err(|e| internal_error(format!("Failed to query error log: {}", e)))?;

    // Total ignores limit/offset
    let total = state
        .scrape_log()
        .count(&base_filter)
        .map_err(|e| internal_error(format!("Failed to count error log: {}", e)))?;

    Ok(Json(ErrorQueryResponse {
        entries,
        total,
        limit,
        offset,
    }))
}

fn internal_error(error: String) -> (StatusCode, Json<ErrorLogErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorLogErrorResponse { error }),
    )
}
