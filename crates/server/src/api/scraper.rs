//! Scrape status and manual runs.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use scrapeyard_core::RunReport;
use tracing::{info, warn};

use crate::state::AppState;

/// Status response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// "Idle" or "Scraping <source>"
    pub status: String,
    pub last_updated: Option<DateTime<Utc>>,
    /// Whether the orchestrator is available (a catalog is configured)
    pub available: bool,
    /// Whether the scheduled loop is running
    pub running: bool,
    /// Whether a run is in progress
    pub scraping: bool,
    pub sources: usize,
    /// Stored content records, when the store answers
    pub content_count: Option<u64>,
    pub last_run: Option<RunReport>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ScraperErrorResponse {
    pub error: String,
}

/// Simple message response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Get the scrape status
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let snapshot = state.status().snapshot();
    let content_count = match state.store().count() {
        Ok(count) => Some(count),
        Err(e) => {
            warn!("Failed to count content: {}", e);
            None
        }
    };

    let mut response = StatusResponse {
        status: snapshot.status,
        last_updated: snapshot.last_updated,
        available: false,
        running: false,
        scraping: false,
        sources: 0,
        content_count,
        last_run: None,
    };

    if let Some(orch) = state.orchestrator() {
        let status = orch.status().await;
        response.available = true;
        response.running = status.running;
        response.scraping = status.scraping;
        response.sources = status.sources;
        response.last_run = status.last_run;
    }

    Json(response)
}

/// Start a run in the background
pub async fn trigger_run(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let Some(orch) = state.orchestrator() else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ScraperErrorResponse {
                error: "Orchestrator not available (no catalog configured)".to_string(),
            }),
        )
            .into_response();
    };

    if orch.status().await.scraping {
        return (
            StatusCode::CONFLICT,
            Json(ScraperErrorResponse {
                error: "A scrape run is already in progress".to_string(),
            }),
        )
            .into_response();
    }

    let orch = Arc::clone(orch);
    tokio::spawn(async move {
        let report = orch.run_once().await;
        info!(run_id = %report.run_id, "Manual scrape run finished");
    });

    (
        StatusCode::ACCEPTED,
        Json(MessageResponse {
            message: "Scrape run started".to_string(),
        }),
    )
        .into_response()
}

/// Cancel the current run at the next source boundary
pub async fn cancel_run(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.orchestrator() {
        Some(orch) => {
            orch.cancel();
            (
                StatusCode::OK,
                Json(MessageResponse {
                    message: "Cancellation requested".to_string(),
                }),
            )
                .into_response()
        }
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ScraperErrorResponse {
                error: "Orchestrator not available".to_string(),
            }),
        )
            .into_response(),
    }
}
