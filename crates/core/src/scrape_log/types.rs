use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A failure worth keeping, before it is stamped and stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeFailure {
    pub run_id: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    /// Error class, e.g. `not_found` or `transient_network`.
    pub kind: String,
    pub message: String,
}

/// A stored failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeLogEntry {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub run_id: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    pub kind: String,
    pub message: String,
}
