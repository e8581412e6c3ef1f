//! Run status published to readers.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;

pub const STATUS_IDLE: &str = "Idle";

/// Fire-and-forget status updates.
pub trait StatusSink: Send + Sync {
    fn set_status(&self, status: &str);

    fn set_last_updated(&self, at: DateTime<Utc>);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    pub status: String,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self {
            status: STATUS_IDLE.to_string(),
            last_updated: None,
        }
    }
}

/// In-process status shared between the orchestrator and the HTTP API.
#[derive(Debug, Clone, Default)]
pub struct SharedStatus {
    inner: Arc<RwLock<StatusSnapshot>>,
}

impl SharedStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl StatusSink for SharedStatus {
    fn set_status(&self, status: &str) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .status = status.to_string();
    }

    fn set_last_updated(&self, at: DateTime<Utc>) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .last_updated = Some(at);
    }
}
