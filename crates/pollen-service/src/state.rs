//! Application state shared across handlers and the syncer.

use std::sync::Arc;

use pollen_store::ReportStore;
use serde::Serialize;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::syncer::{SyncError, SyncSummary};

/// Shared application state.
pub struct AppState {
    /// The report store. Handlers call it concurrently; it needs no lock.
    pub store: Arc<dyn ReportStore>,
    /// Configuration the service was started with.
    pub config: Config,
    /// Outcome of recent sync runs.
    pub sync: Arc<SyncStats>,
}

impl AppState {
    /// Create new application state.
    pub fn new(store: Arc<dyn ReportStore>, config: Config, sync: Arc<SyncStats>) -> Arc<Self> {
        Arc::new(Self {
            store,
            config,
            sync,
        })
    }
}

/// Statistics about sync runs, written by the syncer and read by the API.
#[derive(Debug, Default)]
pub struct SyncStats {
    inner: RwLock<SyncSnapshot>,
}

/// Point-in-time copy of [`SyncStats`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncSnapshot {
    /// Whether a sync run is in progress.
    pub running: bool,
    /// Start of the most recent run.
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_attempt_at: Option<OffsetDateTime>,
    /// End of the most recent successful run.
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_success_at: Option<OffsetDateTime>,
    /// End of the most recent failed run.
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_error_at: Option<OffsetDateTime>,
    /// Error of the most recent failed run.
    pub last_error: Option<String>,
    /// Runs that fetched and decoded the feed.
    pub success_count: u64,
    /// Runs aborted by a fetch or decode failure.
    pub failure_count: u64,
    /// Reports saved by the most recent successful run.
    pub last_saved: usize,
    /// Reports that failed to save in the most recent successful run.
    pub last_failed_saves: usize,
}

impl SyncStats {
    /// Create empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the start of a run.
    pub async fn record_start(&self) {
        let mut stats = self.inner.write().await;
        stats.running = true;
        stats.last_attempt_at = Some(OffsetDateTime::now_utc());
    }

    /// Record a completed run.
    pub async fn record_success(&self, summary: &SyncSummary) {
        let mut stats = self.inner.write().await;
        stats.running = false;
        stats.last_success_at = Some(OffsetDateTime::now_utc());
        stats.success_count += 1;
        stats.last_saved = summary.saved;
        stats.last_failed_saves = summary.failed;
    }

    /// Record an aborted run.
    pub async fn record_failure(&self, error: &SyncError) {
        let mut stats = self.inner.write().await;
        stats.running = false;
        stats.last_error_at = Some(OffsetDateTime::now_utc());
        stats.last_error = Some(error.to_string());
        stats.failure_count += 1;
    }

    /// Copy the current statistics.
    pub async fn snapshot(&self) -> SyncSnapshot {
        self.inner.read().await.clone()
    }
}
