//! Background feed sync.
//!
//! The syncer fetches the upstream feed, maps it and saves every report,
//! then sleeps for the configured interval and starts over. Runs never
//! overlap: the pause starts only after the previous run has finished,
//! whether it succeeded or not. A failed fetch or decode ends the run
//! early without saving anything; the next run is scheduled as usual.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use pollen_store::ReportStore;

use crate::config::SyncConfig;
use crate::feed::{self, FeedDocument};
use crate::state::SyncStats;

/// Drives the fetch, map and save cycle against a report store.
pub struct Syncer {
    store: Arc<dyn ReportStore>,
    client: reqwest::Client,
    config: SyncConfig,
    stats: Arc<SyncStats>,
}

/// Outcome of a sync run that got as far as saving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// Locations in the feed document.
    pub locations: usize,
    /// Reports saved.
    pub saved: usize,
    /// Reports whose save failed.
    pub failed: usize,
}

/// Errors that abort a sync run.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The HTTP client could not be created.
    #[error("Failed to build HTTP client: {0}")]
    Client(reqwest::Error),
    /// The feed could not be fetched.
    #[error("Failed to fetch feed: {0}")]
    Fetch(reqwest::Error),
    /// The feed answered with a non-success status.
    #[error("Feed returned HTTP status {0}")]
    Status(u16),
    /// The feed body is not a valid document.
    #[error("Failed to decode feed: {0}")]
    Decode(serde_json::Error),
}

impl Syncer {
    /// Create a syncer for the feed described by `config`.
    pub fn new(store: Arc<dyn ReportStore>, config: SyncConfig) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("pollen-service/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(SyncError::Client)?;

        Ok(Self {
            store,
            client,
            config,
            stats: Arc::new(SyncStats::new()),
        })
    }

    /// Statistics updated by [`Syncer::run`].
    pub fn stats(&self) -> Arc<SyncStats> {
        Arc::clone(&self.stats)
    }

    /// Run sync cycles forever.
    pub async fn run(&self) {
        info!(
            "Starting sync daemon for {} (interval: {}s)",
            self.config.url, self.config.interval_secs
        );

        loop {
            self.stats.record_start().await;

            match self.run_cycle().await {
                Ok(summary) => {
                    info!(
                        "Finished sync run: {} of {} report(s) saved",
                        summary.saved, summary.locations
                    );
                    self.stats.record_success(&summary).await;
                }
                Err(e) => {
                    warn!("Sync run failed: {}", e);
                    self.stats.record_failure(&e).await;
                }
            }

            tokio::time::sleep(self.config.interval()).await;
        }
    }

    /// Move the syncer onto a background task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }

    /// Perform a single fetch, map and save cycle.
    ///
    /// Save failures are logged and counted but do not end the run.
    pub async fn run_cycle(&self) -> Result<SyncSummary, SyncError> {
        debug!("Starting sync run");

        let document = self.fetch().await?;
        let reports = feed::map_document(&document);

        let mut summary = SyncSummary {
            locations: reports.len(),
            ..Default::default()
        };
        for report in &reports {
            match self.store.save(report).await {
                Ok(()) => summary.saved += 1,
                Err(e) => {
                    summary.failed += 1;
                    warn!("Failed to save report for {}: {}", report.sub_area_identity(), e);
                }
            }
        }

        Ok(summary)
    }

    async fn fetch(&self) -> Result<FeedDocument, SyncError> {
        let response = self
            .client
            .get(&self.config.url)
            .send()
            .await
            .map_err(SyncError::Fetch)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(SyncError::Fetch)?;
        serde_json::from_slice(&body).map_err(SyncError::Decode)
    }
}
