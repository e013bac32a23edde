//! Report store with secondary indices.
//!
//! [`IndexedStore`] keeps one primary record per sub-area identity plus a
//! handful of sets that make area-scoped and "list everything" queries
//! possible on a plain key/value substrate.
//!
//! # Consistency
//!
//! A save is a sequence of independent writes with no transaction around
//! it. The primary record is always written first and the index sets after
//! it, so an interrupted save can leave a record missing from an index but
//! never an index entry without its record. The indices are eventually
//! consistent: the next successful save of the same report repairs them.
//!
//! Concurrent saves for the same sub-area race; the last write wins.
//! Nothing is ever removed from the indices.

use async_trait::async_trait;
use tracing::{debug, warn};

use pollen_types::Report;

use crate::backend::KeyValue;
use crate::error::{Error, Result};
use crate::keys::{self, Keyspace, REGIONS, REPORTS, SUBREGIONS};
use crate::normalize::normalize;

/// Save and query operations over pollen reports.
///
/// Every method may be called concurrently from any number of tasks.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Insert or replace the report for its sub-area identity and index it.
    async fn save(&self, report: &Report) -> Result<()>;

    /// The report stored for a sub-area (or for an area without sub-areas).
    ///
    /// Returns [`Error::NotFound`] if nothing is stored under that name.
    async fn get_by_subregion(&self, sub_area: &str) -> Result<Report>;

    /// All reports of an area.
    ///
    /// An area without indexed reports is looked up as a sub-area of its
    /// own, so an unknown area yields [`Error::NotFound`].
    async fn get_by_region(&self, area: &str) -> Result<Vec<Report>>;

    /// Every stored report, in no particular order.
    async fn all_reports(&self) -> Result<Vec<Report>>;

    /// Normalized names of all known areas, in no particular order.
    async fn all_regions(&self) -> Result<Vec<String>>;

    /// Normalized sub-area identities, in no particular order.
    async fn all_subregions(&self) -> Result<Vec<String>>;

    /// Check that the store is reachable. Returns the number of known areas.
    async fn health_check(&self) -> Result<usize>;
}

/// [`ReportStore`] on top of any [`KeyValue`] backend.
#[derive(Debug)]
pub struct IndexedStore<B> {
    backend: B,
    keys: Keyspace,
}

impl<B: KeyValue> IndexedStore<B> {
    /// Create a store writing unprefixed keys.
    pub fn new(backend: B) -> Self {
        Self::with_keyspace(backend, Keyspace::default())
    }

    /// Create a store whose keys live in the given namespace.
    pub fn with_keyspace(backend: B, keys: Keyspace) -> Self {
        Self { backend, keys }
    }

    #[cfg(test)]
    pub(crate) fn backend(&self) -> &B {
        &self.backend
    }

    async fn read_set(&self, set: &str) -> Result<Vec<String>> {
        self.backend.members(&self.keys.physical(set)).await
    }

    /// Fetch and decode the records behind a list of logical report keys.
    ///
    /// Keys without a record are skipped.
    async fn resolve(&self, report_keys: &[String]) -> Result<Vec<Report>> {
        let physical: Vec<String> = report_keys
            .iter()
            .map(|k| self.keys.physical(k))
            .collect();
        let values = self.backend.get_many(&physical).await?;

        let mut reports = Vec::with_capacity(values.len());
        for (key, value) in physical.into_iter().zip(values) {
            match value {
                Some(json) => reports.push(decode(&key, &json)?),
                None => warn!("Index references missing record {}", key),
            }
        }
        Ok(reports)
    }
}

#[async_trait]
impl<B: KeyValue> ReportStore for IndexedStore<B> {
    async fn save(&self, report: &Report) -> Result<()> {
        let json = serde_json::to_string(report).map_err(|e| {
            warn!("Unable to encode report for {}: {}", report.sub_area_identity(), e);
            Error::Serialization(e)
        })?;

        let sub_key = normalize(report.sub_area_identity());
        let area_key = normalize(&report.area);
        let report_key = keys::report_key(report.sub_area_identity());
        debug!("Saving {} (area {})", report_key, area_key);

        let result = async {
            self.backend
                .set(&self.keys.physical(&report_key), &json)
                .await?;
            self.backend
                .add_member(&self.keys.physical(REGIONS), &area_key)
                .await?;
            self.backend
                .add_member(&self.keys.physical(SUBREGIONS), &sub_key)
                .await?;
            self.backend
                .add_member(
                    &self.keys.physical(&keys::region_reports_key(&report.area)),
                    &report_key,
                )
                .await?;
            self.backend
                .add_member(&self.keys.physical(REPORTS), &report_key)
                .await
        }
        .await;

        if let Err(e) = &result {
            warn!("Save of {} did not complete: {}", report_key, e);
        }
        result
    }

    async fn get_by_subregion(&self, sub_area: &str) -> Result<Report> {
        let key = self.keys.physical(&keys::report_key(sub_area));

        match self.backend.get(&key).await? {
            Some(json) => decode(&key, &json),
            None => {
                debug!("No report stored under {}", key);
                Err(Error::NotFound(sub_area.to_string()))
            }
        }
    }

    async fn get_by_region(&self, area: &str) -> Result<Vec<Report>> {
        let report_keys = self.read_set(&keys::region_reports_key(area)).await?;

        // An area without sub-areas is stored as its own sub-area
        if report_keys.is_empty() {
            return Ok(vec![self.get_by_subregion(area).await?]);
        }

        self.resolve(&report_keys).await
    }

    async fn all_reports(&self) -> Result<Vec<Report>> {
        let report_keys = self.read_set(REPORTS).await?;
        self.resolve(&report_keys).await
    }

    async fn all_regions(&self) -> Result<Vec<String>> {
        self.read_set(REGIONS).await
    }

    async fn all_subregions(&self) -> Result<Vec<String>> {
        self.read_set(SUBREGIONS).await
    }

    async fn health_check(&self) -> Result<usize> {
        self.backend.ping().await?;
        self.backend.member_count(&self.keys.physical(REGIONS)).await
    }
}

fn decode(key: &str, json: &str) -> Result<Report> {
    serde_json::from_str(json).map_err(|e| {
        warn!("Unable to decode record {}: {}", key, e);
        Error::Decode {
            key: key.to_string(),
            source: e,
        }
    })
}
