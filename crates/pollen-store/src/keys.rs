//! Storage key layout.
//!
//! | key                          | type   | contents                           |
//! |------------------------------|--------|------------------------------------|
//! | `report:{sub}`               | string | JSON encoded [`Report`]            |
//! | `regions`                    | set    | normalized area names              |
//! | `subregions`                 | set    | normalized sub-area identities     |
//! | `region:{area}:reports`      | set    | report keys belonging to an area   |
//! | `reports`                    | set    | every report key                   |
//!
//! Sets hold logical report keys (`report:{sub}`) without the namespace
//! prefix. [`Keyspace::physical`] applies the prefix when a key is read.
//!
//! [`Report`]: pollen_types::Report

use crate::normalize::normalize;

pub(crate) const REGIONS: &str = "regions";
pub(crate) const SUBREGIONS: &str = "subregions";
pub(crate) const REPORTS: &str = "reports";

/// Logical key of the report stored for a sub-area identity.
pub fn report_key(sub_area: &str) -> String {
    format!("report:{}", normalize(sub_area))
}

/// Logical key of the set holding an area's report keys.
pub fn region_reports_key(area: &str) -> String {
    format!("region:{}:reports", normalize(area))
}

/// Maps logical keys onto the physical keys of a namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyspace {
    prefix: String,
}

impl Keyspace {
    /// Create a keyspace. An empty prefix leaves keys untouched.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Physical key for a logical key.
    pub fn physical(&self, key: &str) -> String {
        if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}:{}", self.prefix, key)
        }
    }
}
