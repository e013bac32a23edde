//! Core types for pollen forecast data.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::severity;

/// Display names of the tracked substances, in the order reports list them.
pub const SUBSTANCES: [&str; 8] = [
    "Ambrosia", "Beifuss", "Birke", "Erle", "Esche", "Gräser", "Hasel", "Roggen",
];

/// Pollen forecast for one sub-area.
///
/// `sub_area` is empty for areas the feed does not subdivide. Such reports
/// are addressed by their area name instead, see [`Report::sub_area_identity`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Report {
    /// Area (region) display name.
    #[cfg_attr(feature = "serde", serde(rename = "region"))]
    pub area: String,
    /// Sub-area display name, possibly empty.
    #[cfg_attr(feature = "serde", serde(rename = "sub_region"))]
    pub sub_area: String,
    /// One entry per tracked substance.
    #[cfg_attr(feature = "serde", serde(rename = "pollen"))]
    pub items: Vec<Substance>,
}

impl Report {
    /// Create a report without substance data.
    pub fn new(area: impl Into<String>, sub_area: impl Into<String>) -> Self {
        Self {
            area: area.into(),
            sub_area: sub_area.into(),
            items: Vec::new(),
        }
    }

    /// The name this report is stored under.
    ///
    /// This is the sub-area name, or the area name if the report has no
    /// sub-area.
    ///
    /// # Examples
    ///
    /// ```
    /// use pollen_types::Report;
    ///
    /// assert_eq!(Report::new("Bayern", "Mainfranken").sub_area_identity(), "Mainfranken");
    /// assert_eq!(Report::new("Berlin", "").sub_area_identity(), "Berlin");
    /// ```
    #[must_use]
    pub fn sub_area_identity(&self) -> &str {
        if self.sub_area.is_empty() {
            &self.area
        } else {
            &self.sub_area
        }
    }

    /// Look up a substance by display name.
    #[must_use]
    pub fn substance(&self, name: &str) -> Option<&Substance> {
        self.items.iter().find(|s| s.name == name)
    }
}

/// Three-day forecast for a single substance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Substance {
    /// Substance display name.
    pub name: String,
    pub today: DayReading,
    pub tomorrow: DayReading,
    pub day_after_tomorrow: DayReading,
}

/// Forecast value for one day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DayReading {
    /// Coded severity token (e.g. `"2"`, `"0-1"`), empty when the feed has no data.
    #[cfg_attr(feature = "serde", serde(rename = "severity"))]
    pub severity_code: String,
    /// Human readable phrase for `severity_code`, empty if the code is unknown.
    pub description: String,
}

impl DayReading {
    /// Build a reading from a coded token, filling in the description.
    pub fn from_code(code: impl Into<String>) -> Self {
        let severity_code = code.into();
        let description = severity::translate(&severity_code).to_string();
        Self {
            severity_code,
            description,
        }
    }

    /// Returns `true` if the feed had no data for this day.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.severity_code.is_empty()
    }
}
