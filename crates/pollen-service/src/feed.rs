//! Upstream pollen feed document and its mapping onto [`Report`]s.
//!
//! The feed is the DWD open-data pollen forecast (`s31fg.json`). Its layout
//! is nested per location with one object per substance; the mapper
//! flattens that into an ordered list of substances per report.
//!
//! Decoding is lenient: a missing or `null` field falls back to its
//! default, so a location without a substance object maps to a substance
//! with empty readings instead of failing the whole document. Values of
//! the wrong type are still rejected.

use serde::{Deserialize, Deserializer, Serialize};

use pollen_types::{DayReading, Report, Substance};

/// Top-level feed document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedDocument {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub sender: String,
    #[serde(deserialize_with = "null_as_default")]
    pub next_update: String,
    #[serde(deserialize_with = "null_as_default")]
    pub last_update: String,
    pub legend: Option<Legend>,
    #[serde(deserialize_with = "null_as_default")]
    pub content: Vec<LocationEntry>,
}

/// Legend of the severity scale as shipped with the feed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Legend {
    #[serde(deserialize_with = "null_as_default")]
    pub id1: String,
    #[serde(deserialize_with = "null_as_default")]
    pub id1_desc: String,
    #[serde(deserialize_with = "null_as_default")]
    pub id2: String,
    #[serde(deserialize_with = "null_as_default")]
    pub id2_desc: String,
    #[serde(deserialize_with = "null_as_default")]
    pub id3: String,
    #[serde(deserialize_with = "null_as_default")]
    pub id3_desc: String,
    #[serde(deserialize_with = "null_as_default")]
    pub id4: String,
    #[serde(deserialize_with = "null_as_default")]
    pub id4_desc: String,
    #[serde(deserialize_with = "null_as_default")]
    pub id5: String,
    #[serde(deserialize_with = "null_as_default")]
    pub id5_desc: String,
    #[serde(deserialize_with = "null_as_default")]
    pub id6: String,
    #[serde(deserialize_with = "null_as_default")]
    pub id6_desc: String,
    #[serde(deserialize_with = "null_as_default")]
    pub id7: String,
    #[serde(deserialize_with = "null_as_default")]
    pub id7_desc: String,
}

/// Forecast for one area / sub-area pair.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationEntry {
    #[serde(deserialize_with = "null_as_default")]
    pub region_id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub region_name: String,
    /// `-1` when the area has no sub-areas.
    #[serde(deserialize_with = "null_as_default")]
    pub partregion_id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub partregion_name: String,
    #[serde(rename = "Pollen", deserialize_with = "null_as_default")]
    pub pollen: PollenFields,
}

/// The eight substance objects of a location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PollenFields {
    #[serde(rename = "Ambrosia")]
    pub ambrosia: Option<DayCodes>,
    #[serde(rename = "Beifuss")]
    pub beifuss: Option<DayCodes>,
    #[serde(rename = "Birke")]
    pub birke: Option<DayCodes>,
    #[serde(rename = "Erle")]
    pub erle: Option<DayCodes>,
    #[serde(rename = "Esche")]
    pub esche: Option<DayCodes>,
    #[serde(rename = "Graeser")]
    pub graeser: Option<DayCodes>,
    #[serde(rename = "Hasel")]
    pub hasel: Option<DayCodes>,
    #[serde(rename = "Roggen")]
    pub roggen: Option<DayCodes>,
}

impl PollenFields {
    /// Substances paired with their display names, in report order.
    fn in_report_order(&self) -> [(&'static str, Option<&DayCodes>); 8] {
        [
            ("Ambrosia", self.ambrosia.as_ref()),
            ("Beifuss", self.beifuss.as_ref()),
            ("Birke", self.birke.as_ref()),
            ("Erle", self.erle.as_ref()),
            ("Esche", self.esche.as_ref()),
            ("Gräser", self.graeser.as_ref()),
            ("Hasel", self.hasel.as_ref()),
            ("Roggen", self.roggen.as_ref()),
        ]
    }
}

/// Severity codes of one substance for the three forecast days.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DayCodes {
    #[serde(deserialize_with = "null_as_default")]
    pub today: String,
    #[serde(deserialize_with = "null_as_default")]
    pub tomorrow: String,
    #[serde(rename = "dayafter_to", deserialize_with = "null_as_default")]
    pub day_after_tomorrow: String,
}

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Map a feed document onto reports, one per location, in feed order.
///
/// Area and sub-area names are trimmed but otherwise kept as published.
pub fn map_document(document: &FeedDocument) -> Vec<Report> {
    document.content.iter().map(map_location).collect()
}

/// Map a single location entry.
pub fn map_location(entry: &LocationEntry) -> Report {
    Report {
        area: entry.region_name.trim().to_string(),
        sub_area: entry.partregion_name.trim().to_string(),
        items: entry
            .pollen
            .in_report_order()
            .into_iter()
            .map(|(name, codes)| map_substance(name, codes))
            .collect(),
    }
}

fn map_substance(name: &str, codes: Option<&DayCodes>) -> Substance {
    let codes = codes.cloned().unwrap_or_default();
    Substance {
        name: name.to_string(),
        today: DayReading::from_code(codes.today),
        tomorrow: DayReading::from_code(codes.tomorrow),
        day_after_tomorrow: DayReading::from_code(codes.day_after_tomorrow),
    }
}
