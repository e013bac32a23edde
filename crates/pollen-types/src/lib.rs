//! Domain types for pollen forecast reports.
//!
//! This crate holds the normalized report model shared by the store and the
//! service, plus the lookup that turns coded severity tokens into readable
//! phrases.
//!
//! # Example
//!
//! ```
//! use pollen_types::{DayReading, severity};
//!
//! let reading = DayReading::from_code("0-1");
//! assert_eq!(reading.description, "keine bis geringe Belastung");
//! assert_eq!(severity::translate("unknown"), "");
//! ```

pub mod severity;
pub mod types;

pub use types::{DayReading, Report, SUBSTANCES, Substance};
