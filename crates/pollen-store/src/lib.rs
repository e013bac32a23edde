//! Indexed key/value persistence for pollen forecast reports.
//!
//! Reports are stored one record per sub-area identity, with secondary
//! index sets that answer "all sub-areas of an area" and "everything"
//! queries on a substrate that only offers strings and sets.
//!
//! # Features
//!
//! - Label normalization so differently punctuated names share a key
//! - Idempotent upserts, safe to repeat on every sync run
//! - Redis backend for production, in-memory backend for tests
//! - Optional key namespace prefix
//!
//! # Example
//!
//! ```
//! use pollen_store::{IndexedStore, MemoryBackend, ReportStore};
//! use pollen_types::Report;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), pollen_store::Error> {
//! let store = IndexedStore::new(MemoryBackend::new());
//! store.save(&Report::new("Bayern", "Allgäu/Oberbayern")).await?;
//!
//! let report = store.get_by_subregion("Allgäu Oberbayern").await?;
//! assert_eq!(report.area, "Bayern");
//! # Ok(())
//! # }
//! ```

mod backend;
mod error;
pub mod keys;
mod memory;
mod normalize;
mod redis_backend;
mod store;

pub use backend::KeyValue;
pub use error::{Error, Result};
pub use keys::Keyspace;
pub use memory::MemoryBackend;
pub use normalize::normalize;
pub use redis_backend::RedisBackend;
pub use store::{IndexedStore, ReportStore};
