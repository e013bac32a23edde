//! Background feed sync and HTTP REST API for pollen forecasts.
//!
//! This crate provides a service that:
//! - Fetches the DWD pollen forecast feed on a fixed interval
//! - Maps it onto [`pollen_types::Report`]s and saves them to the indexed store
//! - Exposes a REST API for querying the stored reports
//!
//! # REST API Endpoints
//!
//! - `GET /ping` - Liveness check
//! - `GET /status` - Storage health and sync statistics
//! - `GET /regions` - Normalized names of all known areas
//! - `GET /subregions` - Normalized names of all sub-areas
//! - `GET /pollen` - All reports
//! - `GET /pollen/subregion/{subregion}` - Report for one sub-area
//! - `GET /pollen/region/{region}` - All reports of an area
//!
//! # Configuration
//!
//! The service reads configuration from `~/.config/pollen/server.toml`:
//!
//! ```toml
//! [server]
//! bind = "0.0.0.0:8000"
//!
//! [storage]
//! host = "localhost:6379"
//! key_prefix = "pollen"
//!
//! [sync]
//! interval_secs = 3600
//! ```
//!
//! `REDIS_HOST`, `REDIS_PASSWORD` and `REDIS_KEY_PREFIX` override the
//! storage section.

pub mod api;
pub mod config;
pub mod feed;
pub mod state;
pub mod syncer;

pub use config::{Config, ConfigError, ServerConfig, StorageConfig, SyncConfig};
pub use state::{AppState, SyncSnapshot, SyncStats};
pub use syncer::{SyncError, SyncSummary, Syncer};
