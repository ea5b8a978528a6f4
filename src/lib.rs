//! photowrapped: EXIF statistics over photography sessions.
//!
//! Sessions of edited photos are ingested into SQLite ([`scanner`], [`db`]),
//! then analysed by the pure engine in [`stats`]: filter, per-session
//! statistics, cumulative aggregation, category/group rollups and facet
//! counts. Results are served over HTTP ([`api`]) or rendered as reports
//! ([`report`]).

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod report;
pub mod scanner;
pub mod stats;
pub mod tasks;

pub use api::{build_router, AppState};
