//! ETL pipeline for Sportradar tennis data.
//!
//! Fetches the competitions, complexes and doubles-rankings endpoints,
//! flattens the nested JSON into relational rows, and upserts them into
//! a SQLite store read by the reporting dashboard.

pub mod config;
pub mod db;
pub mod error;
pub mod etl;
pub mod fetch;
pub mod logging;
pub mod normalize;
