//! Data preparation for the pilgrim crowd-monitoring dashboard.
//!
//! Turns a raw CSV event log into an analysis-ready polars table: timestamps
//! parsed into `Hour`/`DayOfWeek`, level labels title-cased and scored, and a
//! reproducible simulated zone and coordinate per row. See [`load_and_clean`].

pub mod aggregation;
pub mod categorical;
pub mod config;
pub mod error;
pub mod geocode;
pub mod ingest;
pub mod pipeline;
pub mod schema;
pub mod temporal;

#[cfg(feature = "python")]
mod python;

pub use config::{PipelineConfig, ZoneSpec};
pub use error::{GeocodeFault, Malformed, PrepError, Result};
pub use geocode::CoordinateSource;
pub use pipeline::{clean_frame, load_and_clean, load_and_clean_with, PreparedTable};
