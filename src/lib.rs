//! Per-object and per-filter light-curve statistics ("magstats") computed from batches of
//! photometric detections and non-detections.
//!
//! See [`magstats::compute_magstats`] for the entry point.
pub mod constants;
pub mod conversion;
pub mod detections;
pub mod display;
pub mod grouping;
pub mod magnitude_stats;
pub mod magstats;
pub mod magstats_errors;
pub mod object_stats;
pub mod params;
pub mod records;

pub use detections::{Detection, LightCurveBatch, NonDetection};
pub use magstats::{compute_magstats, MagstatsOutput};
pub use magstats_errors::MagstatsError;
pub use params::{Calculator, MagstatsParams, SaturationThresholds};
pub use records::{DmdtFeatures, FilterStats, ObjectStats, ObjectSummary};

#[cfg(feature = "parallel")]
pub use magstats::compute_magstats_batches;
