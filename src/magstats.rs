//! # Magstats computation
//!
//! Entry point of the crate: [`compute_magstats`] runs the object-level and the filter-level
//! calculators over one [`LightCurveBatch`] and returns both record sets in a
//! [`MagstatsOutput`].
//!
//! The computation is a pure function of the batch and the parameters. Nothing is cached
//! between calls; identical batches give identical outputs whatever their row order.
//!
//! ## Example
//!
//! ```rust
//! use magstats::{compute_magstats, Detection, LightCurveBatch, MagstatsParams, NonDetection};
//!
//! let batch = LightCurveBatch::new(
//!     vec![
//!         Detection::new("c1", "AID1", 1, 59000.0, 17.5, 0.1),
//!         Detection::new("c2", "AID1", 1, 59002.0, 17.1, 0.1),
//!     ],
//!     vec![NonDetection::new("AID1", 1, 58998.0, 19.0)],
//! )
//! .unwrap();
//!
//! let output = compute_magstats(&batch, &MagstatsParams::default()).unwrap();
//! assert_eq!(output.objects.len(), 1);
//! assert_eq!(output.magstats[0].ndet, Some(2));
//! assert!(output.magstats[0].dmdt.is_some());
//! ```
use log::{debug, info};
use serde::Serialize;

use crate::{
    detections::LightCurveBatch,
    magnitude_stats::MagnitudeStatistics,
    magstats_errors::MagstatsError,
    object_stats::ObjectStatistics,
    params::MagstatsParams,
    records::{FilterStats, ObjectStats, ObjectSummary},
};

/// Result of one magstats computation.
///
/// Both vectors are sorted by key: `objects` by `aid`, `magstats` by `(aid, fid)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MagstatsOutput {
    pub objects: Vec<ObjectStats>,
    pub magstats: Vec<FilterStats>,
}

impl MagstatsOutput {
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty() && self.magstats.is_empty()
    }

    /// Nest every per-filter record inside the record of its object.
    ///
    /// Objects without any per-filter record get an empty `magstats` list.
    pub fn summaries(self) -> Vec<ObjectSummary> {
        let mut magstats = self.magstats.into_iter().peekable();
        self.objects
            .into_iter()
            .map(|object| {
                // both sides are sorted by aid
                let mut filters = Vec::new();
                while let Some(stats) = magstats.next_if(|s| s.aid <= object.aid) {
                    if stats.aid == object.aid {
                        filters.push(stats);
                    }
                }
                ObjectSummary {
                    object,
                    magstats: filters,
                }
            })
            .collect()
    }

    /// Serialize the output as a JSON document `{ "objects": [...], "magstats": [...] }`.
    pub fn to_json(&self) -> Result<String, MagstatsError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Compute the object-level and filter-level statistics of a batch.
///
/// Arguments
/// -----------------
/// * `batch` – Validated detections and deduplicated non-detections.
/// * `params` – Saturation thresholds, dmdt time delta and calculator exclusions.
///
/// Return
/// ----------
/// * `Ok(MagstatsOutput)`; an empty batch gives an empty output.
///
/// Errors
/// ----------
/// * [`MagstatsError::UnknownFilter`] if the saturation rate is enabled and a filter
///   of the batch has no configured threshold.
pub fn compute_magstats(
    batch: &LightCurveBatch,
    params: &MagstatsParams,
) -> Result<MagstatsOutput, MagstatsError> {
    if !params.excluded.is_empty() {
        debug!(
            "Excluded calculators: {}",
            params.excluded.iter().map(|c| c.name()).collect::<Vec<_>>().join(",")
        );
    }

    let objects = ObjectStatistics::new(batch, params).assemble();
    let magstats = MagnitudeStatistics::new(batch, params).assemble()?;

    info!(
        "Computed magstats for {} objects ({} object/filter pairs) from {} detections and {} non-detections",
        objects.len(),
        magstats.len(),
        batch.detections().len(),
        batch.non_detections().len()
    );

    Ok(MagstatsOutput { objects, magstats })
}

/// Compute the statistics of several independent batches on the rayon thread pool.
///
/// Outputs are returned in the order of `batches`. The first error aborts the whole call.
#[cfg(feature = "parallel")]
pub fn compute_magstats_batches(
    batches: &[LightCurveBatch],
    params: &MagstatsParams,
) -> Result<Vec<MagstatsOutput>, MagstatsError> {
    use rayon::prelude::*;

    batches
        .par_iter()
        .map(|batch| compute_magstats(batch, params))
        .collect()
}
