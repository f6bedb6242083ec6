//! # Photometric detections and non-detections
//!
//! Flat records consumed by the magstats calculators, and the [`LightCurveBatch`] container
//! holding one fully materialized batch of them.
//!
//! ## Overview
//! -----------------
//! * [`Detection`] – one photometric measurement of an object in one filter.
//! * [`NonDetection`] – an epoch where nothing was detected above `diffmaglim`.
//! * [`LightCurveBatch`] – validated detections plus **deduplicated** non-detections.
//!
//! Batches are built either directly from vectors ([`LightCurveBatch::new`]), from
//! alert messages ([`alert_reader`]) or from CSV files ([`csv_reader`]).
//!
//! ## Units & Conventions
//! -----------------
//! * `ra`, `dec` are stored in **degrees**; their errors `e_ra`, `e_dec` in **arcseconds**.
//! * Epochs are **MJD** (days).
//! * `mag_corr` is only expected on rows flagged `corrected`.
//!
//! ## Invariants
//! -----------------
//! * Every detection has a finite epoch, a non-negative magnitude error and finite,
//!   strictly positive coordinate errors (checked by [`LightCurveBatch::new`]).
//! * `mag_corr` is never `Some(NaN)` inside a batch: a `NaN` corrected magnitude is missing.
//! * Non-detections are unique on `(aid, fid, mjd)` once inside a batch.
//! * Detections are **not** deduplicated; callers must guarantee their uniqueness.
pub mod alert_reader;
pub mod csv_reader;

use std::cmp::Ordering;

use log::{debug, warn};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::{
    constants::{ArcSec, Degree, FilterId, Magnitude, ObjectId, MJD},
    magstats_errors::MagstatsError,
};

/// A single photometric detection.
///
/// # Fields
///
/// * `candid` - Unique detection identifier, used for deterministic ordering only
/// * `aid` - Object identifier
/// * `oid` - Survey-specific object identifier, if known
/// * `tid` - Telescope identifier, if known
/// * `fid` - Filter identifier
/// * `mjd` - Observation epoch
/// * `mag`, `e_mag` - Raw magnitude and its error
/// * `mag_corr` - Corrected magnitude (only on corrected detections)
/// * `corrected`, `dubious`, `stellar` - Quality flags
/// * `ra`, `dec` - Coordinates in degrees
/// * `e_ra`, `e_dec` - Coordinate errors in arcseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub candid: String,
    pub aid: ObjectId,
    #[serde(default)]
    pub oid: Option<String>,
    #[serde(default)]
    pub tid: Option<String>,
    pub fid: FilterId,
    pub mjd: MJD,
    pub mag: Magnitude,
    pub e_mag: Magnitude,
    #[serde(default)]
    pub mag_corr: Option<Magnitude>,
    pub corrected: bool,
    pub dubious: bool,
    pub stellar: bool,
    pub ra: Degree,
    pub e_ra: ArcSec,
    pub dec: Degree,
    pub e_dec: ArcSec,
}

impl Detection {
    /// Create a new detection with every flag cleared and no corrected magnitude.
    ///
    /// Arguments
    /// ---------
    /// * `candid`: the detection identifier
    /// * `aid`: the object identifier
    /// * `fid`: the filter identifier
    /// * `mjd`: the observation epoch
    /// * `mag`, `e_mag`: the raw magnitude and its error
    ///
    /// Return
    /// ------
    /// * a new Detection located at `(0, 0)` with unit coordinate errors; use the
    ///   `with_*` methods to fill the remaining fields
    pub fn new(
        candid: impl Into<String>,
        aid: impl Into<ObjectId>,
        fid: FilterId,
        mjd: MJD,
        mag: Magnitude,
        e_mag: Magnitude,
    ) -> Self {
        Detection {
            candid: candid.into(),
            aid: aid.into(),
            oid: None,
            tid: None,
            fid,
            mjd,
            mag,
            e_mag,
            mag_corr: None,
            corrected: false,
            dubious: false,
            stellar: false,
            ra: 0.0,
            e_ra: 1.0,
            dec: 0.0,
            e_dec: 1.0,
        }
    }

    /// Mark the detection as corrected with the given corrected magnitude.
    pub fn with_corrected(mut self, mag_corr: Magnitude) -> Self {
        self.corrected = true;
        self.mag_corr = Some(mag_corr);
        self
    }

    /// Set a corrected magnitude without touching the `corrected` flag.
    pub fn with_mag_corr(mut self, mag_corr: Option<Magnitude>) -> Self {
        self.mag_corr = mag_corr;
        self
    }

    pub fn with_flags(mut self, dubious: bool, stellar: bool) -> Self {
        self.dubious = dubious;
        self.stellar = stellar;
        self
    }

    /// Set the position (degrees) and its uncertainty (arcseconds).
    pub fn with_position(mut self, ra: Degree, e_ra: ArcSec, dec: Degree, e_dec: ArcSec) -> Self {
        self.ra = ra;
        self.e_ra = e_ra;
        self.dec = dec;
        self.e_dec = e_dec;
        self
    }

    pub fn with_survey_ids(mut self, oid: Option<String>, tid: Option<String>) -> Self {
        self.oid = oid;
        self.tid = tid;
        self
    }

    /// Check the record-level invariants of a detection.
    fn validate(&self) -> Result<(), MagstatsError> {
        let invalid = |reason: &str| MagstatsError::InvalidDetection {
            candid: self.candid.clone(),
            reason: reason.to_string(),
        };

        if !self.mjd.is_finite() {
            return Err(invalid("epoch is not a finite number"));
        }
        if !(self.e_mag >= 0.0) {
            return Err(invalid("magnitude error must be non-negative"));
        }
        // inverse-variance weights need 0 < σ < inf
        if !(self.e_ra.is_finite() && self.e_ra > 0.0) {
            return Err(invalid("right ascension error must be finite and positive"));
        }
        if !(self.e_dec.is_finite() && self.e_dec > 0.0) {
            return Err(invalid("declination error must be finite and positive"));
        }
        Ok(())
    }

    /// A `NaN` corrected magnitude is a missing one.
    ///
    /// Return
    /// ----------
    /// * `true` if `mag_corr` was `Some(NaN)` and has been cleared.
    fn clear_nan_mag_corr(&mut self) -> bool {
        if self.mag_corr.is_some_and(f64::is_nan) {
            self.mag_corr = None;
            true
        } else {
            false
        }
    }

    /// Chronological order, ties broken by detection identifier.
    pub(crate) fn cmp_epoch(&self, other: &Self) -> Ordering {
        self.mjd
            .total_cmp(&other.mjd)
            .then_with(|| self.candid.cmp(&other.candid))
    }
}

/// An epoch where no source was detected brighter than `diffmaglim`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NonDetection {
    pub aid: ObjectId,
    #[serde(default)]
    pub oid: Option<String>,
    #[serde(default)]
    pub tid: Option<String>,
    pub fid: FilterId,
    pub mjd: MJD,
    pub diffmaglim: Magnitude,
}

impl NonDetection {
    pub fn new(aid: impl Into<ObjectId>, fid: FilterId, mjd: MJD, diffmaglim: Magnitude) -> Self {
        NonDetection {
            aid: aid.into(),
            oid: None,
            tid: None,
            fid,
            mjd,
            diffmaglim,
        }
    }

    /// Identity of a non-detection: `(aid, fid, mjd)`.
    fn identity(&self) -> (&str, FilterId, OrderedFloat<MJD>) {
        (&self.aid, self.fid, OrderedFloat(self.mjd))
    }
}

/// One fully materialized batch of detections and non-detections.
///
/// The batch owns its records. Construction validates every detection and removes
/// duplicated non-detections, so the calculators can assume both invariants.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LightCurveBatch {
    detections: Vec<Detection>,
    non_detections: Vec<NonDetection>,
}

impl LightCurveBatch {
    /// Build a batch from raw records.
    ///
    /// Arguments
    /// -----------------
    /// * `detections` – Detections of any number of objects, in any order.
    /// * `non_detections` – Non-detections of any number of objects, in any order.
    ///
    /// Return
    /// ----------
    /// * `Ok(LightCurveBatch)` with non-detections deduplicated on `(aid, fid, mjd)`.
    ///   When duplicates disagree on `diffmaglim`, the brightest limit is kept so that
    ///   the outcome does not depend on input order.
    /// * `Err(MagstatsError::InvalidDetection)` if a detection has a non-finite epoch,
    ///   a negative magnitude error, or a coordinate error that is not finite and positive.
    ///
    /// A `NaN` corrected magnitude is stored as missing (`None`).
    pub fn new(
        mut detections: Vec<Detection>,
        mut non_detections: Vec<NonDetection>,
    ) -> Result<Self, MagstatsError> {
        detections.iter().try_for_each(Detection::validate)?;

        let cleared = detections
            .iter_mut()
            .map(Detection::clear_nan_mag_corr)
            .filter(|&cleared| cleared)
            .count();
        if cleared > 0 {
            debug!("{cleared} NaN corrected magnitudes treated as missing");
        }

        let before = non_detections.len();
        non_detections.sort_by(|a, b| {
            a.identity()
                .cmp(&b.identity())
                .then_with(|| a.diffmaglim.total_cmp(&b.diffmaglim))
        });
        non_detections.dedup_by(|a, b| a.identity() == b.identity());

        let dropped = before - non_detections.len();
        if dropped > 0 {
            warn!("Dropped {dropped} duplicated non-detections");
        }
        debug!(
            "Light curve batch with {} detections and {} non-detections",
            detections.len(),
            non_detections.len()
        );

        Ok(LightCurveBatch {
            detections,
            non_detections,
        })
    }

    pub fn detections(&self) -> &[Detection] {
        &self.detections
    }

    pub fn non_detections(&self) -> &[NonDetection] {
        &self.non_detections
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty() && self.non_detections.is_empty()
    }

    /// Merge another batch into this one, re-running validation and deduplication.
    pub fn extend(self, other: LightCurveBatch) -> Result<Self, MagstatsError> {
        let mut detections = self.detections;
        let mut non_detections = self.non_detections;
        detections.extend(other.detections);
        non_detections.extend(other.non_detections);
        LightCurveBatch::new(detections, non_detections)
    }
}

#[cfg(test)]
mod detections_test {
    use super::*;

    #[test]
    fn test_duplicated_non_detections_are_removed() {
        let non_detections = vec![
            NonDetection::new("AID1", 1, 10.0, 19.0),
            NonDetection::new("AID1", 1, 10.0, 18.5),
            NonDetection::new("AID1", 2, 10.0, 19.0),
            NonDetection::new("AID2", 1, 10.0, 19.0),
            NonDetection::new("AID1", 1, 11.0, 19.0),
        ];
        let batch = LightCurveBatch::new(vec![], non_detections).unwrap();

        assert_eq!(batch.non_detections().len(), 4);
        let kept = batch
            .non_detections()
            .iter()
            .find(|nd| nd.aid == "AID1" && nd.fid == 1 && nd.mjd == 10.0)
            .unwrap();
        assert_eq!(kept.diffmaglim, 18.5);
    }

    #[test]
    fn test_detections_are_not_deduplicated() {
        let det = Detection::new("a", "AID1", 1, 1.0, 15.0, 0.1);
        let batch = LightCurveBatch::new(vec![det.clone(), det], vec![]).unwrap();
        assert_eq!(batch.detections().len(), 2);
    }

    #[test]
    fn test_invalid_detections_fail_fast() {
        let det = Detection::new("a", "AID1", 1, f64::NAN, 15.0, 0.1);
        let err = LightCurveBatch::new(vec![det], vec![]).unwrap_err();
        assert_eq!(
            err,
            MagstatsError::InvalidDetection {
                candid: "a".into(),
                reason: "epoch is not a finite number".into()
            }
        );

        let det = Detection::new("b", "AID1", 1, 1.0, 15.0, -0.1);
        let err = LightCurveBatch::new(vec![det], vec![]).unwrap_err();
        assert!(matches!(err, MagstatsError::InvalidDetection { .. }));
    }

    #[test]
    fn test_coordinate_errors_must_be_positive() {
        let det = Detection::new("a", "AID1", 1, 1.0, 15.0, 0.1).with_position(10.0, 0.0, 5.0, 0.5);
        let err = LightCurveBatch::new(vec![det], vec![]).unwrap_err();
        assert_eq!(
            err,
            MagstatsError::InvalidDetection {
                candid: "a".into(),
                reason: "right ascension error must be finite and positive".into()
            }
        );

        for e_dec in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let det =
                Detection::new("b", "AID1", 1, 1.0, 15.0, 0.1).with_position(10.0, 0.5, 5.0, e_dec);
            let err = LightCurveBatch::new(vec![det], vec![]).unwrap_err();
            assert_eq!(
                err,
                MagstatsError::InvalidDetection {
                    candid: "b".into(),
                    reason: "declination error must be finite and positive".into()
                }
            );
        }
    }

    #[test]
    fn test_nan_corrected_magnitude_is_missing() {
        let dets = vec![
            Detection::new("a", "AID1", 1, 1.0, 15.0, 0.1).with_corrected(f64::NAN),
            Detection::new("b", "AID1", 1, 2.0, 15.0, 0.1).with_corrected(10.0),
        ];
        let batch = LightCurveBatch::new(dets, vec![]).unwrap();
        assert_eq!(batch.detections()[0].mag_corr, None);
        assert!(batch.detections()[0].corrected);
        assert_eq!(batch.detections()[1].mag_corr, Some(10.0));
    }

    #[test]
    fn test_extend_deduplicates_across_batches() {
        let first = LightCurveBatch::new(
            vec![Detection::new("a", "AID1", 1, 1.0, 15.0, 0.1)],
            vec![NonDetection::new("AID1", 1, 0.0, 19.0)],
        )
        .unwrap();
        let second = LightCurveBatch::new(
            vec![Detection::new("b", "AID1", 1, 2.0, 15.0, 0.1)],
            vec![NonDetection::new("AID1", 1, 0.0, 19.0)],
        )
        .unwrap();

        let merged = first.extend(second).unwrap();
        assert_eq!(merged.detections().len(), 2);
        assert_eq!(merged.non_detections().len(), 1);
    }

    #[test]
    fn test_epoch_ordering_breaks_ties_by_candid() {
        let a = Detection::new("a", "AID1", 1, 1.0, 15.0, 0.1);
        let b = Detection::new("b", "AID1", 1, 1.0, 15.0, 0.1);
        let c = Detection::new("c", "AID1", 1, 0.5, 15.0, 0.1);
        assert_eq!(a.cmp_epoch(&b), Ordering::Less);
        assert_eq!(b.cmp_epoch(&c), Ordering::Greater);
    }
}
