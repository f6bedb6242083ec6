//! # Per-object statistics
//!
//! [`ObjectStatistics`] computes one [`ObjectStats`] record per `aid`: the inverse-variance
//! weighted position, the first/last epoch, the detection count, the quality flags of the
//! first detection and the survey identifiers seen for the object.
//!
//! ## Coordinates
//! -----------------
//! Detection errors `e_ra`, `e_dec` are given in **arcseconds**. They are converted to
//! degrees before weighting, the mean is reported in degrees and its uncertainty converted
//! back to arcseconds. Both axes are independent: no covariance is carried.
use std::collections::BTreeMap;

use itertools::Itertools;
use log::debug;

use crate::{
    constants::{ArcSec, Degree, FastHashMap, ObjectId, MJD},
    conversion::{arcsec_to_deg, deg_to_arcsec, weighted_mean, weighted_mean_error},
    detections::{Detection, LightCurveBatch},
    grouping::{FirstLast, GroupCache, Subset, Which},
    params::{Calculator, MagstatsParams},
    records::{merge_column, ObjectStats},
};

/// Celestial axis of a coordinate statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Ra,
    Dec,
}

impl Axis {
    fn value_and_error(self, det: &Detection) -> (Degree, ArcSec) {
        match self {
            Axis::Ra => (det.ra, det.e_ra),
            Axis::Dec => (det.dec, det.e_dec),
        }
    }
}

/// Weighted mean position along one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    /// Degrees
    pub mean: Degree,
    /// Arcseconds
    pub sigma: ArcSec,
}

/// Sorted distinct survey identifiers of one object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SurveyIds {
    pub oid: Vec<String>,
    pub tid: Vec<String>,
}

/// Per-`aid` statistics calculator over one batch.
pub struct ObjectStatistics<'a> {
    cache: GroupCache<'a, ObjectId>,
    params: &'a MagstatsParams,
}

impl<'a> ObjectStatistics<'a> {
    pub fn new(batch: &'a LightCurveBatch, params: &'a MagstatsParams) -> Self {
        ObjectStatistics {
            cache: GroupCache::new(batch.detections()),
            params,
        }
    }

    /// Inverse-variance weighted mean of one coordinate, per object.
    ///
    /// Arguments
    /// -----------------
    /// * `axis` – [`Axis::Ra`] or [`Axis::Dec`].
    ///
    /// Return
    /// ----------
    /// * `aid → Coordinate` with the mean in degrees and its uncertainty in arcseconds.
    pub fn coordinate_stats(&self, axis: Axis) -> FastHashMap<ObjectId, Coordinate> {
        let rows = self.cache.rows();
        self.cache.groups(Subset::All).aggregate(|idx| {
            let (values, sigmas): (Vec<Degree>, Vec<Degree>) = idx
                .iter()
                .map(|&i| {
                    let (value, error) = axis.value_and_error(&rows[i]);
                    (value, arcsec_to_deg(error))
                })
                .unzip();
            Coordinate {
                mean: weighted_mean(&values, &sigmas),
                sigma: deg_to_arcsec(weighted_mean_error(&sigmas)),
            }
        })
    }

    pub fn first_last_epoch(&self) -> FastHashMap<ObjectId, FirstLast<MJD>> {
        self.cache.first_last(Subset::All, |d| d.mjd)
    }

    pub fn detection_count(&self) -> FastHashMap<ObjectId, usize> {
        self.cache.groups(Subset::All).aggregate(|idx| idx.len())
    }

    /// `corrected` flag of the first detection of every object.
    pub fn corrected_flag(&self) -> FastHashMap<ObjectId, bool> {
        self.cache.value_at(Which::First, Subset::All, |d| d.corrected)
    }

    /// `stellar` flag of the first detection of every object.
    pub fn stellar_flag(&self) -> FastHashMap<ObjectId, bool> {
        self.cache.value_at(Which::First, Subset::All, |d| d.stellar)
    }

    pub fn survey_ids(&self) -> FastHashMap<ObjectId, SurveyIds> {
        let rows = self.cache.rows();
        self.cache.groups(Subset::All).aggregate(|idx| {
            let dets = || idx.iter().map(|&i| &rows[i]);
            SurveyIds {
                oid: dets().filter_map(|d| d.oid.clone()).sorted().dedup().collect(),
                tid: dets().filter_map(|d| d.tid.clone()).sorted().dedup().collect(),
            }
        })
    }

    /// Outer-join every enabled calculator into one record per `aid`, sorted by `aid`.
    pub fn assemble(&self) -> Vec<ObjectStats> {
        let params = self.params;
        let mut records: BTreeMap<ObjectId, ObjectStats> = BTreeMap::new();
        let empty = ObjectStats::empty;

        merge_column(&mut records, self.survey_ids(), empty, |r, ids| {
            r.oid = ids.oid;
            r.tid = ids.tid;
        });
        if params.is_enabled(Calculator::Ra) {
            merge_column(&mut records, self.coordinate_stats(Axis::Ra), empty, |r, c| {
                r.meanra = Some(c.mean);
                r.sigmara = Some(c.sigma);
            });
        }
        if params.is_enabled(Calculator::Dec) {
            merge_column(&mut records, self.coordinate_stats(Axis::Dec), empty, |r, c| {
                r.meandec = Some(c.mean);
                r.sigmadec = Some(c.sigma);
            });
        }
        if params.is_enabled(Calculator::Mjd) {
            merge_column(&mut records, self.first_last_epoch(), empty, |r, fl| {
                r.firstmjd = Some(fl.first);
                r.lastmjd = Some(fl.last);
            });
        }
        if params.is_enabled(Calculator::Ndet) {
            merge_column(&mut records, self.detection_count(), empty, |r, v| {
                r.ndet = Some(v)
            });
        }
        if params.is_enabled(Calculator::Corrected) {
            merge_column(&mut records, self.corrected_flag(), empty, |r, v| {
                r.corrected = Some(v)
            });
        }
        if params.is_enabled(Calculator::Stellar) {
            merge_column(&mut records, self.stellar_flag(), empty, |r, v| {
                r.stellar = Some(v)
            });
        }

        debug!("Assembled {} object records", records.len());
        records.into_values().collect()
    }
}
