//! # Output records
//!
//! Plain values produced by the magstats engine:
//!
//! * [`FilterStats`] – one record per `(aid, fid)`,
//! * [`ObjectStats`] – one record per `aid`,
//! * [`ObjectSummary`] – an [`ObjectStats`] bundled with all of its [`FilterStats`].
//!
//! Every statistic is an `Option`: `None` is the "no value" sentinel of a column that could
//! not be computed for a key (the calculator was excluded, or the key has no qualifying row).
//! Numerically undefined results are `Some(NaN)`, e.g. a saturation rate of `0 / 0`.
//! Serialized to JSON, both become `null`. The dmdt block is the only one that is
//! omitted altogether when absent.
//!
//! Records are assembled by outer-joining per-calculator columns with [`merge_column`].
use std::collections::BTreeMap;

use serde::Serialize;

use crate::constants::{ArcSec, Degree, FastHashMap, FilterId, Magnitude, ObjectId, MJD};

/// Rise-rate features computed against the selected prior non-detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DmdtFeatures {
    /// first detection epoch - non-detection epoch (days)
    pub dt_first: f64,
    /// first magnitude - diffmaglim
    pub dm_first: Magnitude,
    /// first magnitude error - diffmaglim
    pub sigmadm_first: Magnitude,
    /// (first magnitude + error - diffmaglim) / dt
    pub dmdt_first: f64,
}

/// Magnitude statistics of one `(aid, fid)` pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterStats {
    pub aid: ObjectId,
    pub fid: FilterId,

    pub magmean: Option<Magnitude>,
    pub magmedian: Option<Magnitude>,
    pub magmax: Option<Magnitude>,
    pub magmin: Option<Magnitude>,
    pub magsigma: Option<Magnitude>,
    pub magfirst: Option<Magnitude>,
    pub maglast: Option<Magnitude>,

    pub magmean_corr: Option<Magnitude>,
    pub magmedian_corr: Option<Magnitude>,
    pub magmax_corr: Option<Magnitude>,
    pub magmin_corr: Option<Magnitude>,
    pub magsigma_corr: Option<Magnitude>,
    pub magfirst_corr: Option<Magnitude>,
    pub maglast_corr: Option<Magnitude>,

    pub firstmjd: Option<MJD>,
    pub lastmjd: Option<MJD>,
    pub corrected: Option<bool>,
    pub stellar: Option<bool>,
    pub ndet: Option<usize>,
    pub ndubious: Option<usize>,
    pub saturation_rate: Option<f64>,

    #[serde(flatten)]
    pub dmdt: Option<DmdtFeatures>,
}

impl FilterStats {
    /// An empty record for `key`, every column set to "no value".
    pub fn empty(key: &(ObjectId, FilterId)) -> Self {
        FilterStats {
            aid: key.0.clone(),
            fid: key.1,
            magmean: None,
            magmedian: None,
            magmax: None,
            magmin: None,
            magsigma: None,
            magfirst: None,
            maglast: None,
            magmean_corr: None,
            magmedian_corr: None,
            magmax_corr: None,
            magmin_corr: None,
            magsigma_corr: None,
            magfirst_corr: None,
            maglast_corr: None,
            firstmjd: None,
            lastmjd: None,
            corrected: None,
            stellar: None,
            ndet: None,
            ndubious: None,
            saturation_rate: None,
            dmdt: None,
        }
    }
}

/// Position and light-curve summary of one object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectStats {
    pub aid: ObjectId,
    /// Sorted distinct survey object identifiers of the detections
    pub oid: Vec<String>,
    /// Sorted distinct telescope identifiers of the detections
    pub tid: Vec<String>,

    pub meanra: Option<Degree>,
    pub sigmara: Option<ArcSec>,
    pub meandec: Option<Degree>,
    pub sigmadec: Option<ArcSec>,

    pub firstmjd: Option<MJD>,
    pub lastmjd: Option<MJD>,
    pub ndet: Option<usize>,
    pub corrected: Option<bool>,
    pub stellar: Option<bool>,
}

impl ObjectStats {
    pub fn empty(aid: &ObjectId) -> Self {
        ObjectStats {
            aid: aid.clone(),
            oid: Vec::new(),
            tid: Vec::new(),
            meanra: None,
            sigmara: None,
            meandec: None,
            sigmadec: None,
            firstmjd: None,
            lastmjd: None,
            ndet: None,
            corrected: None,
            stellar: None,
        }
    }
}

/// An object record with its per-filter statistics nested inside.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectSummary {
    #[serde(flatten)]
    pub object: ObjectStats,
    pub magstats: Vec<FilterStats>,
}

/// Outer-join one calculator column into `records`.
///
/// Keys of `column` missing from `records` get a fresh record from `empty`; existing
/// records only have the fields written by `set` updated. The order in which columns are
/// merged does not change the result.
pub fn merge_column<K, R, T>(
    records: &mut BTreeMap<K, R>,
    column: FastHashMap<K, T>,
    empty: impl Fn(&K) -> R,
    set: impl Fn(&mut R, T),
) where
    K: Ord + std::hash::Hash,
{
    for (key, value) in column {
        let record = records.entry(key).or_insert_with_key(|k| empty(k));
        set(record, value);
    }
}
